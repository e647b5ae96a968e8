// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::TestExecutionListener;
use crate::errors::ReplayError;
use stepbridge_metadata::{RunnerEvent, TestIdentifier, TestPlan, UniqueId};

/// Feeds recorded runner events through a listener.
///
/// Events refer to nodes of `plan` by unique ID. Replay stops at the first
/// event that refers to an unknown node, or whose callback fails.
pub fn replay<L>(
    listener: &mut L,
    plan: &TestPlan,
    events: impl IntoIterator<Item = RunnerEvent>,
) -> Result<(), ReplayError>
where
    L: TestExecutionListener + ?Sized,
{
    for event in events {
        match event {
            RunnerEvent::PlanStarted => listener.test_plan_execution_started(plan),
            RunnerEvent::PlanFinished => listener.test_plan_execution_finished(plan),
            RunnerEvent::DynamicTestRegistered { unique_id } => {
                listener.dynamic_test_registered(lookup(plan, &unique_id)?)
            }
            RunnerEvent::ExecutionSkipped { unique_id, reason } => {
                listener.execution_skipped(lookup(plan, &unique_id)?, &reason)
            }
            RunnerEvent::ExecutionStarted { unique_id } => {
                listener.execution_started(lookup(plan, &unique_id)?)
            }
            RunnerEvent::ExecutionFinished { unique_id, result } => {
                listener.execution_finished(lookup(plan, &unique_id)?, &result)?
            }
            RunnerEvent::ReportingEntryPublished { unique_id, entry } => {
                listener.reporting_entry_published(lookup(plan, &unique_id)?, &entry)
            }
        }
    }
    Ok(())
}

fn lookup<'a>(plan: &'a TestPlan, unique_id: &UniqueId) -> Result<&'a TestIdentifier, ReplayError> {
    plan.identifier(unique_id)
        .ok_or_else(|| ReplayError::UnknownIdentifier {
            unique_id: unique_id.clone(),
        })
}
