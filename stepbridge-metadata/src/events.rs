// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ReportEntry, TestExecutionResult, UniqueId};
use serde::{Deserialize, Serialize};

/// A lifecycle notification emitted by a runner, referring to nodes of a
/// [`TestPlan`](crate::TestPlan) by unique ID.
///
/// A runner in another process can stream these as JSON lines; see
/// [`RunnerEvent::parse_lines`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RunnerEvent {
    /// Execution of the plan started.
    PlanStarted,

    /// Execution of the plan finished.
    PlanFinished,

    /// A test was registered dynamically during execution.
    #[serde(rename_all = "kebab-case")]
    DynamicTestRegistered {
        /// The node that was registered.
        unique_id: UniqueId,
    },

    /// A node was skipped without being started.
    #[serde(rename_all = "kebab-case")]
    ExecutionSkipped {
        /// The skipped node.
        unique_id: UniqueId,

        /// Why the node was skipped.
        #[serde(default)]
        reason: String,
    },

    /// A node started executing.
    #[serde(rename_all = "kebab-case")]
    ExecutionStarted {
        /// The node that started.
        unique_id: UniqueId,
    },

    /// A node finished executing.
    #[serde(rename_all = "kebab-case")]
    ExecutionFinished {
        /// The node that finished.
        unique_id: UniqueId,

        /// The outcome of the execution.
        result: TestExecutionResult,
    },

    /// A node published a report entry.
    #[serde(rename_all = "kebab-case")]
    ReportingEntryPublished {
        /// The node that published the entry.
        unique_id: UniqueId,

        /// The entry.
        entry: ReportEntry,
    },
}

impl RunnerEvent {
    /// Parses newline-delimited JSON events. Blank lines are ignored.
    pub fn parse_lines(input: &str) -> Result<Vec<Self>, serde_json::Error> {
        input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Self>)
            .collect()
    }

    /// Returns the node this event refers to, if any.
    pub fn unique_id(&self) -> Option<&UniqueId> {
        match self {
            Self::PlanStarted | Self::PlanFinished => None,
            Self::DynamicTestRegistered { unique_id }
            | Self::ExecutionSkipped { unique_id, .. }
            | Self::ExecutionStarted { unique_id }
            | Self::ExecutionFinished { unique_id, .. }
            | Self::ReportingEntryPublished { unique_id, .. } => Some(unique_id),
        }
    }
}
