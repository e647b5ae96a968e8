// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ListenerError;
use stepbridge_metadata::{ReportEntry, TestExecutionResult, TestIdentifier, TestPlan};

/// Receives lifecycle notifications from a test runner.
///
/// Callbacks are made from a single thread, in the order events happen. Every
/// method has a no-op default.
pub trait TestExecutionListener {
    /// Execution of the plan is about to start.
    fn test_plan_execution_started(&mut self, _plan: &TestPlan) {}

    /// Execution of the plan finished.
    fn test_plan_execution_finished(&mut self, _plan: &TestPlan) {}

    /// A test was registered while the plan executed.
    fn dynamic_test_registered(&mut self, _identifier: &TestIdentifier) {}

    /// A node was skipped without being started.
    fn execution_skipped(&mut self, _identifier: &TestIdentifier, _reason: &str) {}

    /// A node started executing.
    fn execution_started(&mut self, _identifier: &TestIdentifier) {}

    /// A node finished executing.
    ///
    /// Errors indicate that the runner broke its contract, or that reports
    /// could not be written. They are returned to the runner.
    fn execution_finished(
        &mut self,
        _identifier: &TestIdentifier,
        _result: &TestExecutionResult,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A node published a report entry.
    fn reporting_entry_published(&mut self, _identifier: &TestIdentifier, _entry: &ReportEntry) {}
}
