// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{BusEvent, StepEventBus};
use crate::{
    data_table::DataTable,
    outcome::{ExampleRow, ExampleTable, TestOutcome, TestResult},
};
use indexmap::IndexMap;
use smol_str::SmolStr;
use stepbridge_metadata::FailureCause;
use tracing::trace;

/// A [`StepEventBus`] that records every call and builds test outcomes in
/// memory.
///
/// Outcomes follow these rules:
///
/// * A started test is successful until told otherwise.
/// * A failure escalates the verdict to `FAILURE` for assertion failures and to
///   `ERROR` otherwise, unless the failure's kind was declared as expected or the
///   test is manual.
/// * The verdict of a manual test is fixed once recorded.
/// * Failures reported after a test finished apply to that test, until the next
///   test or suite starts.
#[derive(Clone, Debug, Default)]
pub struct RecordingEventBus {
    events: Vec<BusEvent>,
    outcomes: Vec<TestOutcome>,
    current: Option<usize>,
    last_finished: Option<usize>,
    test_source: Option<SmolStr>,
    suite: Option<SmolStr>,
}

impl RecordingEventBus {
    /// Creates an empty event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded call, in order.
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Returns the recorded calls rendered as strings, for easy comparison.
    pub fn event_names(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Forgets the recorded calls, keeping the outcomes.
    pub fn take_events(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns the class of the suite that is currently open, if any.
    pub fn current_suite(&self) -> Option<&str> {
        self.suite.as_deref()
    }

    fn record(&mut self, event: BusEvent) {
        trace!("event bus: {event}");
        self.events.push(event);
    }

    fn target_index(&self) -> Option<usize> {
        self.current.or(self.last_finished)
    }

    fn target(&self) -> Option<&TestOutcome> {
        self.target_index().and_then(|index| self.outcomes.get(index))
    }

    fn target_mut(&mut self) -> Option<&mut TestOutcome> {
        self.target_index()
            .and_then(|index| self.outcomes.get_mut(index))
    }
}

impl StepEventBus for RecordingEventBus {
    fn clear(&mut self) {
        self.record(BusEvent::Clear);
        self.current = None;
        self.last_finished = None;
    }

    fn clear_test_outcomes(&mut self) {
        self.record(BusEvent::ClearTestOutcomes);
        self.outcomes.clear();
        self.current = None;
        self.last_finished = None;
    }

    fn set_test_source(&mut self, source: &str) {
        self.record(BusEvent::SetTestSource(source.into()));
        self.test_source = Some(source.into());
    }

    fn test_suite_started(&mut self, class_name: &str) {
        self.record(BusEvent::TestSuiteStarted {
            class_name: class_name.into(),
        });
        self.suite = Some(class_name.into());
        self.last_finished = None;
    }

    fn test_suite_finished(&mut self) {
        self.record(BusEvent::TestSuiteFinished);
        self.suite = None;
        self.current = None;
        self.last_finished = None;
    }

    fn test_started(&mut self, name: &str, class_name: &str) {
        self.record(BusEvent::TestStarted {
            name: name.to_owned(),
            class_name: class_name.into(),
        });
        let mut outcome = TestOutcome::new(name, class_name);
        outcome.test_source = self.test_source.clone();
        self.outcomes.push(outcome);
        self.current = Some(self.outcomes.len() - 1);
        self.last_finished = None;
    }

    fn test_finished(&mut self) {
        self.record(BusEvent::TestFinished);
        if let Some(index) = self.current.take() {
            self.last_finished = Some(index);
        }
    }

    fn test_ignored(&mut self) {
        self.record(BusEvent::TestIgnored);
        if let Some(outcome) = self.target_mut() {
            outcome.result = TestResult::Ignored;
        }
    }

    fn test_pending(&mut self) {
        self.record(BusEvent::TestPending);
        if let Some(outcome) = self.target_mut() {
            outcome.result = TestResult::Pending;
        }
    }

    fn test_is_manual(&mut self) {
        self.record(BusEvent::TestIsManual);
        if let Some(outcome) = self.target_mut() {
            outcome.manual = true;
        }
    }

    fn test_failed(&mut self, cause: &FailureCause) {
        self.record(BusEvent::TestFailed(cause.clone()));
        let Some(outcome) = self.target_mut() else {
            return;
        };
        if outcome.manual || outcome.expected_exceptions.contains(&cause.kind) {
            return;
        }

        let result = if cause.is_assertion_failure() {
            TestResult::Failure
        } else {
            TestResult::Error
        };
        outcome.result = outcome.result.max(result);
        if outcome.failure_cause.is_none() {
            outcome.failure_cause = Some(cause.clone());
        }
        // The example row may already carry a verdict if it finished first.
        if let Some(row) = outcome
            .examples
            .as_mut()
            .and_then(|examples| examples.rows.last_mut())
        {
            if let Some(row_result) = &mut row.result {
                *row_result = (*row_result).max(result);
            }
        }
    }

    fn exception_expected(&mut self, kind: &str) {
        self.record(BusEvent::ExceptionExpected(kind.into()));
        if let Some(outcome) = self.target_mut() {
            if !outcome.expected_exceptions.iter().any(|k| k == kind) {
                outcome.expected_exceptions.push(kind.into());
            }
        }
    }

    fn use_examples_from(&mut self, table: &DataTable) {
        self.record(BusEvent::UseExamplesFrom(table.clone()));
        if let Some(outcome) = self.target_mut() {
            outcome
                .examples
                .get_or_insert_with(|| ExampleTable::for_data_table(table));
        }
    }

    fn example_started(&mut self, row: &IndexMap<String, String>) {
        self.record(BusEvent::ExampleStarted(row.clone()));
        if let Some(outcome) = self.target_mut() {
            let examples = outcome.examples.get_or_insert_with(|| ExampleTable {
                headers: row.keys().cloned().collect(),
                rows: Vec::new(),
            });
            examples.rows.push(ExampleRow {
                values: row.clone(),
                result: None,
            });
        }
    }

    fn example_finished(&mut self) {
        self.record(BusEvent::ExampleFinished);
        if let Some(outcome) = self.target_mut() {
            let result = outcome.result;
            if let Some(row) = outcome
                .examples
                .as_mut()
                .and_then(|examples| examples.rows.last_mut())
            {
                row.result = Some(result);
            }
        }
    }

    fn current_test_outcome(&self) -> Option<TestResult> {
        self.target().map(|outcome| outcome.result)
    }

    fn override_result_to(&mut self, result: TestResult) {
        self.record(BusEvent::OverrideResultTo(result));
        if let Some(outcome) = self.target_mut() {
            if !outcome.manual {
                outcome.result = result;
            }
        }
    }

    fn update_current_step_failure_cause(&mut self, cause: &FailureCause) {
        self.record(BusEvent::UpdateCurrentStepFailureCause(cause.clone()));
        if let Some(outcome) = self.target_mut() {
            if !outcome.expected_exceptions.contains(&cause.kind) {
                outcome.failure_cause = Some(cause.clone());
            }
        }
    }

    fn record_manual_test_result(&mut self, result: TestResult) {
        self.record(BusEvent::RecordManualTestResult(result));
        if let Some(outcome) = self.target_mut() {
            outcome.manual = true;
            outcome.result = result;
        }
    }

    fn test_outcomes(&self) -> Vec<TestOutcome> {
        self.outcomes.clone()
    }
}
