// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    data_table::DataTable,
    outcome::{TestOutcome, TestResult},
};
use indexmap::IndexMap;
use stepbridge_metadata::FailureCause;

/// The ordered sink of suite, test and example events, and the source of the
/// current test outcome.
///
/// Calls arrive in the order the listener makes them. Implementations decide
/// how outcome severity evolves in response to failures; the listener only
/// supplies causes and overrides.
pub trait StepEventBus {
    /// Resets per-test state before a new test starts.
    fn clear(&mut self);

    /// Forgets the outcomes accumulated for the previous test class.
    fn clear_test_outcomes(&mut self);

    /// Sets the kind of test source subsequent tests are recorded under.
    fn set_test_source(&mut self, source: &str);

    /// A test class started.
    ///
    /// Suites are flat, not nested: starting a suite replaces the one that is
    /// open. When a nested class finishes, the enclosing class's suite is
    /// started again if it runs more tests, so a class can see more
    /// `test_suite_started` calls than `test_suite_finished` calls.
    fn test_suite_started(&mut self, class_name: &str);

    /// The open suite finished. Only the most recently started suite is
    /// closed.
    fn test_suite_finished(&mut self);

    /// A test started.
    fn test_started(&mut self, name: &str, class_name: &str);

    /// The current test finished.
    fn test_finished(&mut self);

    /// The current test is ignored.
    fn test_ignored(&mut self);

    /// The current test is pending.
    fn test_pending(&mut self);

    /// The current test is a manual test.
    fn test_is_manual(&mut self);

    /// A test failed with the given cause.
    fn test_failed(&mut self, cause: &FailureCause);

    /// The current test declared an exception kind as expected.
    fn exception_expected(&mut self, kind: &str);

    /// The current test runs against the rows of a data table.
    fn use_examples_from(&mut self, table: &DataTable);

    /// An example row started.
    fn example_started(&mut self, row: &IndexMap<String, String>);

    /// The current example row finished.
    fn example_finished(&mut self);

    /// Returns the verdict of the current test, if a test has been started.
    fn current_test_outcome(&self) -> Option<TestResult>;

    /// Forces the verdict of the current test.
    fn override_result_to(&mut self, result: TestResult);

    /// Attaches a failure cause to the current test.
    fn update_current_step_failure_cause(&mut self, cause: &FailureCause);

    /// Fixes the verdict of a manual test.
    fn record_manual_test_result(&mut self, result: TestResult);

    /// Returns the outcomes accumulated since outcomes were last cleared.
    fn test_outcomes(&self) -> Vec<TestOutcome>;
}
