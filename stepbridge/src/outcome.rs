// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test outcomes as seen by the reporting engine, and aggregation of
//! parameterized outcomes.

use crate::data_table::DataTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use stepbridge_metadata::FailureCause;

// Note: the order here matters -- it indicates severity.
/// The verdict the reporting engine assigns to a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum TestResult {
    /// No verdict yet.
    Undefined,

    /// The test did not succeed, for an unspecified reason.
    Unsuccessful,

    /// The test was deliberately ignored.
    Ignored,

    /// The test was skipped.
    Skipped,

    /// The test is not yet implemented.
    Pending,

    /// The test passed.
    Success,

    /// The test was started but aborted.
    Aborted,

    /// An assertion in the test failed.
    Failure,

    /// The test raised an unexpected error.
    Error,

    /// The test could not be run because of a problem outside the system under test.
    Compromised,
}

impl TestResult {
    /// Returns true if this result is strictly less severe than `other`.
    pub fn is_less_severe_than(self, other: TestResult) -> bool {
        self < other
    }

    /// Returns true if this result is strictly more severe than `other`.
    pub fn is_more_severe_than(self, other: TestResult) -> bool {
        self > other
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undefined => "UNDEFINED",
            Self::Unsuccessful => "UNSUCCESSFUL",
            Self::Ignored => "IGNORED",
            Self::Skipped => "SKIPPED",
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Aborted => "ABORTED",
            Self::Failure => "FAILURE",
            Self::Error => "ERROR",
            Self::Compromised => "COMPROMISED",
        };
        f.write_str(s)
    }
}

/// One example row run by a data-driven test, with the verdict for that row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExampleRow {
    /// Parameter name to value.
    pub values: IndexMap<String, String>,

    /// The verdict for this row, once the example has finished.
    pub result: Option<TestResult>,
}

/// The examples a data-driven outcome was run against.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExampleTable {
    /// Column headers, in order.
    pub headers: Vec<String>,

    /// The rows that were run, in order.
    pub rows: Vec<ExampleRow>,
}

impl ExampleTable {
    /// Creates an empty example table with the headers of a data table.
    pub fn for_data_table(table: &DataTable) -> Self {
        Self {
            headers: table.headers().to_vec(),
            rows: Vec::new(),
        }
    }
}

/// The outcome of a single test, as recorded by an event bus.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestOutcome {
    /// The name the test was started with.
    pub name: String,

    /// The class that declares the test.
    pub test_class: SmolStr,

    /// The test source kind the outcome was recorded under.
    pub test_source: Option<SmolStr>,

    /// The verdict.
    pub result: TestResult,

    /// True if the verdict was fixed by configuration rather than computed.
    pub manual: bool,

    /// The first recorded failure cause.
    pub failure_cause: Option<FailureCause>,

    /// Exception kinds the test declared as expected.
    pub expected_exceptions: Vec<SmolStr>,

    /// Examples run by a data-driven test.
    pub examples: Option<ExampleTable>,
}

impl TestOutcome {
    /// Creates a new outcome for a test that has just started.
    ///
    /// Tests start out successful; events received while the test runs can
    /// only change that.
    pub fn new(name: impl Into<String>, test_class: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            test_class: test_class.into(),
            test_source: None,
            result: TestResult::Success,
            manual: false,
            failure_cause: None,
            expected_exceptions: Vec::new(),
            examples: None,
        }
    }

    /// Returns true if this outcome ran against example rows.
    pub fn is_data_driven(&self) -> bool {
        self.examples.as_ref().is_some_and(|e| !e.rows.is_empty())
    }
}

/// Merges the outcomes of a parameterized test so that there is one outcome per
/// test method.
///
/// Outcomes are grouped by class and test name, keeping the order in which each
/// group was first seen. Within a group, example rows are concatenated in order,
/// the most severe verdict wins, and the first failure cause is kept.
pub fn aggregate_by_test_method(outcomes: Vec<TestOutcome>) -> Vec<TestOutcome> {
    let mut groups: IndexMap<(SmolStr, String), TestOutcome> = IndexMap::new();

    for outcome in outcomes {
        let key = (outcome.test_class.clone(), outcome.name.clone());
        match groups.get_mut(&key) {
            Some(merged) => merge_into(merged, outcome),
            None => {
                groups.insert(key, outcome);
            }
        }
    }

    groups.into_values().collect()
}

fn merge_into(merged: &mut TestOutcome, outcome: TestOutcome) {
    merged.result = merged.result.max(outcome.result);
    merged.manual |= outcome.manual;
    if merged.failure_cause.is_none() {
        merged.failure_cause = outcome.failure_cause;
    }
    for kind in outcome.expected_exceptions {
        if !merged.expected_exceptions.contains(&kind) {
            merged.expected_exceptions.push(kind);
        }
    }
    if let Some(examples) = outcome.examples {
        match &mut merged.examples {
            Some(existing) => {
                if existing.headers.is_empty() {
                    existing.headers = examples.headers;
                }
                existing.rows.extend(examples.rows);
            }
            None => merged.examples = Some(examples),
        }
    }
}
