// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{data_table::DataTable, outcome::TestResult};
use indexmap::IndexMap;
use itertools::Itertools;
use smol_str::SmolStr;
use std::fmt;
use stepbridge_metadata::FailureCause;

/// A call made on a [`StepEventBus`](super::StepEventBus), as recorded by
/// [`RecordingEventBus`](super::RecordingEventBus).
///
/// Queries are not recorded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BusEvent {
    /// Per-test state was reset.
    Clear,

    /// Accumulated outcomes were forgotten.
    ClearTestOutcomes,

    /// The test source kind was set.
    SetTestSource(SmolStr),

    /// A test class started.
    TestSuiteStarted {
        /// The name of the class.
        class_name: SmolStr,
    },

    /// The current test class finished.
    TestSuiteFinished,

    /// A test started.
    TestStarted {
        /// The name the test is reported under.
        name: String,

        /// The class that declares the test.
        class_name: SmolStr,
    },

    /// The current test finished.
    TestFinished,

    /// The current test was ignored.
    TestIgnored,

    /// The current test is pending.
    TestPending,

    /// The current test is a manual test.
    TestIsManual,

    /// A test failed.
    TestFailed(FailureCause),

    /// An exception kind was declared as expected.
    ExceptionExpected(SmolStr),

    /// The current test runs against a data table.
    UseExamplesFrom(DataTable),

    /// An example row started.
    ExampleStarted(IndexMap<String, String>),

    /// The current example row finished.
    ExampleFinished,

    /// The verdict of the current test was forced.
    OverrideResultTo(TestResult),

    /// A failure cause was attached to the current test.
    UpdateCurrentStepFailureCause(FailureCause),

    /// The verdict of a manual test was fixed.
    RecordManualTestResult(TestResult),
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::ClearTestOutcomes => write!(f, "clearTestOutcomes"),
            Self::SetTestSource(source) => write!(f, "setTestSource({source})"),
            Self::TestSuiteStarted { class_name } => write!(f, "testSuiteStarted({class_name})"),
            Self::TestSuiteFinished => write!(f, "testSuiteFinished"),
            Self::TestStarted { name, class_name } => {
                write!(f, "testStarted({name}, {class_name})")
            }
            Self::TestFinished => write!(f, "testFinished"),
            Self::TestIgnored => write!(f, "testIgnored"),
            Self::TestPending => write!(f, "testPending"),
            Self::TestIsManual => write!(f, "testIsManual"),
            Self::TestFailed(cause) => write!(f, "testFailed({})", cause.kind),
            Self::ExceptionExpected(kind) => write!(f, "exceptionExpected({kind})"),
            Self::UseExamplesFrom(table) => write!(
                f,
                "useExamplesFrom({}; {} rows)",
                table.headers().iter().join(", "),
                table.row_count()
            ),
            Self::ExampleStarted(row) => write!(
                f,
                "exampleStarted({})",
                row.iter().map(|(k, v)| format!("{k}={v}")).join(", ")
            ),
            Self::ExampleFinished => write!(f, "exampleFinished"),
            Self::OverrideResultTo(result) => write!(f, "overrideResultTo({result})"),
            Self::UpdateCurrentStepFailureCause(cause) => {
                write!(f, "updateCurrentStepFailureCause({})", cause.kind)
            }
            Self::RecordManualTestResult(result) => write!(f, "recordManualTestResult({result})"),
        }
    }
}
