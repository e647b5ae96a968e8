// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{collections::BTreeMap, fmt};

/// The status a runner reports when a node finishes executing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ExecutionStatus {
    /// The node executed successfully.
    Successful,

    /// Execution was started but aborted, for example by a failed assumption.
    Aborted,

    /// The node failed.
    Failed,

    /// A status this version of the model does not know about.
    ///
    /// Produced when deserializing output from a newer runner.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Successful => "SUCCESSFUL",
            Self::Aborted => "ABORTED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// The cause of a failed or aborted execution.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FailureCause {
    /// The kind of error, typically the fully qualified exception type.
    pub kind: SmolStr,

    /// The error message.
    #[serde(default)]
    pub message: String,
}

impl FailureCause {
    /// Creates a new failure cause.
    pub fn new(kind: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Returns true if this cause is an assertion failure rather than an
    /// unexpected error.
    pub fn is_assertion_failure(&self) -> bool {
        let simple_name = self.kind.rsplit(['.', '$']).next().unwrap_or(&self.kind);
        simple_name.starts_with("Assertion") || simple_name == "ComparisonFailure"
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

/// The result of executing a node, as reported by the runner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestExecutionResult {
    /// The status of the execution.
    pub status: ExecutionStatus,

    /// The error that caused a failure or abort, if any.
    #[serde(default)]
    pub throwable: Option<FailureCause>,
}

impl TestExecutionResult {
    /// A successful execution.
    pub fn successful() -> Self {
        Self {
            status: ExecutionStatus::Successful,
            throwable: None,
        }
    }

    /// An aborted execution, optionally with its cause.
    pub fn aborted(throwable: Option<FailureCause>) -> Self {
        Self {
            status: ExecutionStatus::Aborted,
            throwable,
        }
    }

    /// A failed execution, optionally with its cause.
    pub fn failed(throwable: Option<FailureCause>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            throwable,
        }
    }
}

/// A key-value entry published by a test while it runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportEntry {
    /// The time at which the entry was published, as an RFC 3339 string.
    #[serde(default)]
    pub timestamp: Option<String>,

    /// The published key-value pairs.
    #[serde(default)]
    pub key_values: BTreeMap<String, String>,
}
