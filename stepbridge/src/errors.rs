// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by stepbridge.

use camino::Utf8PathBuf;
use config::ConfigError;
use smol_str::SmolStr;
use stepbridge_metadata::{ExecutionStatus, UniqueId};
use std::fmt;
use thiserror::Error;

/// An error that occurred while loading the stepbridge configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self { config_file, kind }
    }

    /// Returns the user config file being read, if any.
    pub fn config_file(&self) -> Option<&camino::Utf8Path> {
        self.config_file.as_deref()
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config_file {
            Some(config_file) => write!(f, "failed to parse stepbridge config at `{config_file}`"),
            None => write!(f, "failed to parse stepbridge config"),
        }
    }
}

/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the layered config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// A class or method referenced by the runner could not be found among the
/// declarations of the test plan.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum LookupError {
    /// No class with this name was declared.
    #[error("class `{class_name}` not found in test plan declarations")]
    ClassNotFound {
        /// The class that was looked up.
        class_name: SmolStr,
    },

    /// The class exists but declares no matching method.
    #[error("method `{class_name}.{method_name}({parameter_types})` not found")]
    MethodNotFound {
        /// The class that was searched.
        class_name: SmolStr,

        /// The method that was looked up.
        method_name: SmolStr,

        /// The parameter types that were requested, comma-separated.
        parameter_types: String,
    },
}

/// A data table row does not have one value per header.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("data table row {row} has {actual} values, but the table has {expected} headers")]
pub struct DataTableShapeError {
    row: usize,
    expected: usize,
    actual: usize,
}

impl DataTableShapeError {
    pub(crate) fn new(row: usize, expected: usize, actual: usize) -> Self {
        Self {
            row,
            expected,
            actual,
        }
    }
}

/// An error that occurred while probing a test method for a custom display name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("failed to resolve display name for `{signature}`: {message}")]
pub struct DisplayNameError {
    signature: String,
    message: String,
}

impl DisplayNameError {
    /// Creates a new error for the method with the given signature.
    pub fn new(signature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            message: message.into(),
        }
    }
}

/// The runner reported an execution status that this listener does not
/// understand.
///
/// This indicates the runner broke its contract with the listener, so it is
/// passed back to the runner rather than logged.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unsupported execution status `{status}` for `{unique_id}`")]
pub struct UnsupportedStatusError {
    unique_id: UniqueId,
    status: ExecutionStatus,
}

impl UnsupportedStatusError {
    pub(crate) fn new(unique_id: UniqueId, status: ExecutionStatus) -> Self {
        Self { unique_id, status }
    }

    /// The node whose status was not understood.
    pub fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    /// The status that was reported.
    pub fn status(&self) -> ExecutionStatus {
        self.status
    }
}

/// An error that occurred while generating reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// The output directory could not be created.
    #[error("error creating report output directory `{dir}`")]
    CreateOutputDir {
        /// The directory that could not be created.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A reporter failed.
    #[error("reporter `{reporter}` failed")]
    Reporter {
        /// The name of the reporter.
        reporter: String,

        /// The underlying error.
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// An error returned to the runner from
/// [`TestExecutionListener::execution_finished`](crate::listener::TestExecutionListener::execution_finished).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ListenerError {
    /// The runner reported an unsupported status.
    #[error(transparent)]
    UnsupportedStatus(#[from] UnsupportedStatusError),

    /// Report generation at the end of a test class failed.
    #[error("error generating reports")]
    Report(#[from] ReportError),
}

/// An error that occurred while replaying runner events into a listener.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReplayError {
    /// An event referred to a node that is not part of the plan.
    #[error("event refers to unknown test identifier `{unique_id}`")]
    UnknownIdentifier {
        /// The unique ID that could not be found.
        unique_id: UniqueId,
    },

    /// The listener returned an error.
    #[error("listener failed while replaying events")]
    Listener(#[from] ListenerError),
}
