// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report generation, triggered whenever a test class completes.
//!
//! The listener hands outcomes to a [`ReportSink`]. [`ReportService`] is the
//! standard sink: it owns the output directory and fans outcomes out to a list
//! of [`AcceptanceTestReporter`]s.

use crate::{errors::ReportError, outcome::TestOutcome};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use std::{error::Error, fs};
use tracing::debug;

/// The error type reporters return.
pub type ReporterError = Box<dyn Error + Send + Sync>;

/// Receives test outcomes when a test class completes.
pub trait ReportSink {
    /// Generates reports for the outcomes of a test class.
    fn generate_reports_for(&mut self, outcomes: &[TestOutcome]) -> Result<(), ReportError>;

    /// Generates the report describing the run's configuration.
    fn generate_configurations_report(&mut self) -> Result<(), ReportError>;
}

/// Writes one kind of report into an output directory.
pub trait AcceptanceTestReporter {
    /// A short name for this reporter, used in error messages.
    fn name(&self) -> &str;

    /// Writes reports for the outcomes of a test class.
    fn generate_report_for(
        &mut self,
        output_dir: &Utf8Path,
        outcomes: &[TestOutcome],
    ) -> Result<(), ReporterError>;

    /// Writes the configuration report. Most reporters have none.
    fn generate_configurations_report(&mut self, output_dir: &Utf8Path) -> Result<(), ReporterError> {
        let _ = output_dir;
        Ok(())
    }
}

/// Fans test outcomes out to a list of reporters sharing an output directory.
#[derive(Debug)]
pub struct ReportService {
    output_dir: Utf8PathBuf,
    reporters: DebugIgnore<Vec<Box<dyn AcceptanceTestReporter>>>,
    output_dir_created: bool,
}

impl ReportService {
    /// Creates a new service writing to `output_dir`.
    ///
    /// The directory is created when the first report is generated.
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            reporters: DebugIgnore(Vec::new()),
            output_dir_created: false,
        }
    }

    /// Adds a reporter.
    pub fn with_reporter(mut self, reporter: impl AcceptanceTestReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Returns the number of reporters.
    pub fn reporter_count(&self) -> usize {
        self.reporters.len()
    }

    fn ensure_output_dir(&mut self) -> Result<(), ReportError> {
        if !self.output_dir_created {
            fs::create_dir_all(&self.output_dir).map_err(|error| ReportError::CreateOutputDir {
                dir: self.output_dir.clone(),
                error,
            })?;
            self.output_dir_created = true;
        }
        Ok(())
    }
}

impl ReportSink for ReportService {
    fn generate_reports_for(&mut self, outcomes: &[TestOutcome]) -> Result<(), ReportError> {
        self.ensure_output_dir()?;
        debug!(
            "generating reports for {} outcomes in {}",
            outcomes.len(),
            self.output_dir
        );
        for reporter in self.reporters.iter_mut() {
            reporter
                .generate_report_for(&self.output_dir, outcomes)
                .map_err(|error| ReportError::Reporter {
                    reporter: reporter.name().to_owned(),
                    error,
                })?;
        }
        Ok(())
    }

    fn generate_configurations_report(&mut self) -> Result<(), ReportError> {
        self.ensure_output_dir()?;
        for reporter in self.reporters.iter_mut() {
            reporter
                .generate_configurations_report(&self.output_dir)
                .map_err(|error| ReportError::Reporter {
                    reporter: reporter.name().to_owned(),
                    error,
                })?;
        }
        Ok(())
    }
}

/// Writes the outcomes of each test class as pretty-printed JSON, to
/// `<output-dir>/<test class>.json`.
#[derive(Clone, Debug, Default)]
pub struct JsonOutcomeReporter;

impl JsonOutcomeReporter {
    /// Returns the file name the outcomes of a class are written to.
    pub fn file_name(class_name: &str) -> String {
        let sanitized: String = class_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{sanitized}.json")
    }
}

impl AcceptanceTestReporter for JsonOutcomeReporter {
    fn name(&self) -> &str {
        "json"
    }

    fn generate_report_for(
        &mut self,
        output_dir: &Utf8Path,
        outcomes: &[TestOutcome],
    ) -> Result<(), ReporterError> {
        let Some(first) = outcomes.first() else {
            return Ok(());
        };
        let path = output_dir.join(Self::file_name(&first.test_class));
        let contents = serde_json::to_string_pretty(outcomes)?;
        fs::write(&path, contents)?;
        debug!("wrote {} outcomes to {path}", outcomes.len());
        Ok(())
    }
}

/// A [`ReportSink`] that keeps every batch of outcomes it is handed.
#[derive(Clone, Debug, Default)]
pub struct RecordingReportSink {
    batches: Vec<Vec<TestOutcome>>,
    configuration_reports: usize,
}

impl RecordingReportSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns each batch of outcomes, in the order they were received.
    pub fn batches(&self) -> &[Vec<TestOutcome>] {
        &self.batches
    }

    /// Returns the number of configuration reports requested.
    pub fn configuration_reports(&self) -> usize {
        self.configuration_reports
    }
}

impl ReportSink for RecordingReportSink {
    fn generate_reports_for(&mut self, outcomes: &[TestOutcome]) -> Result<(), ReportError> {
        self.batches.push(outcomes.to_vec());
        Ok(())
    }

    fn generate_configurations_report(&mut self) -> Result<(), ReportError> {
        self.configuration_reports += 1;
        Ok(())
    }
}
