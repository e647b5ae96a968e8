// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    TestExecutionListener,
    state::{ExitedContainer, RunState},
};
use crate::{
    annotations::{AnnotationsOracle, CachedAnnotations},
    bus::StepEventBus,
    config::BridgeConfig,
    data_table::DataTableRegistry,
    declarations::DeclarationIndex,
    dialect::DialectDetector,
    errors::{ListenerError, ReportError},
    expected::{ExpectedExceptionHook, ExpectedExceptions},
    outcome::{TestOutcome, TestResult, aggregate_by_test_method},
    report::ReportSink,
    summary::ExecutionSummary,
};
use smol_str::SmolStr;
use std::sync::Arc;
use stepbridge_metadata::{
    ClassSource, ExecutionStatus, MethodSource, ReportEntry, TestExecutionResult, TestIdentifier,
    TestPlan, TestSource,
};
use tracing::{debug, error, trace, warn};

/// Translates runner lifecycle callbacks into calls on a [`StepEventBus`].
///
/// Only tests whose class belongs to the reporting dialect are translated; the
/// execution summary covers every node in the plan. When a dialect test class
/// finishes, its outcomes are handed to the report sink.
///
/// A listener handles one plan at a time, and one test class at a time within
/// it: classes must not run concurrently.
#[derive(Debug)]
pub struct StepBridgeListener<B, O, R> {
    test_source: SmolStr,
    default_test_name: String,
    bus: B,
    annotations: CachedAnnotations<O>,
    reports: R,
    detector: DialectDetector,
    declarations: DeclarationIndex,
    data_tables: DataTableRegistry,
    expected: ExpectedExceptions,
    summary: Arc<ExecutionSummary>,
    state: RunState,
}

impl<B, O, R> StepBridgeListener<B, O, R>
where
    B: StepEventBus,
    O: AnnotationsOracle,
    R: ReportSink,
{
    /// Creates a new listener.
    pub fn new(config: &BridgeConfig, bus: B, annotations: O, reports: R) -> Self {
        Self {
            test_source: config.test_source().into(),
            default_test_name: config.default_test_name().to_owned(),
            bus,
            annotations: CachedAnnotations::new(annotations),
            reports,
            detector: DialectDetector::new(config.dialect_extension()),
            declarations: DeclarationIndex::default(),
            data_tables: DataTableRegistry::new(),
            expected: ExpectedExceptions::new(),
            summary: Arc::new(ExecutionSummary::with_counts(0, 0)),
            state: RunState::default(),
        }
    }

    /// Returns the outcomes accumulated for the current test class.
    pub fn test_outcomes(&self) -> Vec<TestOutcome> {
        self.bus.test_outcomes()
    }

    /// Returns the summary of the current or most recent plan.
    pub fn summary(&self) -> Arc<ExecutionSummary> {
        Arc::clone(&self.summary)
    }

    /// Returns a handle through which instrumentation registers expected
    /// exceptions for the running test.
    pub fn expected_exception_hook(&self) -> ExpectedExceptionHook {
        self.expected.hook()
    }

    /// Returns the event bus.
    pub fn event_bus(&self) -> &B {
        &self.bus
    }

    /// Returns the report sink.
    pub fn report_sink(&self) -> &R {
        &self.reports
    }

    /// Returns the data tables loaded for the current plan.
    pub fn data_tables(&self) -> &DataTableRegistry {
        &self.data_tables
    }

    /// Returns the data table row the next example corresponds to.
    pub fn current_row_index(&self) -> usize {
        self.state.parameterized.row_index()
    }

    /// Consumes the listener, returning the event bus and the report sink.
    pub fn into_parts(self) -> (B, R) {
        (self.bus, self.reports)
    }

    fn is_dialect_class(&mut self, class_name: &str) -> bool {
        match self.declarations.class(class_name) {
            Ok(class) => self.detector.detect(class, &self.declarations),
            Err(err) => {
                debug!("treating as outside the dialect: {err}");
                false
            }
        }
    }

    fn is_dialect_node(&mut self, identifier: &TestIdentifier) -> bool {
        match &identifier.source {
            Some(TestSource::Class(source)) => self.is_dialect_class(&source.class_name),
            Some(TestSource::Method(source)) => self.is_dialect_class(&source.class_name),
            None => self.state.is_dialect_match,
        }
    }

    fn class_container_started(&mut self, identifier: &TestIdentifier, source: &ClassSource) {
        let is_member = self.is_dialect_class(&source.class_name);
        let nested = self.state.in_dialect_container();
        self.state.enter_container(
            identifier.unique_id.clone(),
            source.class_name.clone(),
            is_member,
        );
        if !is_member {
            trace!("execution started outside the dialect: {}", source.class_name);
            return;
        }

        trace!("test suite started: {}", source.class_name);
        // Outcomes of an enclosing class are kept until that class reports.
        if !nested {
            self.bus.clear_test_outcomes();
        }
        self.bus.test_suite_started(&source.class_name);
    }

    fn method_container_started(&mut self, source: &MethodSource) {
        if self.data_tables.get(&source.method_key()).is_some() {
            trace!("data-driven container started: {}", source.method_key());
            self.state.parameterized.start_method_container();
        }
    }

    fn ensure_suite_started(&mut self, class_name: &SmolStr) {
        let same_class = self.state.current_test_class.as_ref() == Some(class_name);
        if self.state.suite_open && same_class {
            return;
        }
        trace!("test suite started before first test: {class_name}");
        self.bus.test_suite_started(class_name);
        self.state.current_test_class = Some(class_name.clone());
        self.state.is_dialect_match = true;
        self.state.suite_open = true;
    }

    fn test_started(&mut self, identifier: &TestIdentifier, source: &MethodSource) {
        self.ensure_suite_started(&source.class_name);
        debug!("test started: {}", identifier.unique_id);

        self.bus.clear();
        self.bus.set_test_source(&self.test_source);

        let method = match self.declarations.resolve_method(source) {
            Ok(method) => Some(method),
            Err(err) => {
                debug!("no declaration for started test: {err}");
                None
            }
        };
        let name = method
            .as_ref()
            .and_then(|method| self.annotations.display_name(method))
            .or_else(|| {
                (!source.method_name.is_empty()).then(|| source.method_name.to_string())
            })
            .unwrap_or_else(|| self.default_test_name.clone());
        self.bus.test_started(&name, &source.class_name);

        if method
            .as_ref()
            .is_some_and(|method| self.annotations.is_pending(method))
        {
            self.bus.test_pending();
        }

        let key = source.method_key();
        if let Some(table) = self.data_tables.get(&key) {
            if self.state.parameterized.activate(&key) {
                trace!("using examples from {key}");
                self.bus.use_examples_from(table);
            }
            let row_index = self.state.parameterized.row_index();
            match table.row(row_index) {
                Some(row) => {
                    trace!("example {row_index} started for {key}");
                    self.bus.example_started(row.as_map());
                }
                None => warn!(
                    "{key} has {} example rows, but row {row_index} was requested",
                    table.row_count()
                ),
            }
        }
    }

    fn test_finished(&mut self, source: &MethodSource, result: &TestExecutionResult) {
        let method = match self.declarations.resolve_method(source) {
            Ok(method) => Some(method),
            Err(err) => {
                debug!("no declaration for finished test: {err}");
                None
            }
        };
        if let Some(manual_result) = method
            .as_ref()
            .and_then(|method| self.annotations.manual_result(method))
        {
            self.bus.test_is_manual();
            self.bus.record_manual_test_result(manual_result);
        }
        for kind in self.expected.snapshot() {
            self.bus.exception_expected(&kind);
        }

        let current = self.bus.current_test_outcome();
        match result.status {
            ExecutionStatus::Aborted if current == Some(TestResult::Success) => {
                if let Some(cause) = &result.throwable {
                    self.bus.update_current_step_failure_cause(cause);
                }
                self.bus.override_result_to(TestResult::Aborted);
            }
            ExecutionStatus::Failed
                if current.is_some_and(|outcome| outcome.is_less_severe_than(TestResult::Failure)) =>
            {
                if let Some(cause) = &result.throwable {
                    self.bus.update_current_step_failure_cause(cause);
                }
            }
            _ => {}
        }

        self.bus.test_finished();
        self.bus.set_test_source(&self.test_source);

        let key = source.method_key();
        if self.data_tables.get(&key).is_some() {
            trace!(
                "example {} finished for {key}",
                self.state.parameterized.row_index()
            );
            self.bus.example_finished();
            self.state.parameterized.advance();
        }
    }

    fn class_container_finished(
        &mut self,
        identifier: &TestIdentifier,
        source: &ClassSource,
    ) -> Result<(), ReportError> {
        let exited = match self.state.exit_container(&identifier.unique_id) {
            Some(exited) => exited,
            None => {
                // The runner never reported this container as started.
                let exited = ExitedContainer {
                    is_dialect_match: self.state.suite_open
                        && self.state.current_test_class.as_ref() == Some(&source.class_name),
                    was_parameterized: self.state.parameterized.is_active(),
                };
                self.state.reset_current();
                exited
            }
        };
        let is_member = exited.is_dialect_match;
        if !is_member {
            return Ok(());
        }

        trace!("test suite finished: {}", source.class_name);
        self.bus.test_suite_finished();

        let outcomes: Vec<_> = self
            .bus
            .test_outcomes()
            .into_iter()
            .filter(|outcome| outcome.test_class == source.class_name)
            .collect();
        let outcomes = if exited.was_parameterized {
            aggregate_by_test_method(outcomes)
        } else {
            outcomes
        };

        debug!(
            "generating reports for {} ({} outcomes)",
            source.class_name,
            outcomes.len()
        );
        self.reports.generate_reports_for(&outcomes)?;
        self.reports.generate_configurations_report()
    }

    fn record_summary(
        &mut self,
        identifier: &TestIdentifier,
        result: &TestExecutionResult,
        is_dialect: bool,
    ) -> Result<(), ListenerError> {
        self.summary.record(identifier, result)?;
        if result.status == ExecutionStatus::Failed && is_dialect {
            if let Some(cause) = &result.throwable {
                self.bus.test_failed(cause);
            }
        }
        Ok(())
    }
}

impl<B, O, R> TestExecutionListener for StepBridgeListener<B, O, R>
where
    B: StepEventBus,
    O: AnnotationsOracle,
    R: ReportSink,
{
    fn test_plan_execution_started(&mut self, plan: &TestPlan) {
        self.summary = Arc::new(ExecutionSummary::new(plan));
        self.declarations = DeclarationIndex::new(plan);
        self.detector.reset();
        self.annotations.clear();
        self.data_tables.clear();
        self.expected.clear();
        self.state = RunState::default();

        for class in plan.classes() {
            if self.detector.detect(class, &self.declarations) {
                self.data_tables
                    .merge(self.annotations.data_tables_for(class));
            }
        }
        debug!(
            "test plan started: {} containers, {} tests, {} data tables",
            plan.container_count(),
            plan.test_count(),
            self.data_tables.len()
        );
    }

    fn test_plan_execution_finished(&mut self, _plan: &TestPlan) {
        let stats = self.summary.finish();
        for failure in self.summary.failures() {
            debug!("failed: {} ({})", failure.display_name, failure.cause);
        }
        if !stats.is_success() {
            debug!("test plan finished with failures");
        }
    }

    fn dynamic_test_registered(&mut self, identifier: &TestIdentifier) {
        trace!("dynamic test registered: {}", identifier.unique_id);
    }

    fn execution_skipped(&mut self, identifier: &TestIdentifier, reason: &str) {
        self.summary.record_skipped(identifier);

        let Some(source) = identifier.method_source() else {
            return;
        };
        if !self.is_dialect_class(&source.class_name) {
            return;
        }
        trace!("execution skipped: {} ({reason})", identifier.unique_id);

        let method = match self.declarations.resolve_method(source) {
            Ok(method) => method,
            Err(err) => {
                error!("error processing skipped test {}: {err}", identifier.unique_id);
                return;
            }
        };
        if !self.annotations.is_disabled(&method) {
            return;
        }

        let display_name = identifier
            .display_name
            .strip_suffix("()")
            .unwrap_or(&identifier.display_name);
        let name = if display_name.is_empty() {
            self.default_test_name.as_str()
        } else {
            display_name
        };
        self.bus.set_test_source(&self.test_source);
        self.bus.test_started(name, &source.class_name);
        self.bus.test_ignored();
        self.bus.test_finished();
    }

    fn execution_started(&mut self, identifier: &TestIdentifier) {
        match &identifier.source {
            None => trace!("no source for started node {}", identifier.unique_id),
            Some(TestSource::Class(source)) => {
                if identifier.is_container() {
                    self.class_container_started(identifier, source);
                }
            }
            Some(TestSource::Method(source)) => {
                if !self.is_dialect_class(&source.class_name) {
                    return;
                }
                if identifier.is_test() {
                    self.test_started(identifier, source);
                } else {
                    self.method_container_started(source);
                }
            }
        }
    }

    fn execution_finished(
        &mut self,
        identifier: &TestIdentifier,
        result: &TestExecutionResult,
    ) -> Result<(), ListenerError> {
        let _clear_expected = self.expected.clear_guard();
        let is_dialect = self.is_dialect_node(identifier);
        trace!(
            "execution finished: {} with status {}",
            identifier.unique_id, result.status
        );

        let report_result = match &identifier.source {
            Some(TestSource::Class(source)) if identifier.is_container() => {
                self.class_container_finished(identifier, source)
            }
            Some(TestSource::Method(source)) if identifier.is_test() && is_dialect => {
                self.test_finished(source, result);
                Ok(())
            }
            _ => Ok(()),
        };

        // The summary is recorded even if reports could not be written.
        self.record_summary(identifier, result, is_dialect)?;
        report_result?;
        Ok(())
    }

    fn reporting_entry_published(&mut self, identifier: &TestIdentifier, entry: &ReportEntry) {
        if self.is_dialect_node(identifier) {
            trace!(
                "reporting entry published for {}: {:?}",
                identifier.unique_id, entry.key_values
            );
        }
    }
}
