// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Once;
use stepbridge::{
    annotations::StaticAnnotations,
    bus::RecordingEventBus,
    config::BridgeConfig,
    listener::{StepBridgeListener, TestExecutionListener},
    report::RecordingReportSink,
};
use stepbridge_metadata::{
    ClassSource, MethodDecl, MethodSource, TestClass, TestExecutionResult, TestIdentifier,
    TestPlan, TestSource, UniqueId,
};

pub(crate) const EXTENSION: &str = "SerenityJUnit5Extension";
pub(crate) const ENGINE_ID: &str = "[engine:junit-jupiter]";

pub(crate) type TestListener =
    StepBridgeListener<RecordingEventBus, StaticAnnotations, RecordingReportSink>;

static INIT_LOGGER: Once = Once::new();

/// Routes log output through the test harness, so it shows up for failing tests.
pub(crate) fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

pub(crate) fn listener(annotations: StaticAnnotations) -> TestListener {
    init_logger();
    let config = BridgeConfig::default_config("/workspace").expect("default config is valid");
    StepBridgeListener::new(
        &config,
        RecordingEventBus::new(),
        annotations,
        RecordingReportSink::new(),
    )
}

pub(crate) fn class_id(class_name: &str) -> String {
    format!("{ENGINE_ID}/[class:{class_name}]")
}

pub(crate) fn method_id(class_name: &str, method_name: &str) -> String {
    format!("{}/[method:{method_name}()]", class_id(class_name))
}

pub(crate) fn invocation_id(class_name: &str, method_name: &str, index: usize) -> String {
    format!(
        "{}/[test-template-invocation:#{}]",
        method_id(class_name, method_name),
        index + 1
    )
}

/// Builds a plan out of classes and their test methods.
#[derive(Debug)]
pub(crate) struct PlanBuilder {
    plan: TestPlan,
}

impl PlanBuilder {
    pub(crate) fn new() -> Self {
        let mut plan = TestPlan::new();
        plan.add_identifier(TestIdentifier::container(ENGINE_ID, "JUnit Jupiter"))
            .expect("engine is the first node");
        Self { plan }
    }

    /// Adds a top-level class, with a container node and one test per method.
    pub(crate) fn class(self, class: TestClass) -> Self {
        self.class_under(ENGINE_ID.to_owned(), class)
    }

    /// Adds a class whose container node is a child of `parent_class`'s.
    pub(crate) fn nested_class(self, parent_class: &str, class: TestClass) -> Self {
        self.class_under(class_id(parent_class), class)
    }

    fn class_under(mut self, parent_id: String, class: TestClass) -> Self {
        let name = class.name.clone();
        let methods = class.methods.clone();
        self.plan.add_class(class).expect("class is new");
        self.plan
            .add_identifier(
                TestIdentifier::container(class_id(&name), name.as_str())
                    .with_parent(parent_id)
                    .with_source(TestSource::Class(ClassSource::new(name.clone()))),
            )
            .expect("class container is new");
        for method in methods.iter().filter(|method| method.parameter_types.is_empty()) {
            self.plan
                .add_identifier(
                    TestIdentifier::test(
                        method_id(&name, &method.name),
                        format!("{}()", method.name),
                    )
                    .with_parent(class_id(&name))
                    .with_source(TestSource::Method(MethodSource::new(
                        name.clone(),
                        method.name.clone(),
                    ))),
                )
                .expect("method node is new");
        }
        self
    }

    /// Adds a parameterized method: a container for the method, and one test
    /// per invocation.
    pub(crate) fn parameterized(
        mut self,
        class_name: &str,
        method: &MethodDecl,
        invocations: usize,
    ) -> Self {
        let parameter_types = method.parameter_types.join(", ");
        let source = MethodSource::new(class_name, method.name.clone())
            .with_parameter_types(parameter_types);
        self.plan
            .add_identifier(
                TestIdentifier::container(
                    method_id(class_name, &method.name),
                    format!("{}({})", method.name, source.parameter_types.as_deref().unwrap_or("")),
                )
                .with_parent(class_id(class_name))
                .with_source(TestSource::Method(source.clone())),
            )
            .expect("method container is new");
        for index in 0..invocations {
            self.plan
                .add_identifier(
                    TestIdentifier::test(
                        invocation_id(class_name, &method.name, index),
                        format!("[{}]", index + 1),
                    )
                    .with_parent(method_id(class_name, &method.name))
                    .with_source(TestSource::Method(source.clone())),
                )
                .expect("invocation node is new");
        }
        self
    }

    pub(crate) fn build(self) -> TestPlan {
        self.plan
    }
}

/// Drives a listener through a plan, one callback at a time.
pub(crate) struct Driver<'l, 'p, L> {
    listener: &'l mut L,
    plan: &'p TestPlan,
}

impl<'l, 'p, L: TestExecutionListener> Driver<'l, 'p, L> {
    pub(crate) fn new(listener: &'l mut L, plan: &'p TestPlan) -> Self {
        Self { listener, plan }
    }

    pub(crate) fn node(&self, unique_id: &str) -> &'p TestIdentifier {
        self.plan
            .identifier(&UniqueId::new(unique_id))
            .unwrap_or_else(|| panic!("{unique_id} is part of the plan"))
    }

    pub(crate) fn start(&mut self, unique_id: &str) -> &mut Self {
        let node = self.node(unique_id);
        self.listener.execution_started(node);
        self
    }

    pub(crate) fn finish(&mut self, unique_id: &str, result: TestExecutionResult) -> &mut Self {
        let node = self.node(unique_id);
        self.listener
            .execution_finished(node, &result)
            .unwrap_or_else(|err| panic!("finishing {unique_id} failed: {err}"));
        self
    }

    pub(crate) fn skip(&mut self, unique_id: &str, reason: &str) -> &mut Self {
        let node = self.node(unique_id);
        self.listener.execution_skipped(node, reason);
        self
    }

    /// Runs a test that starts and finishes with the given result.
    pub(crate) fn run(&mut self, unique_id: &str, result: TestExecutionResult) -> &mut Self {
        self.start(unique_id).finish(unique_id, result)
    }
}
