// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suite and test lifecycle translation, one test class at a time.

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use smol_str::SmolStr;
use stepbridge::{
    annotations::{MethodMarker, StaticAnnotations},
    errors::ListenerError,
    listener::TestExecutionListener,
    outcome::TestResult,
};
use stepbridge_metadata::{
    ExecutionStatus, FailureCause, MethodDecl, TestClass, TestExecutionResult, TestPlan,
};

fn foo_test_plan() -> TestPlan {
    PlanBuilder::new()
        .class(
            TestClass::new("FooTest")
                .with_extension(EXTENSION)
                .with_method(MethodDecl::new("shouldWork"))
                .with_method(MethodDecl::new("skipped"))
                .with_method(MethodDecl::new("throws")),
        )
        .build()
}

#[test]
fn successful_test_class() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("FooTest"))
        .run(
            &method_id("FooTest", "shouldWork"),
            TestExecutionResult::successful(),
        )
        .finish(&class_id("FooTest"), TestExecutionResult::successful());
    listener.test_plan_execution_finished(&plan);

    assert_eq!(
        listener.event_bus().event_names(),
        vec![
            "clearTestOutcomes",
            "testSuiteStarted(FooTest)",
            "clear",
            "setTestSource(junit5)",
            "testStarted(shouldWork, FooTest)",
            "testFinished",
            "setTestSource(junit5)",
            "testSuiteFinished",
        ]
    );

    let summary = listener.summary();
    let stats = summary.stats();
    assert_eq!(stats.tests_found, 3);
    assert_eq!(stats.tests_succeeded, 1);
    assert_eq!(stats.containers_succeeded, 1);
    ensure!(stats.is_success(), "no failures were reported: {stats}");
    ensure!(summary.finish_time().is_some(), "summary was finished");

    let batches = listener.report_sink().batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].name, "shouldWork");
    assert_eq!(batches[0][0].result, TestResult::Success);
    assert_eq!(batches[0][0].test_source.as_deref(), Some("junit5"));
    assert_eq!(listener.report_sink().configuration_reports(), 1);
    Ok(())
}

#[test]
fn disabled_test_is_reported_as_ignored() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(
        StaticAnnotations::new().with_marker("FooTest", "skipped", MethodMarker::Disabled),
    );
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("FooTest"))
        .skip(&method_id("FooTest", "skipped"), "disabled by annotation")
        .finish(&class_id("FooTest"), TestExecutionResult::successful());

    assert_eq!(
        listener.event_bus().event_names(),
        vec![
            "clearTestOutcomes",
            "testSuiteStarted(FooTest)",
            "setTestSource(junit5)",
            "testStarted(skipped, FooTest)",
            "testIgnored",
            "testFinished",
            "testSuiteFinished",
        ]
    );
    assert_eq!(listener.summary().stats().tests_skipped, 1);
    assert_eq!(
        listener.report_sink().batches()[0][0].result,
        TestResult::Ignored
    );
    Ok(())
}

#[test]
fn skipped_test_without_marker_is_only_counted() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("FooTest"))
        .skip(&method_id("FooTest", "skipped"), "assumption not met");

    ensure!(
        !listener
            .event_bus()
            .event_names()
            .iter()
            .any(|name| name.starts_with("testStarted")),
        "no test was started on the bus"
    );
    assert_eq!(listener.summary().stats().tests_skipped, 1);
    Ok(())
}

#[test]
fn aborted_test_overrides_result() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    let cause = FailureCause::new("org.opentest4j.TestAbortedException", "assumption failed");
    Driver::new(&mut listener, &plan)
        .start(&class_id("FooTest"))
        .run(
            &method_id("FooTest", "shouldWork"),
            TestExecutionResult::aborted(Some(cause.clone())),
        );

    let events = listener.event_bus().event_names();
    assert_eq!(
        &events[4..],
        [
            "testStarted(shouldWork, FooTest)",
            "updateCurrentStepFailureCause(org.opentest4j.TestAbortedException)",
            "overrideResultTo(ABORTED)",
            "testFinished",
            "setTestSource(junit5)",
        ]
    );

    let outcomes = listener.test_outcomes();
    assert_eq!(outcomes[0].result, TestResult::Aborted);
    assert_eq!(outcomes[0].failure_cause, Some(cause));
    assert_eq!(listener.summary().stats().tests_aborted, 1);
    Ok(())
}

#[test]
fn manual_test_keeps_recorded_result() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new().with_marker(
        "FooTest",
        "shouldWork",
        MethodMarker::Manual(TestResult::Pending),
    ));
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("FooTest"))
        .run(
            &method_id("FooTest", "shouldWork"),
            TestExecutionResult::failed(Some(FailureCause::new(
                "java.lang.AssertionError",
                "not automated",
            ))),
        );

    let events = listener.event_bus().event_names();
    assert_eq!(
        &events[5..7],
        ["testIsManual", "recordManualTestResult(PENDING)"]
    );
    assert_eq!(
        events.last().map(String::as_str),
        Some("testFailed(java.lang.AssertionError)")
    );

    let outcomes = listener.test_outcomes();
    assert_eq!(outcomes[0].result, TestResult::Pending);
    ensure!(outcomes[0].manual, "outcome is marked manual");
    assert_eq!(listener.summary().stats().tests_failed, 1);
    Ok(())
}

#[test]
fn expected_exception_suppresses_failure() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    let hook = listener.expected_exception_hook();
    listener.test_plan_execution_started(&plan);

    let throws = method_id("FooTest", "throws");
    let mut driver = Driver::new(&mut listener, &plan);
    driver.start(&class_id("FooTest")).start(&throws);
    hook.add_expected_exception("java.lang.IllegalArgumentException");
    driver.finish(
        &throws,
        TestExecutionResult::failed(Some(FailureCause::new(
            "java.lang.IllegalArgumentException",
            "bad input",
        ))),
    );
    // Registrations don't leak into the next test.
    driver.run(
        &method_id("FooTest", "shouldWork"),
        TestExecutionResult::successful(),
    );

    let events = listener.event_bus().event_names();
    assert_eq!(
        &events[4..10],
        [
            "testStarted(throws, FooTest)",
            "exceptionExpected(java.lang.IllegalArgumentException)",
            "updateCurrentStepFailureCause(java.lang.IllegalArgumentException)",
            "testFinished",
            "setTestSource(junit5)",
            "testFailed(java.lang.IllegalArgumentException)",
        ]
    );
    assert_eq!(
        events
            .iter()
            .filter(|name| name.starts_with("exceptionExpected"))
            .count(),
        1
    );

    let outcomes = listener.test_outcomes();
    assert_eq!(outcomes[0].result, TestResult::Success);
    assert_eq!(
        outcomes[0].expected_exceptions,
        vec![SmolStr::new("java.lang.IllegalArgumentException")]
    );
    assert_eq!(outcomes[0].failure_cause, None);
    ensure!(
        outcomes[1].expected_exceptions.is_empty(),
        "second test declared no expected exceptions"
    );
    Ok(())
}

#[test]
fn unsupported_status_is_returned_to_the_runner() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    let hook = listener.expected_exception_hook();
    listener.test_plan_execution_started(&plan);

    let test_id = method_id("FooTest", "shouldWork");
    let mut driver = Driver::new(&mut listener, &plan);
    driver.start(&class_id("FooTest")).start(&test_id);
    hook.add_expected_exception("java.lang.IllegalStateException");
    let node = driver.node(&test_id);
    let unknown = TestExecutionResult {
        status: ExecutionStatus::Unknown,
        throwable: None,
    };

    let err = listener
        .execution_finished(node, &unknown)
        .expect_err("unknown status is rejected");
    match &err {
        ListenerError::UnsupportedStatus(error) => {
            assert_eq!(error.unique_id(), &node.unique_id);
            assert_eq!(error.status(), ExecutionStatus::Unknown);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(listener.summary().stats().tests_finished(), 0);

    Driver::new(&mut listener, &plan).run(
        &method_id("FooTest", "throws"),
        TestExecutionResult::successful(),
    );
    assert_eq!(
        listener
            .event_bus()
            .event_names()
            .iter()
            .filter(|name| name.starts_with("exceptionExpected"))
            .count(),
        1,
        "expected exceptions were cleared after the rejected finish"
    );
    Ok(())
}

#[test]
fn class_outside_dialect_is_only_counted() -> Result<()> {
    let plan = PlanBuilder::new()
        .class(TestClass::new("PlainTest").with_method(MethodDecl::new("works")))
        .build();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("PlainTest"))
        .run(
            &method_id("PlainTest", "works"),
            TestExecutionResult::failed(Some(FailureCause::new("java.lang.AssertionError", ""))),
        )
        .finish(&class_id("PlainTest"), TestExecutionResult::successful());
    listener.test_plan_execution_finished(&plan);

    assert_eq!(listener.event_bus().event_names(), Vec::<String>::new());
    ensure!(
        listener.report_sink().batches().is_empty(),
        "no reports for classes outside the dialect"
    );
    let summary = listener.summary();
    let stats = summary.stats();
    assert_eq!(stats.tests_failed, 1);
    assert_eq!(stats.containers_succeeded, 1);
    ensure!(!stats.is_success(), "failure is counted: {stats}");
    assert_eq!(summary.failures().len(), 1);
    Ok(())
}

#[test]
fn nested_classes_report_separately() -> Result<()> {
    let plan = PlanBuilder::new()
        .class(
            TestClass::new("Outer")
                .with_extension(EXTENSION)
                .with_method(MethodDecl::new("first"))
                .with_method(MethodDecl::new("last")),
        )
        .nested_class(
            "Outer",
            TestClass::new("Outer$Inner")
                .with_enclosing("Outer")
                .with_method(MethodDecl::new("inner")),
        )
        .build();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .start(&class_id("Outer"))
        .run(&method_id("Outer", "first"), TestExecutionResult::successful())
        .start(&class_id("Outer$Inner"))
        .run(
            &method_id("Outer$Inner", "inner"),
            TestExecutionResult::successful(),
        )
        .finish(&class_id("Outer$Inner"), TestExecutionResult::successful())
        .run(&method_id("Outer", "last"), TestExecutionResult::successful())
        .finish(&class_id("Outer"), TestExecutionResult::successful());

    let suite_events: Vec<_> = listener
        .event_bus()
        .event_names()
        .into_iter()
        .filter(|name| name.contains("Suite") || name.starts_with("clearTestOutcomes"))
        .collect();
    assert_eq!(
        suite_events,
        vec![
            "clearTestOutcomes",
            "testSuiteStarted(Outer)",
            "testSuiteStarted(Outer$Inner)",
            "testSuiteFinished",
            // The outer suite is reopened for tests that run after the nested class.
            "testSuiteStarted(Outer)",
            "testSuiteFinished",
        ]
    );
    // Suites are flat: the outer suite opened first is replaced, not closed.
    let started = suite_events
        .iter()
        .filter(|name| name.starts_with("testSuiteStarted"))
        .count();
    let finished = suite_events
        .iter()
        .filter(|name| name.as_str() == "testSuiteFinished")
        .count();
    assert_eq!((started, finished), (3, 2));
    assert_eq!(listener.event_bus().current_suite(), None);

    let batches: Vec<Vec<_>> = listener
        .report_sink()
        .batches()
        .iter()
        .map(|batch| batch.iter().map(|outcome| outcome.name.as_str()).collect())
        .collect();
    assert_eq!(batches, vec![vec!["inner"], vec!["first", "last"]]);
    Ok(())
}

#[test]
fn test_without_class_start_opens_suite() -> Result<()> {
    let plan = foo_test_plan();
    let mut listener = listener(StaticAnnotations::new());
    listener.test_plan_execution_started(&plan);
    Driver::new(&mut listener, &plan)
        .run(
            &method_id("FooTest", "shouldWork"),
            TestExecutionResult::successful(),
        )
        .run(&method_id("FooTest", "throws"), TestExecutionResult::successful())
        .finish(&class_id("FooTest"), TestExecutionResult::successful());

    let events = listener.event_bus().event_names();
    assert_eq!(
        events
            .iter()
            .filter(|name| name.starts_with("testSuiteStarted"))
            .count(),
        1
    );
    assert_eq!(events.last().map(String::as_str), Some("testSuiteFinished"));
    assert_eq!(listener.report_sink().batches()[0].len(), 2);
    Ok(())
}
