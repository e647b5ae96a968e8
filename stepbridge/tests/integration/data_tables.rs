// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-driven tests: example rows, row tracking and aggregated reports.

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use stepbridge::{
    annotations::StaticAnnotations, data_table::DataTable, listener::TestExecutionListener,
    outcome::TestResult,
};
use stepbridge_metadata::{FailureCause, MethodDecl, TestClass, TestExecutionResult, TestPlan};

fn adds() -> MethodDecl {
    MethodDecl::new("adds")
        .with_parameter("int")
        .with_parameter("int")
}

fn subtracts() -> MethodDecl {
    MethodDecl::new("subtracts").with_parameter("int")
}

fn calculator_plan() -> TestPlan {
    PlanBuilder::new()
        .class(
            TestClass::new("CalculatorTest")
                .with_extension(EXTENSION)
                .with_method(adds())
                .with_method(subtracts()),
        )
        .parameterized("CalculatorTest", &adds(), 3)
        .parameterized("CalculatorTest", &subtracts(), 2)
        .build()
}

fn calculator_annotations() -> Result<StaticAnnotations> {
    Ok(StaticAnnotations::new()
        .with_data_table(
            "CalculatorTest",
            "adds",
            DataTable::new(["a", "b"], [["1", "2"], ["3", "4"], ["5", "6"]])?,
        )
        .with_data_table(
            "CalculatorTest",
            "subtracts",
            DataTable::new(["n"], [["10"], ["20"]])?,
        ))
}

#[test]
fn each_invocation_runs_the_next_example() -> Result<()> {
    let plan = calculator_plan();
    let mut listener = listener(calculator_annotations()?);
    listener.test_plan_execution_started(&plan);
    assert_eq!(listener.data_tables().len(), 2);

    let method = method_id("CalculatorTest", "adds");
    let mut driver = Driver::new(&mut listener, &plan);
    driver.start(&class_id("CalculatorTest")).start(&method);
    for index in 0..3 {
        driver.run(
            &invocation_id("CalculatorTest", "adds", index),
            TestExecutionResult::successful(),
        );
    }
    driver.finish(&method, TestExecutionResult::successful());
    assert_eq!(listener.current_row_index(), 3);

    Driver::new(&mut listener, &plan)
        .finish(&class_id("CalculatorTest"), TestExecutionResult::successful());

    assert_eq!(
        listener.event_bus().event_names(),
        vec![
            "clearTestOutcomes",
            "testSuiteStarted(CalculatorTest)",
            "clear",
            "setTestSource(junit5)",
            "testStarted(adds, CalculatorTest)",
            "useExamplesFrom(a, b; 3 rows)",
            "exampleStarted(a=1, b=2)",
            "testFinished",
            "setTestSource(junit5)",
            "exampleFinished",
            "clear",
            "setTestSource(junit5)",
            "testStarted(adds, CalculatorTest)",
            "exampleStarted(a=3, b=4)",
            "testFinished",
            "setTestSource(junit5)",
            "exampleFinished",
            "clear",
            "setTestSource(junit5)",
            "testStarted(adds, CalculatorTest)",
            "exampleStarted(a=5, b=6)",
            "testFinished",
            "setTestSource(junit5)",
            "exampleFinished",
            "testSuiteFinished",
        ]
    );

    let stats = listener.summary().stats();
    assert_eq!(stats.tests_succeeded, 3);
    // The method container and the class container.
    assert_eq!(stats.containers_succeeded, 2);

    let batches = listener.report_sink().batches();
    assert_eq!(batches.len(), 1);
    let [outcome] = batches[0].as_slice() else {
        panic!("invocations are aggregated into one outcome: {:?}", batches[0]);
    };
    assert_eq!(outcome.name, "adds");
    assert_eq!(outcome.result, TestResult::Success);
    let examples = outcome.examples.as_ref().expect("outcome has examples");
    assert_eq!(examples.headers, vec!["a", "b"]);
    let rows: Vec<_> = examples
        .rows
        .iter()
        .map(|row| (row.values["a"].as_str(), row.result))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("1", Some(TestResult::Success)),
            ("3", Some(TestResult::Success)),
            ("5", Some(TestResult::Success)),
        ]
    );
    Ok(())
}

#[test]
fn tables_switch_between_methods() -> Result<()> {
    let plan = calculator_plan();
    let mut listener = listener(calculator_annotations()?);
    listener.test_plan_execution_started(&plan);

    let assertion = FailureCause::new("org.opentest4j.AssertionFailedError", "expected: <7>");
    let mut driver = Driver::new(&mut listener, &plan);
    driver.start(&class_id("CalculatorTest"));
    for (method, rows) in [("adds", 3), ("subtracts", 2)] {
        let method_node = method_id("CalculatorTest", method);
        driver.start(&method_node);
        for index in 0..rows {
            let result = if method == "adds" && index == 1 {
                TestExecutionResult::failed(Some(assertion.clone()))
            } else {
                TestExecutionResult::successful()
            };
            driver.run(&invocation_id("CalculatorTest", method, index), result);
        }
        driver.finish(&method_node, TestExecutionResult::successful());
    }
    driver.finish(&class_id("CalculatorTest"), TestExecutionResult::successful());

    let events = listener.event_bus().event_names();
    let tables: Vec<_> = events
        .iter()
        .filter(|name| name.starts_with("useExamplesFrom"))
        .map(String::as_str)
        .collect();
    assert_eq!(tables, vec!["useExamplesFrom(a, b; 3 rows)", "useExamplesFrom(n; 2 rows)"]);
    let examples: Vec<_> = events
        .iter()
        .filter(|name| name.starts_with("exampleStarted"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        examples,
        vec![
            "exampleStarted(a=1, b=2)",
            "exampleStarted(a=3, b=4)",
            "exampleStarted(a=5, b=6)",
            "exampleStarted(n=10)",
            "exampleStarted(n=20)",
        ]
    );

    let stats = listener.summary().stats();
    assert_eq!(stats.tests_succeeded, 4);
    assert_eq!(stats.tests_failed, 1);

    let batch = &listener.report_sink().batches()[0];
    let summary: Vec<_> = batch
        .iter()
        .map(|outcome| {
            let rows = outcome
                .examples
                .as_ref()
                .map(|examples| examples.rows.len())
                .unwrap_or_default();
            (outcome.name.as_str(), outcome.result, rows)
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("adds", TestResult::Failure, 3),
            ("subtracts", TestResult::Success, 2),
        ]
    );

    let adds = &batch[0];
    assert_eq!(adds.failure_cause, Some(assertion));
    let row_results: Vec<_> = adds
        .examples
        .iter()
        .flat_map(|examples| examples.rows.iter().map(|row| row.result))
        .collect();
    assert_eq!(
        row_results,
        vec![
            Some(TestResult::Success),
            Some(TestResult::Failure),
            Some(TestResult::Success),
        ]
    );
    Ok(())
}

#[test]
fn rerunning_a_class_starts_rows_over() -> Result<()> {
    let plan = calculator_plan();
    let mut listener = listener(calculator_annotations()?);

    for run in 0..2 {
        listener.test_plan_execution_started(&plan);
        let mut driver = Driver::new(&mut listener, &plan);
        driver
            .start(&class_id("CalculatorTest"))
            .start(&method_id("CalculatorTest", "subtracts"));
        for index in 0..2 {
            driver.run(
                &invocation_id("CalculatorTest", "subtracts", index),
                TestExecutionResult::successful(),
            );
        }
        driver
            .finish(
                &method_id("CalculatorTest", "subtracts"),
                TestExecutionResult::successful(),
            )
            .finish(&class_id("CalculatorTest"), TestExecutionResult::successful());
        listener.test_plan_execution_finished(&plan);

        let batches = listener.report_sink().batches();
        assert_eq!(batches.len(), run + 1);
        let rows = batches[run][0]
            .examples
            .as_ref()
            .map(|examples| examples.rows.len());
        assert_eq!(rows, Some(2), "run {run} reports exactly two rows");
    }

    let examples = listener
        .event_bus()
        .event_names()
        .into_iter()
        .filter(|name| name.starts_with("exampleStarted"))
        .collect::<Vec<_>>();
    assert_eq!(
        examples,
        vec![
            "exampleStarted(n=10)",
            "exampleStarted(n=20)",
            "exampleStarted(n=10)",
            "exampleStarted(n=20)",
        ]
    );
    ensure!(
        listener.summary().stats().is_success(),
        "second run has its own summary"
    );
    assert_eq!(listener.summary().stats().tests_succeeded, 2);
    Ok(())
}

#[test]
fn nested_class_keeps_outer_examples_aggregated() -> Result<()> {
    let plan = PlanBuilder::new()
        .class(
            TestClass::new("Outer")
                .with_extension(EXTENSION)
                .with_method(adds()),
        )
        .parameterized("Outer", &adds(), 3)
        .nested_class(
            "Outer",
            TestClass::new("Outer$Inner")
                .with_enclosing("Outer")
                .with_method(MethodDecl::new("inner")),
        )
        .build();
    let mut listener = listener(StaticAnnotations::new().with_data_table(
        "Outer",
        "adds",
        DataTable::new(["a", "b"], [["1", "2"], ["3", "4"], ["5", "6"]])?,
    ));
    listener.test_plan_execution_started(&plan);

    let mut driver = Driver::new(&mut listener, &plan);
    driver
        .start(&class_id("Outer"))
        .start(&method_id("Outer", "adds"));
    for index in 0..3 {
        driver.run(
            &invocation_id("Outer", "adds", index),
            TestExecutionResult::successful(),
        );
    }
    driver
        .finish(&method_id("Outer", "adds"), TestExecutionResult::successful())
        .start(&class_id("Outer$Inner"))
        .run(
            &method_id("Outer$Inner", "inner"),
            TestExecutionResult::successful(),
        )
        .finish(&class_id("Outer$Inner"), TestExecutionResult::successful())
        .finish(&class_id("Outer"), TestExecutionResult::successful());

    let batches = listener.report_sink().batches();
    let names: Vec<Vec<_>> = batches
        .iter()
        .map(|batch| batch.iter().map(|outcome| outcome.name.as_str()).collect())
        .collect();
    assert_eq!(names, vec![vec!["inner"], vec!["adds"]]);

    let rows = batches[1][0]
        .examples
        .as_ref()
        .map(|examples| examples.rows.len());
    assert_eq!(rows, Some(3), "outer invocations are aggregated");
    ensure!(
        batches[0][0].examples.is_none(),
        "nested class has no examples"
    );
    Ok(())
}
