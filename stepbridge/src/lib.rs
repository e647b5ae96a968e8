// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Bridges a generic test runner's lifecycle notifications into the event model
//! of a behavior-driven reporting engine.
//!
//! The main type is [`StepBridgeListener`](listener::StepBridgeListener). A
//! host runner drives it through the
//! [`TestExecutionListener`](listener::TestExecutionListener) callbacks; the
//! listener decides which tests belong to the reporting dialect, forwards
//! suite, test and example events to a [`StepEventBus`](bus::StepEventBus),
//! keeps a run-wide [`ExecutionSummary`](summary::ExecutionSummary), and hands
//! the collected outcomes to a [`ReportSink`](report::ReportSink) whenever a
//! test class completes.

pub mod annotations;
pub mod bus;
pub mod config;
pub mod data_table;
pub mod declarations;
pub mod dialect;
pub mod errors;
pub mod expected;
pub mod listener;
pub mod outcome;
pub mod report;
pub mod summary;
