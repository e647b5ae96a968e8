// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run-wide counters of containers and tests, by outcome.

use crate::errors::UnsupportedStatusError;
use chrono::{DateTime, FixedOffset, Local};
use std::{
    fmt,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use stepbridge_metadata::{
    ExecutionStatus, FailureCause, TestExecutionResult, TestIdentifier, TestPlan, UniqueId,
};
use tracing::debug;

/// A failure captured while the plan executed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedFailure {
    /// The node that failed.
    pub unique_id: UniqueId,

    /// The display name of the node that failed.
    pub display_name: String,

    /// What caused the failure.
    pub cause: FailureCause,
}

/// Summary of a test plan's execution, shared with the host.
///
/// Created when the plan starts and finalized when it finishes. Counters can be
/// read at any time through [`stats`](Self::stats).
#[derive(Debug)]
pub struct ExecutionSummary {
    containers_found: usize,
    tests_found: usize,
    start_time: DateTime<FixedOffset>,
    finish_time: Mutex<Option<DateTime<FixedOffset>>>,
    containers_succeeded: AtomicUsize,
    containers_aborted: AtomicUsize,
    containers_failed: AtomicUsize,
    containers_skipped: AtomicUsize,
    tests_succeeded: AtomicUsize,
    tests_aborted: AtomicUsize,
    tests_failed: AtomicUsize,
    tests_skipped: AtomicUsize,
    failures: Mutex<Vec<RecordedFailure>>,
}

impl ExecutionSummary {
    /// Creates a summary for a plan that is about to execute.
    pub fn new(plan: &TestPlan) -> Self {
        Self::with_counts(plan.container_count(), plan.test_count())
    }

    /// Creates a summary for a plan with the given numbers of nodes.
    pub fn with_counts(containers_found: usize, tests_found: usize) -> Self {
        Self {
            containers_found,
            tests_found,
            start_time: Local::now().fixed_offset(),
            finish_time: Mutex::new(None),
            containers_succeeded: AtomicUsize::new(0),
            containers_aborted: AtomicUsize::new(0),
            containers_failed: AtomicUsize::new(0),
            containers_skipped: AtomicUsize::new(0),
            tests_succeeded: AtomicUsize::new(0),
            tests_aborted: AtomicUsize::new(0),
            tests_failed: AtomicUsize::new(0),
            tests_skipped: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Classifies a finished node by its status.
    ///
    /// Failures that carry a cause are captured against the node. Statuses
    /// other than successful, aborted and failed are rejected.
    pub fn record(
        &self,
        identifier: &TestIdentifier,
        result: &TestExecutionResult,
    ) -> Result<(), UnsupportedStatusError> {
        let (container_counter, test_counter) = match result.status {
            ExecutionStatus::Successful => (&self.containers_succeeded, &self.tests_succeeded),
            ExecutionStatus::Aborted => (&self.containers_aborted, &self.tests_aborted),
            ExecutionStatus::Failed => (&self.containers_failed, &self.tests_failed),
            status => {
                return Err(UnsupportedStatusError::new(
                    identifier.unique_id.clone(),
                    status,
                ));
            }
        };
        self.increment(identifier, container_counter, test_counter);

        if result.status == ExecutionStatus::Failed {
            if let Some(cause) = &result.throwable {
                self.lock_failures().push(RecordedFailure {
                    unique_id: identifier.unique_id.clone(),
                    display_name: identifier.display_name.clone(),
                    cause: cause.clone(),
                });
            }
        }
        Ok(())
    }

    /// Counts a node the runner skipped.
    pub fn record_skipped(&self, identifier: &TestIdentifier) {
        self.increment(identifier, &self.containers_skipped, &self.tests_skipped);
    }

    /// Marks the plan as finished, and returns the final counters.
    pub fn finish(&self) -> SummaryStats {
        let finish_time = Local::now().fixed_offset();
        *self
            .finish_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(finish_time);
        let stats = self.stats();
        debug!(
            "test plan finished in {}ms: {stats}",
            (finish_time - self.start_time).num_milliseconds()
        );
        stats
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> SummaryStats {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        SummaryStats {
            containers_found: self.containers_found,
            tests_found: self.tests_found,
            containers_succeeded: load(&self.containers_succeeded),
            containers_aborted: load(&self.containers_aborted),
            containers_failed: load(&self.containers_failed),
            containers_skipped: load(&self.containers_skipped),
            tests_succeeded: load(&self.tests_succeeded),
            tests_aborted: load(&self.tests_aborted),
            tests_failed: load(&self.tests_failed),
            tests_skipped: load(&self.tests_skipped),
        }
    }

    /// Returns the captured failures, in the order they were recorded.
    pub fn failures(&self) -> Vec<RecordedFailure> {
        self.lock_failures().clone()
    }

    /// The time at which the plan started.
    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.start_time
    }

    /// The time at which the plan finished, if it has.
    pub fn finish_time(&self) -> Option<DateTime<FixedOffset>> {
        *self
            .finish_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn increment(
        &self,
        identifier: &TestIdentifier,
        container_counter: &AtomicUsize,
        test_counter: &AtomicUsize,
    ) {
        if identifier.is_container() {
            container_counter.fetch_add(1, Ordering::Relaxed);
        }
        if identifier.is_test() {
            test_counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn lock_failures(&self) -> MutexGuard<'_, Vec<RecordedFailure>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A snapshot of an [`ExecutionSummary`]'s counters.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryStats {
    /// The number of containers in the plan.
    pub containers_found: usize,

    /// The number of tests in the plan.
    pub tests_found: usize,

    /// The number of containers that finished successfully.
    pub containers_succeeded: usize,

    /// The number of containers that were aborted.
    pub containers_aborted: usize,

    /// The number of containers that failed.
    pub containers_failed: usize,

    /// The number of containers that were skipped.
    pub containers_skipped: usize,

    /// The number of tests that finished successfully.
    pub tests_succeeded: usize,

    /// The number of tests that were aborted.
    pub tests_aborted: usize,

    /// The number of tests that failed.
    pub tests_failed: usize,

    /// The number of tests that were skipped.
    pub tests_skipped: usize,
}

impl SummaryStats {
    /// Returns the number of tests that finished, whatever their status.
    pub fn tests_finished(&self) -> usize {
        self.tests_succeeded + self.tests_aborted + self.tests_failed
    }

    /// Returns true if nothing failed.
    pub fn is_success(&self) -> bool {
        !self.any_failed()
    }

    /// Returns true if any container or test failed.
    #[inline]
    pub fn any_failed(&self) -> bool {
        self.containers_failed > 0 || self.tests_failed > 0
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} tests run: {} succeeded, {} aborted, {} failed, {} skipped",
            self.tests_finished(),
            self.tests_found,
            self.tests_succeeded,
            self.tests_aborted,
            self.tests_failed,
            self.tests_skipped,
        )
    }
}
