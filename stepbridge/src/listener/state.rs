// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use smol_str::SmolStr;
use stepbridge_metadata::{MethodKey, UniqueId};

/// Mutable state of a single plan execution.
#[derive(Debug, Default)]
pub(super) struct RunState {
    /// The class owning the innermost active container.
    pub(super) current_test_class: Option<SmolStr>,

    /// Whether the innermost active container belongs to the dialect.
    pub(super) is_dialect_match: bool,

    /// Whether a suite is open on the bus for `current_test_class`.
    pub(super) suite_open: bool,

    pub(super) parameterized: ParameterizedState,

    containers: Vec<ContainerFrame>,
}

#[derive(Debug)]
struct ContainerFrame {
    unique_id: UniqueId,
    is_dialect_match: bool,
    // State of the enclosing container, restored when this one finishes.
    outer_class: Option<SmolStr>,
    outer_is_dialect_match: bool,
    outer_parameterized: ParameterizedState,
}

/// A class container that finished, as returned by [`RunState::exit_container`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct ExitedContainer {
    pub(super) is_dialect_match: bool,

    /// Whether the class ran data-driven tests while it was innermost.
    pub(super) was_parameterized: bool,
}

impl RunState {
    /// Returns true if a dialect container is active.
    pub(super) fn in_dialect_container(&self) -> bool {
        self.containers.iter().any(|frame| frame.is_dialect_match)
    }

    /// Makes a class container the innermost active container.
    ///
    /// Parameterized state starts afresh for the new class; the enclosing
    /// class's state is set aside until this container finishes.
    pub(super) fn enter_container(
        &mut self,
        unique_id: UniqueId,
        class_name: SmolStr,
        is_dialect_match: bool,
    ) {
        self.containers.push(ContainerFrame {
            unique_id,
            is_dialect_match,
            outer_class: self.current_test_class.take(),
            outer_is_dialect_match: self.is_dialect_match,
            outer_parameterized: std::mem::take(&mut self.parameterized),
        });
        self.current_test_class = Some(class_name);
        self.is_dialect_match = is_dialect_match;
        self.suite_open = is_dialect_match;
    }

    /// Leaves a class container, restoring the state of the one enclosing it.
    ///
    /// Returns `None` if the container was never entered. Containers entered
    /// after it and not yet left are discarded.
    pub(super) fn exit_container(&mut self, unique_id: &UniqueId) -> Option<ExitedContainer> {
        let position = self
            .containers
            .iter()
            .rposition(|frame| &frame.unique_id == unique_id)?;
        let frame = self.containers.split_off(position).into_iter().next()?;
        let was_parameterized = self.parameterized.is_active();
        self.current_test_class = frame.outer_class;
        self.is_dialect_match = frame.outer_is_dialect_match;
        self.parameterized = frame.outer_parameterized;
        // The bus closed the suite; the enclosing class gets a new one if it
        // runs more tests.
        self.suite_open = false;
        Some(ExitedContainer {
            is_dialect_match: frame.is_dialect_match,
            was_parameterized,
        })
    }

    /// Forgets the current class, for a container finish that had no start.
    pub(super) fn reset_current(&mut self) {
        self.current_test_class = None;
        self.is_dialect_match = false;
        self.suite_open = false;
        self.parameterized.reset();
    }
}

/// Tracks which data table row the running test corresponds to.
#[derive(Debug, Default)]
pub(super) struct ParameterizedState {
    active: bool,
    row_index: usize,
    table: Option<MethodKey>,
}

impl ParameterizedState {
    pub(super) fn is_active(&self) -> bool {
        self.active
    }

    pub(super) fn row_index(&self) -> usize {
        self.row_index
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    /// A container for a data-driven method started.
    pub(super) fn start_method_container(&mut self) {
        self.active = true;
        self.row_index = 0;
        self.table = None;
    }

    /// Makes `key` the active table. Returns true if it was not already active,
    /// in which case the row index starts over.
    pub(super) fn activate(&mut self, key: &MethodKey) -> bool {
        self.active = true;
        if self.table.as_ref() == Some(key) {
            return false;
        }
        self.table = Some(key.clone());
        self.row_index = 0;
        true
    }

    pub(super) fn advance(&mut self) {
        self.row_index += 1;
    }
}
