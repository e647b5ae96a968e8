// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::UniqueId;
use smol_str::SmolStr;
use std::{error, fmt};

/// An error that occurs while assembling a [`TestPlan`](crate::TestPlan).
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PlanBuildError {
    /// A node with the same unique ID was already added.
    DuplicateIdentifier {
        /// The repeated unique ID.
        unique_id: UniqueId,
    },

    /// A node named a parent that has not been added yet.
    UnknownParent {
        /// The unique ID of the node being added.
        unique_id: UniqueId,

        /// The parent it referred to.
        parent_id: UniqueId,
    },

    /// A class with the same name was already declared.
    DuplicateClass {
        /// The repeated class name.
        class_name: SmolStr,
    },
}

impl fmt::Display for PlanBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateIdentifier { unique_id } => {
                write!(f, "test identifier `{unique_id}` was added more than once")
            }
            Self::UnknownParent {
                unique_id,
                parent_id,
            } => {
                write!(
                    f,
                    "test identifier `{unique_id}` refers to unknown parent `{parent_id}`"
                )
            }
            Self::DuplicateClass { class_name } => {
                write!(f, "class `{class_name}` was declared more than once")
            }
        }
    }
}

impl error::Error for PlanBuildError {}
