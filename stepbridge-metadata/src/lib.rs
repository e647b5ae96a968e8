// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model for test plans, test identifiers and execution results, as
//! handed to [stepbridge](https://crates.io/crates/stepbridge) by a host test
//! runner.
//!
//! Everything in this crate is owned by the runner and read-only to the
//! listener. All types are serializable, so a runner living in another process
//! can describe its plan and event stream as JSON.

mod declarations;
mod errors;
mod events;
mod plan;
mod results;

pub use declarations::*;
pub use errors::*;
pub use events::*;
pub use plan::*;
pub use results::*;
