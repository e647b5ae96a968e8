// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of runner lifecycle callbacks into event bus calls.
//!
//! The main type is [`StepBridgeListener`], which implements
//! [`TestExecutionListener`]. Recorded runs can be fed back through a listener
//! with [`replay`].

mod imp;
mod replay;
mod state;
mod traits;

pub use imp::*;
pub use replay::*;
pub use traits::*;
