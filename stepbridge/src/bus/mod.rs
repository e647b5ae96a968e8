// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event bus of the reporting engine.
//!
//! The listener translates runner notifications into calls on a
//! [`StepEventBus`]. [`RecordingEventBus`] is an in-memory implementation that
//! logs every call as a [`BusEvent`] and builds a [`TestOutcome`](crate::outcome::TestOutcome)
//! per started test.

mod events;
mod imp;
mod recording;

pub use events::*;
pub use imp::*;
pub use recording::*;
