// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for qdesk integration tests.
//!
//! - [`ManualClock`] - clock that moves only when told to
//! - [`RecordingPublisher`], [`FailingPublisher`], [`StalledPublisher`] - event sinks
//! - [`TestHarness`] - engine over a temp SQLite database with a clinic catalog

pub mod clock;
pub mod harness;
pub mod publisher;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder, clinic_catalog};
pub use publisher::{FailingPublisher, RecordingPublisher, StalledPublisher};
