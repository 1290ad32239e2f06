// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transient — Core types, configuration, clocks, and error definitions shared
// across all crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod transform;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, RetentionWindow};
pub use error::{ErrorKind, TransientError};
pub use transform::TransformSpec;
pub use types::*;
