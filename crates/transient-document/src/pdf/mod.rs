// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page-range parsing, document handles, and structural operations.

pub mod engine;
pub mod handle;
pub mod range;

pub use engine::{info, merge, reorder, split, split_expression};
pub use range::{parse, parse_groups};
