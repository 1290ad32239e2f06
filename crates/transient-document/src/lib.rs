// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// transient-document — Structural PDF operations for Transient.
//
// Provides the page-range expression parser and the merge / split / reorder /
// info operations built on owned `lopdf` document handles.

pub mod pdf;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use pdf::engine::{DocumentInfo, PdfOutput, SplitPart};
pub use pdf::handle::DocumentHandle;
pub use pdf::range::{PageGroup, PageIndexSet};
