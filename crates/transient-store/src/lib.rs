// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// transient-store — the object-store boundary.
//
// `ObjectStore` is the capability the rest of Transient consumes: upload,
// delete, tag listing, and transform URL generation.  Two implementations
// ship here: an in-process `MemoryStore` (with failure injection for tests)
// and a directory-backed `DirStore` used by the binary.

pub mod dir;
pub mod integrity;
pub mod memory;
pub mod dimensions;
pub mod traits;

pub use dir::DirStore;
pub use memory::MemoryStore;
pub use traits::ObjectStore;
