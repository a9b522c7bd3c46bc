// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Keep PATH tidy across environment scopes.
//!
//! Windows stores PATH at the user and machine level, and every process
//! inherits a copy assembled from both. pathsync merges two of these scopes
//! into one deduplicated list, installs it into the current process, and
//! links the shell profile that calls it into place.

pub mod config;
pub mod env;
pub mod link;
pub mod path;
pub mod sync;

pub use env::{Environment, MemoryEnvironment, Scope, ScopePair, ScopeSelection, SystemEnvironment};
pub use sync::{normalize_entry, synchronize, MergedPath, PathList, PathSynchronizer};
