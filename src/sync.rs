// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! PATH list synchronization.
//!
//! A __path list__ is the ordered sequence of directories stored in a PATH
//! variable of some environment scope. Windows keeps separate PATH values at
//! the user and machine level, and every process inherits its own copy
//! assembled from both. Installers and manual edits tend to leave these lists
//! full of repeated entries that only differ by case or by a trailing
//! separator.
//!
//! Synchronization merges two path lists into one deduplicated list. The
//! __primary__ list always contributes its entries first. The __secondary__
//! list only contributes entries that the primary list does not already name.
//! The first spelling seen for an entry is the one that survives.
//!
//! # See Also
//!
//! 1. [`Environment`]
//! 2. [`ScopeSelection`]

use crate::env::{EnvError, Environment, ScopeSelection, PATH_SEPARATOR};

use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
};
use tracing::{debug, info, instrument};

/// Ordered sequence of directory entries from a single scope.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct PathList(Vec<String>);

/// Result of merging two path lists.
pub type MergedPath = PathList;

impl PathList {
    /// Construct new path list from entries.
    ///
    /// Entries are kept verbatim, empty strings included.
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(entries.into_iter().map(Into::into).collect())
    }

    /// Split raw separator-delimited text into a path list.
    ///
    /// Empty entries produced by leading, trailing, or doubled separators are
    /// dropped.
    pub fn parse(raw: impl AsRef<str>, separator: char) -> Self {
        Self(
            raw.as_ref()
                .split(separator)
                .filter(|entry| !entry.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    /// Join entries together with target separator.
    pub fn join(&self, separator: char) -> String {
        let mut buffer = [0; 4];
        self.0.join(separator.encode_utf8(&mut buffer))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for PathList {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.join(PATH_SEPARATOR).as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for PathList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Key used to compare path entries for equality.
///
/// Lowercases the entry and trims trailing `\` or `/` separators, so
/// `C:\Tools\` and `c:\tools` share a key. A drive root keeps one
/// separator, so `C:\` stays apart from the drive-relative `C:`. Deeper
/// equivalences such as short 8.3 names or `..` components are not resolved.
pub fn normalize_entry(entry: &str) -> String {
    let lowered = entry.to_lowercase();
    let trimmed = lowered.trim_end_matches(['\\', '/']);

    // INVARIANT: Root-like entries (e.g., "/") never collapse into an empty key.
    if trimmed.is_empty() {
        return lowered;
    }

    if trimmed.len() < lowered.len() && is_drive(trimmed) {
        return format!("{trimmed}\\");
    }

    trimmed.to_string()
}

fn is_drive(entry: &str) -> bool {
    let bytes = entry.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Merge two path lists into one deduplicated list.
///
/// Entries of `primary` come first in their original order, followed by the
/// entries of `secondary` that `primary` did not already provide. Empty
/// entries are discarded. Comparison goes through [`normalize_entry`], and the
/// first spelling seen is retained.
pub fn synchronize(primary: &PathList, secondary: &PathList) -> MergedPath {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());

    for entry in primary.iter().chain(secondary.iter()) {
        if entry.is_empty() {
            continue;
        }

        if seen.insert(normalize_entry(entry)) {
            merged.push(entry.to_string());
        }
    }

    PathList(merged)
}

/// Synchronize PATH through an environment port.
///
/// Reads the two scopes of a [`ScopeSelection`] fresh on every call, merges
/// them with [`synchronize`], and optionally installs the result as the PATH
/// of the current process.
#[derive(Debug)]
pub struct PathSynchronizer<E>
where
    E: Environment,
{
    env: E,
}

impl<E> PathSynchronizer<E>
where
    E: Environment,
{
    /// Construct new synchronizer over target environment port.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Compute merged path list without touching the environment.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Environment`] if either scope cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub fn merged(&self, selection: &ScopeSelection) -> Result<MergedPath> {
        let primary = self.env.read(selection.primary())?;
        let secondary = self.env.read(selection.secondary())?;
        let merged = synchronize(&primary, &secondary);
        debug!(
            "merged {} {} entries with {} {} entries into {} entries",
            primary.len(),
            selection.primary(),
            secondary.len(),
            selection.secondary(),
            merged.len()
        );

        Ok(merged)
    }

    /// Compute merged path list and assign it to the process PATH.
    ///
    /// Nothing is written unless both scopes were read successfully.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Environment`] if either scope cannot be read, or
    ///   the merged value cannot be written.
    #[instrument(skip(self), level = "debug")]
    pub fn apply(&mut self, selection: &ScopeSelection) -> Result<MergedPath> {
        let merged = self.merged(selection)?;
        self.env.write(merged.join(PATH_SEPARATOR).as_str())?;
        info!("synchronized PATH from {selection} ({} entries)", merged.len());

        Ok(merged)
    }

    /// Access underlying environment port.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Consume synchronizer, returning its environment port.
    pub fn into_env(self) -> E {
        self.env
    }
}

/// Synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Environment port failed to read or write a scope.
    #[error(transparent)]
    Environment(#[from] EnvError),
}

/// Friendly result alias :3
type Result<T, E = SyncError> = std::result::Result<T, E>;
