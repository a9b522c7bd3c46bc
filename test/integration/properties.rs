// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use pathsync::{normalize_entry, synchronize, PathList};
use proptest::prelude::*;
use std::collections::HashSet;

// Tiny alphabet so that case and trailing separator collisions are common.
fn entries() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[aAbBcC]{0,2}[/\\\\]?", 0..12)
}

fn unique_keys(entries: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| !entry.is_empty())
        .map(|entry| normalize_entry(entry))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

proptest! {
    #[test]
    fn no_duplicates_in_output(primary in entries(), secondary in entries()) {
        let merged = synchronize(&PathList::new(primary), &PathList::new(secondary));
        let keys: Vec<String> = merged.iter().map(normalize_entry).collect();
        let unique: HashSet<&String> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());
        prop_assert!(merged.iter().all(|entry| !entry.is_empty()));
    }

    #[test]
    fn every_entry_appears_once(primary in entries(), secondary in entries()) {
        let merged = synchronize(
            &PathList::new(primary.clone()),
            &PathList::new(secondary.clone()),
        );
        let keys: Vec<String> = merged.iter().map(normalize_entry).collect();
        for entry in primary.iter().chain(secondary.iter()).filter(|e| !e.is_empty()) {
            let key = normalize_entry(entry);
            prop_assert_eq!(keys.iter().filter(|k| **k == key).count(), 1);
        }
    }

    #[test]
    fn primary_entries_lead_in_order(primary in entries(), secondary in entries()) {
        let merged = synchronize(
            &PathList::new(primary.clone()),
            &PathList::new(secondary.clone()),
        );
        let keys: Vec<String> = merged.iter().map(normalize_entry).collect();
        let primary_keys = unique_keys(&primary);

        // Output opens with every distinct primary entry, in first-seen order.
        prop_assert_eq!(&keys[..primary_keys.len()], primary_keys.as_slice());

        // Remaining entries keep the relative order of secondary.
        let rest: Vec<String> = unique_keys(&secondary)
            .into_iter()
            .filter(|key| !primary_keys.contains(key))
            .collect();
        prop_assert_eq!(&keys[primary_keys.len()..], rest.as_slice());
    }

    #[test]
    fn first_seen_spelling_retained(primary in entries(), secondary in entries()) {
        let merged = synchronize(
            &PathList::new(primary.clone()),
            &PathList::new(secondary.clone()),
        );
        for entry in merged.iter() {
            let key = normalize_entry(entry);
            let first = primary
                .iter()
                .chain(secondary.iter())
                .find(|candidate| !candidate.is_empty() && normalize_entry(candidate) == key);
            prop_assert_eq!(first.map(String::as_str), Some(entry));
        }
    }

    #[test]
    fn synchronize_is_idempotent(primary in entries(), secondary in entries()) {
        let once = synchronize(&PathList::new(primary), &PathList::new(secondary));
        let twice = synchronize(&once, &PathList::default());
        prop_assert_eq!(twice, once);
    }
}
