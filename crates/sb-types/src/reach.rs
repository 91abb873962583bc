//! Blob reachability.
//!
//! A key is reachable iff a library entry claims it or a persistent sound in
//! any tab places it. Ephemeral sounds never count. Every deletion path asks
//! here; nothing else decides whether a blob may go.

use std::collections::HashSet;

use crate::ids::{SoundId, StorageKey, TabId};
use crate::model::Workspace;

impl Workspace {
    /// Every persistent placement of `key`, in tab then sound order.
    pub fn placements(&self, key: &StorageKey) -> Vec<(TabId, SoundId)> {
        self.tabs()
            .iter()
            .flat_map(|t| {
                t.sounds
                    .iter()
                    .filter(|s| s.persisted_key() == Some(key))
                    .map(move |s| (t.id, s.id.clone()))
            })
            .collect()
    }

    /// Whether any persistent sound places `key`.
    pub fn is_placed(&self, key: &StorageKey) -> bool {
        self.tabs()
            .iter()
            .flat_map(|t| t.sounds.iter())
            .any(|s| s.persisted_key() == Some(key))
    }

    /// Whether `key` is reachable from the library or any tab.
    pub fn is_referenced(&self, key: &StorageKey) -> bool {
        self.library_entry(key).is_some() || self.is_placed(key)
    }

    /// The subset of `candidates` that is no longer reachable, deduplicated,
    /// in first-seen order.
    pub fn unreachable<'a, I>(&self, candidates: I) -> Vec<StorageKey>
    where
        I: IntoIterator<Item = &'a StorageKey>,
    {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|k| seen.insert(*k))
            .filter(|k| !self.is_referenced(k))
            .cloned()
            .collect()
    }
}
