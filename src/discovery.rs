//! Ephemeral registration set for discoverable entries.
//!
//! Coordinators publish entries (e.g. "Wallet Info" in the search bar) while
//! some derived condition holds and withdraw them when it stops holding. The
//! set keeps at most one entry per [`ComposedKey`]; `add` on a present key and
//! `remove` on an absent key are no-ops, so repeated signal emissions never
//! duplicate or over-remove anything.
//!
//! Only real insertions and removals are forwarded to the external
//! [`DiscoveryIndex`], so its call counts match state edges rather than
//! emission counts.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Stable identity of a registration, built from one or more parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComposedKey(Vec<String>);

impl ComposedKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ComposedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Payload of a registration as shown by the discovery UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub name: String,
    pub description: String,
    pub category: String,
}

impl SearchEntry {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
        }
    }
}

/// External search/discovery index.
pub trait DiscoveryIndex: Send + Sync + 'static {
    fn add(&self, key: &ComposedKey, entry: &SearchEntry);

    fn remove(&self, key: &ComposedKey);
}

/// Keyed set of live registrations, mirrored into an optional index.
pub struct RegistrationSet {
    entries: DashMap<ComposedKey, SearchEntry>,
    index: Option<Arc<dyn DiscoveryIndex>>,
}

impl RegistrationSet {
    /// A standalone set with no external index.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            index: None,
        }
    }

    /// A set that forwards every real change to `index`.
    pub fn with_index(index: Arc<dyn DiscoveryIndex>) -> Self {
        Self {
            entries: DashMap::new(),
            index: Some(index),
        }
    }

    /// Insert `entry` under `key` unless the key is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn add(&self, key: ComposedKey, entry: SearchEntry) -> bool {
        // The shard lock must be released before calling out to the index.
        let inserted = match self.entries.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                true
            }
            Entry::Occupied(_) => false,
        };

        if inserted {
            tracing::debug!(key = %key, "Registered discovery entry");
            if let Some(index) = &self.index {
                index.add(&key, &entry);
            }
        }
        inserted
    }

    /// Remove the entry under `key` if present.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&self, key: &ComposedKey) -> bool {
        let removed = self.entries.remove(key).is_some();

        if removed {
            tracing::debug!(key = %key, "Removed discovery entry");
            if let Some(index) = &self.index {
                index.remove(key);
            }
        }
        removed
    }

    pub fn contains(&self, key: &ComposedKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &ComposedKey) -> Option<SearchEntry> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently registered, in no particular order.
    pub fn keys(&self) -> Vec<ComposedKey> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }
}

impl Default for RegistrationSet {
    fn default() -> Self {
        Self::new()
    }
}
