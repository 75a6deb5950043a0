use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use font_core::{CanonicalWeight, FontRecord, FontStyle};
use log::trace;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Normalized request: cleaned family plus canonical weight and style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub family: String,
    pub weight: Option<CanonicalWeight>,
    pub style: Option<FontStyle>,
}

impl CacheKey {
    pub fn new(family: impl Into<String>, weight: Option<CanonicalWeight>, style: Option<FontStyle>) -> Self {
        Self {
            family: family.into(),
            weight,
            style,
        }
    }
}

/// Outcome remembered for a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheEntry {
    Resolved(FontRecord),
    /// Nothing matched; the fallback record is handed out again
    Unresolved,
}

impl CacheEntry {
    pub fn record(&self) -> FontRecord {
        match self {
            CacheEntry::Resolved(record) => record.clone(),
            CacheEntry::Unresolved => FontRecord::system_fallback(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CacheEntry::Resolved(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub resolved_entries: usize,
    pub unresolved_entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Session-wide memo of resolution outcomes.
///
/// Entries are never evicted or replaced: once a key has an outcome, later
/// inserts for it return the stored one.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let found = self.entries.read().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store `entry` unless the key already has one; returns the stored entry
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) -> CacheEntry {
        let mut entries = self.entries.write();
        let stored = entries.entry(key).or_insert_with_key(|key| {
            trace!("[ResolutionCache] {:?} -> {:?}", key, entry);
            entry
        });
        stored.clone()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let resolved_entries = entries.values().filter(|e| e.is_resolved()).count();
        CacheStats {
            resolved_entries,
            unresolved_entries: entries.len() - resolved_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(family: &str) -> CacheKey {
        CacheKey::new(family, Some(CanonicalWeight::Bold), None)
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResolutionCache::new();
        assert!(cache.get(&key("roboto")).is_none());

        let record = FontRecord::new("roboto-bold", "Roboto", CanonicalWeight::Bold);
        cache.insert(key("roboto"), CacheEntry::Resolved(record.clone()));
        assert_eq!(cache.get(&key("roboto")), Some(CacheEntry::Resolved(record)));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.resolved_entries, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn weight_and_style_are_part_of_the_key() {
        let cache = ResolutionCache::new();
        cache.insert(key("roboto"), CacheEntry::Unresolved);
        assert!(!cache.contains(&CacheKey::new("roboto", None, None)));
        assert!(!cache.contains(&CacheKey::new("roboto", Some(CanonicalWeight::Bold), Some(FontStyle::Italic))));
    }

    #[test]
    fn first_outcome_is_kept() {
        let cache = ResolutionCache::new();
        cache.insert(key("inter"), CacheEntry::Unresolved);
        let stored = cache.insert(
            key("inter"),
            CacheEntry::Resolved(FontRecord::new("inter", "Inter", CanonicalWeight::Bold)),
        );
        assert_eq!(stored, CacheEntry::Unresolved);
        assert!(stored.record().is_system_fallback());
        assert_eq!(cache.stats().unresolved_entries, 1);
    }

    #[test]
    fn concurrent_inserts_agree() {
        let cache = Arc::new(ResolutionCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let record = FontRecord::new(format!("tinos-{}", i), "Tinos", CanonicalWeight::Bold);
                    cache.insert(key("tinos"), CacheEntry::Resolved(record))
                })
            })
            .collect();

        let outcomes: Vec<CacheEntry> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stats_serialize() {
        let json = serde_json::to_string(&CacheStats::default()).unwrap();
        assert!(json.contains("\"hits\":0"));
    }
}
