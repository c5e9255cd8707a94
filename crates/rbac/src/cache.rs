//! Cross-context decision caching.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::checker::AccessChecker;
use crate::config::RbacConfig;
use crate::store::{ItemStore, SubjectId};
use crate::Result;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    granted: bool,
    expires_at: Instant,
}

/// Handle to a shared `(subject, name) -> decision` map.
///
/// Cloning is cheap and shares the underlying map, so the same cache can
/// back the checkers of many evaluation contexts. Entries expire
/// individually; an expired entry is a miss. Racing writes are
/// last-writer-wins and a poisoned lock degrades to a miss rather than
/// blocking or failing a check.
#[derive(Clone, Default)]
pub struct DecisionCache {
    entries: Arc<RwLock<HashMap<(SubjectId, String), CacheEntry>>>,
}

impl DecisionCache {
    fn get(&self, subject: SubjectId, name: &str, now: Instant) -> Option<bool> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&(subject, name.to_string()))?;
        (entry.expires_at > now).then_some(entry.granted)
    }

    fn put(&self, subject: SubjectId, name: &str, granted: bool, expires_at: Instant) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((subject, name.to_string()), CacheEntry { granted, expires_at });
        }
    }

    /// Drop every cached decision.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

/// Decorator adding a TTL-bounded, cross-context cache in front of an
/// [`AccessChecker`].
///
/// Disabled, every call goes straight to the inner checker and only its
/// per-context memoization applies. Enabled, each (subject, name) decision
/// is kept for `ttl` and served without consulting the inner checker or
/// the store.
pub struct CachingChecker {
    inner: AccessChecker,
    enabled: bool,
    ttl: Duration,
    cache: DecisionCache,
}

impl CachingChecker {
    pub fn new(inner: AccessChecker, enabled: bool, ttl: Duration) -> Self {
        Self {
            inner,
            enabled,
            ttl,
            cache: DecisionCache::default(),
        }
    }

    /// Checker configured from the `cache_enable` / `cache_duration`
    /// options.
    pub fn from_config(inner: AccessChecker, config: &RbacConfig) -> Self {
        Self::new(inner, config.cache_enable, config.cache_ttl())
    }

    /// Share an existing decision cache, e.g. the one used by the
    /// previous context's checker.
    pub fn with_cache(mut self, cache: DecisionCache) -> Self {
        self.cache = cache;
        self
    }

    /// Handle to the shared decision cache.
    pub fn cache(&self) -> DecisionCache {
        self.cache.clone()
    }

    /// True if the subject holds at least one of `names`.
    pub fn has<S: ItemStore>(
        &mut self,
        store: &S,
        names: &[&str],
        subject: Option<SubjectId>,
    ) -> Result<bool> {
        if !self.enabled {
            return self.inner.has(store, names, subject);
        }
        let Some(subject) = self.inner.resolve_subject(subject) else {
            return Ok(false);
        };
        let now = Instant::now();
        for name in names {
            let granted = match self.cache.get(subject, name, now) {
                Some(cached) => cached,
                None => {
                    let computed = self.inner.has(store, &[name], Some(subject))?;
                    self.cache.put(subject, name, computed, now + self.ttl);
                    computed
                }
            };
            if granted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if the subject holds none of `names`.
    pub fn has_none<S: ItemStore>(
        &mut self,
        store: &S,
        names: &[&str],
        subject: Option<SubjectId>,
    ) -> Result<bool> {
        Ok(!self.has(store, names, subject)?)
    }

    /// Reset the inner checker's per-context caches. The shared decision
    /// cache is left alone; it expires by TTL.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Discard the inner checker's memoized hierarchy closures.
    pub fn invalidate_items(&mut self) {
        self.inner.invalidate_items();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::memory::MemoryStore;

    fn store_with_assignment() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.save_item(&Item::role("Manager")).unwrap();
        store.save_item(&Item::permission("articles.create")).unwrap();
        store.add_child("Manager", "articles.create").unwrap();
        store.add_assignment(2, "Manager").unwrap();
        store
    }

    #[test]
    fn test_enabled_serves_from_cache_after_mutation() {
        let mut store = store_with_assignment();
        let mut checker =
            CachingChecker::new(AccessChecker::new(), true, Duration::from_secs(60));

        assert!(checker.has(&store, &["articles.create"], Some(2)).unwrap());

        // Mutation plus a full inner reset: the shared cache still answers.
        store.remove_assignments(2).unwrap();
        checker.reset();
        checker.invalidate_items();
        assert!(checker.has(&store, &["articles.create"], Some(2)).unwrap());

        // Clearing the shared cache makes the revocation visible.
        checker.cache().clear();
        checker.reset();
        assert!(!checker.has(&store, &["articles.create"], Some(2)).unwrap());
    }

    #[test]
    fn test_disabled_delegates() {
        let mut store = store_with_assignment();
        let mut checker = CachingChecker::new(AccessChecker::new(), false, Duration::from_secs(60));

        assert!(checker.has(&store, &["articles.create"], Some(2)).unwrap());
        store.remove_assignments(2).unwrap();
        checker.reset();
        assert!(!checker.has(&store, &["articles.create"], Some(2)).unwrap());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let mut store = store_with_assignment();
        let mut checker = CachingChecker::new(AccessChecker::new(), true, Duration::ZERO);

        assert!(checker.has(&store, &["articles.create"], Some(2)).unwrap());
        store.remove_assignments(2).unwrap();
        checker.reset();
        // Every entry is already expired, so the miss re-evaluates.
        assert!(!checker.has(&store, &["articles.create"], Some(2)).unwrap());
    }

    #[test]
    fn test_cache_shared_between_checkers() {
        let store = store_with_assignment();
        let mut first = CachingChecker::new(AccessChecker::new(), true, Duration::from_secs(60));
        assert!(first.has(&store, &["Manager"], Some(2)).unwrap());

        let mut second = CachingChecker::new(AccessChecker::new(), true, Duration::from_secs(60))
            .with_cache(first.cache());
        // Served from the shared map: an empty store would deny otherwise.
        let empty = MemoryStore::new();
        assert!(second.has(&empty, &["Manager"], Some(2)).unwrap());
    }

    #[test]
    fn test_no_subject_fails_closed() {
        let store = store_with_assignment();
        let mut checker = CachingChecker::new(AccessChecker::new(), true, Duration::from_secs(60));
        assert!(!checker.has(&store, &["Manager"], None).unwrap());
    }
}
