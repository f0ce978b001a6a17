//! Result cache with single-flight loading.
//!
//! Each key owns a `tokio::sync::OnceCell`. The map lock is only held long
//! enough to fetch or insert that cell, so lookups for different keys run
//! concurrently while callers for the same key share one computation.

use crate::record::{Edition, LexicalRecord};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Normalized lookup word: trimmed, NFC. Case is preserved because wiki
/// titles are case-sensitive.
pub fn normalize_word(word: &str) -> String {
    word.trim().nfc().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub edition: Edition,
    pub word: String,
}

impl CacheKey {
    pub fn new(edition: Edition, word: &str) -> Self {
        CacheKey {
            edition,
            word: normalize_word(word),
        }
    }
}

type Slot = Arc<OnceCell<Arc<LexicalRecord>>>;

/// Records keyed by (edition, normalized word).
///
/// Entries live until [`RecordCache::evict`] or [`RecordCache::clear`];
/// nothing is evicted automatically.
#[derive(Debug, Default)]
pub struct RecordCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        self.lock().entry(key.clone()).or_default().clone()
    }

    /// Cached record, without computing
    pub fn get(&self, key: &CacheKey) -> Option<Arc<LexicalRecord>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Return the cached record for `key`, or run `compute` to produce it.
    ///
    /// Concurrent callers for the same key wait on a single `compute`. An
    /// error (or a dropped/cancelled caller) leaves nothing behind, so the
    /// next caller runs its own `compute`.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &CacheKey, compute: F) -> Result<Arc<LexicalRecord>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LexicalRecord, E>>,
    {
        let slot = PendingSlot {
            cache: self,
            key,
            slot: self.slot(key),
        };
        if let Some(record) = slot.slot.get() {
            debug!(edition = %key.edition, word = %key.word, "cache hit");
            return Ok(record.clone());
        }

        let record = slot
            .slot
            .get_or_try_init(|| async move {
                debug!(edition = %key.edition, word = %key.word, "cache miss");
                compute().await.map(Arc::new)
            })
            .await?;
        Ok(record.clone())
    }

    /// Drop the entry for `key`. Returns whether a record was cached.
    pub fn evict(&self, key: &CacheKey) -> bool {
        self.lock()
            .remove(key)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds a caller's handle on a slot. When the last caller lets go of a
/// slot that is still empty (failed or cancelled compute), the map entry
/// is removed so misses do not accumulate.
struct PendingSlot<'a> {
    cache: &'a RecordCache,
    key: &'a CacheKey,
    slot: Slot,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.slot.initialized() {
            return;
        }
        let mut slots = self.cache.lock();
        // One reference in the map, one here: nobody else is waiting on it
        let unused = slots
            .get(self.key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.slot) && Arc::strong_count(entry) == 2);
        if unused {
            slots.remove(self.key);
        }
    }
}

#[cfg(test)]
impl RecordCache {
    /// Map entries, including empty ones
    fn slot_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn record(word: &str) -> LexicalRecord {
        LexicalRecord::empty(Edition::Polish, word)
    }

    #[test]
    fn key_normalizes_whitespace_and_composition() {
        // "ż" as z + combining dot above
        let decomposed = CacheKey::new(Edition::Polish, "  z\u{307}aba ");
        let composed = CacheKey::new(Edition::Polish, "żaba");
        assert_eq!(decomposed, composed);
        assert_ne!(CacheKey::new(Edition::Polish, "Kot"), CacheKey::new(Edition::Polish, "kot"));
        assert_ne!(CacheKey::new(Edition::English, "kot"), CacheKey::new(Edition::Polish, "kot"));
    }

    #[tokio::test]
    async fn hit_skips_compute() {
        let cache = RecordCache::new();
        let key = CacheKey::new(Edition::Polish, "kot");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let result: Result<_, ()> = cache
                .get_or_compute(&key, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(record("kot"))
                })
                .await;
            assert_eq!(result.unwrap().word, "kot");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache = RecordCache::new();
        let key = CacheKey::new(Edition::Polish, "kot");

        let failed = cache.get_or_compute(&key, || async { Err::<LexicalRecord, _>("boom") }).await;
        assert_eq!(failed.unwrap_err(), "boom");
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());

        assert_eq!(cache.slot_count(), 0);

        let retried: Result<_, &str> = cache.get_or_compute(&key, || async { Ok(record("kot")) }).await;
        assert!(retried.is_ok());
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_compute() {
        let cache = Arc::new(RecordCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new(Edition::Polish, "kot");

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute(&key, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok::<_, ()>(record("kot"))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_compute_leaves_slot_empty() {
        let cache = RecordCache::new();
        let key = CacheKey::new(Edition::Polish, "kot");

        let pending = cache.get_or_compute(&key, || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ()>(record("kot"))
        });
        assert!(tokio::time::timeout(Duration::from_millis(10), pending).await.is_err());
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.slot_count(), 0);

        let retried = cache.get_or_compute(&key, || async { Ok::<_, ()>(record("kot")) }).await;
        assert!(retried.is_ok());
    }

    #[tokio::test]
    async fn failed_lookups_do_not_accumulate() {
        let cache = RecordCache::new();
        for n in 0..1000 {
            let key = CacheKey::new(Edition::Polish, &format!("brak{}", n));
            let result = cache.get_or_compute(&key, || async { Err::<LexicalRecord, _>("not found") }).await;
            assert!(result.is_err());
        }
        assert!(cache.is_empty());
        assert_eq!(cache.slot_count(), 0);
    }

    #[tokio::test]
    async fn failure_with_waiters_keeps_single_flight() {
        let cache = Arc::new(RecordCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new(Edition::Polish, "kot");

        // First compute fails after a delay; waiters retry on the same slot
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute(&key, || async move {
                            let n = calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            if n == 0 {
                                Err("flaky")
                            } else {
                                Ok(record("kot"))
                            }
                        })
                        .await
                })
            })
            .collect();

        let mut failures = 0;
        for task in tasks {
            if task.await.unwrap().is_err() {
                failures += 1;
            }
        }
        assert_eq!(failures, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.slot_count(), 1);
    }

    #[tokio::test]
    async fn evict_and_clear() {
        let cache = RecordCache::new();
        let kot = CacheKey::new(Edition::Polish, "kot");
        let pies = CacheKey::new(Edition::Polish, "pies");
        for key in [&kot, &pies] {
            let _ = cache.get_or_compute(key, || async move { Ok::<_, ()>(record(&key.word)) }).await;
        }
        assert_eq!(cache.len(), 2);

        assert!(cache.evict(&kot));
        assert!(!cache.evict(&kot));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
