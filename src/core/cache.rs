use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, Property};
use lru::LruCache;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// 快取鍵：(頁碼, 每頁筆數, 排序, 條件) 的確定性序列化
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyParts<'a> {
    page: usize,
    page_size: usize,
    sort: &'a str,
    criteria: &'a Criteria,
}

impl CacheKey {
    pub fn new(page: usize, page_size: usize, sort: SortOrder, criteria: &Criteria) -> Self {
        let parts = KeyParts {
            page,
            page_size,
            sort: sort.as_str(),
            criteria,
        };
        // Struct fields serialize in declaration order and amenities are a
        // BTreeSet, so equal inputs always give the same string.
        let serialized = serde_json::to_string(&parts).unwrap_or_else(|_| {
            format!("{}|{}|{}|{:?}", page, page_size, sort.as_str(), criteria)
        });
        Self(serialized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored page. Entries are replaced, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub items: Vec<Property>,
    pub total_items: usize,
    pub created_at: Instant,
}

impl CacheEntry {
    pub fn new(items: Vec<Property>, total_items: usize) -> Self {
        Self {
            items,
            total_items,
            created_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now <= self.created_at + ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// LRU + TTL result cache, owned by a single search controller.
///
/// Expiry is checked lazily: an expired entry is removed the moment it is
/// looked up and reported as a miss.
pub struct ResultCache {
    entries: LruCache<CacheKey, CacheEntry>,
    ttl: Duration,
    stats: CacheStats,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        let now = Instant::now();
        let fresh = match self.entries.peek(key) {
            Some(entry) => entry.is_fresh(self.ttl, now),
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if !fresh {
            self.entries.pop(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            tracing::debug!(key = %key, "Result cache entry expired");
            return None;
        }

        self.stats.hits += 1;
        // get() promotes to most-recently-used
        self.entries.get(key)
    }

    pub fn set(&mut self, key: CacheKey, entry: CacheEntry) {
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                self.stats.evictions += 1;
                tracing::debug!(key = %evicted, "Result cache evicted least-recently-used entry");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
