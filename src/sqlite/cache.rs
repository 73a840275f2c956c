use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};

use rusqlite::Statement;

use crate::error::SqlMiddlewareDbError;

/// Counters describing how a [`StatementCache`] has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Statements compiled while caching was disabled.
    pub transient: u64,
}

/// A compiled statement handed out by [`StatementCache::acquire`].
///
/// `Cached` borrows a statement the cache keeps alive; `Transient` owns a statement compiled
/// while caching is disabled and is finalized when dropped.
pub enum StatementHandle<'a, 'conn> {
    Cached(&'a mut Statement<'conn>),
    Transient(Statement<'conn>),
}

impl StatementHandle<'_, '_> {
    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self, StatementHandle::Cached(_))
    }
}

impl<'conn> Deref for StatementHandle<'_, 'conn> {
    type Target = Statement<'conn>;

    fn deref(&self) -> &Self::Target {
        match self {
            StatementHandle::Cached(stmt) => &**stmt,
            StatementHandle::Transient(stmt) => stmt,
        }
    }
}

impl DerefMut for StatementHandle<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            StatementHandle::Cached(stmt) => &mut **stmt,
            StatementHandle::Transient(stmt) => stmt,
        }
    }
}

/// Bounded map from exact SQL text to a compiled statement, evicting in insertion order.
///
/// A hit does not move an entry; the oldest insertion is always the next one out. Capacity
/// `0` disables caching.
pub struct StatementCache<'conn> {
    capacity: usize,
    entries: HashMap<String, Statement<'conn>>,
    // oldest first
    order: VecDeque<String>,
    stats: CacheStats,
}

impl<'conn> StatementCache<'conn> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the compiled statement for `sql`, compiling and inserting it on a miss.
    ///
    /// Compilation happens before any eviction, so a statement that fails to compile leaves
    /// the cache exactly as it was.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::PrepareError` if `sql` cannot be compiled.
    pub fn acquire(
        &mut self,
        conn: &'conn rusqlite::Connection,
        sql: &str,
    ) -> Result<StatementHandle<'_, 'conn>, SqlMiddlewareDbError> {
        if self.capacity == 0 {
            let stmt = conn.prepare(sql).map_err(SqlMiddlewareDbError::prepare)?;
            self.stats.transient += 1;
            tracing::trace!(sql, "statement cache disabled; compiled transient statement");
            return Ok(StatementHandle::Transient(stmt));
        }

        if self.entries.contains_key(sql) {
            self.stats.hits += 1;
            tracing::trace!(sql, "statement cache hit");
            return self
                .entries
                .get_mut(sql)
                .map(StatementHandle::Cached)
                .ok_or_else(|| {
                    SqlMiddlewareDbError::Other(format!("statement cache lost entry for {sql:?}"))
                });
        }

        let stmt = conn.prepare(sql).map_err(SqlMiddlewareDbError::prepare)?;
        self.stats.misses += 1;
        tracing::trace!(sql, "statement cache miss");
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.order.push_back(sql.to_owned());
        let stmt = self.entries.entry(sql.to_owned()).or_insert(stmt);
        Ok(StatementHandle::Cached(stmt))
    }

    /// Change the capacity. Shrinking evicts oldest entries until the cache fits; `0`
    /// releases everything.
    pub fn resize(&mut self, capacity: usize) {
        tracing::debug!(
            from = self.capacity,
            to = capacity,
            cached = self.entries.len(),
            "resizing statement cache"
        );
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    /// Release every cached statement, keeping the capacity.
    pub fn clear(&mut self) {
        tracing::debug!(cached = self.entries.len(), "clearing statement cache");
        while self.evict_oldest() {}
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, sql: &str) -> bool {
        self.entries.contains_key(sql)
    }

    /// Cached SQL texts, oldest insertion first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(sql) = self.order.pop_front() else {
            return false;
        };
        if let Some(stmt) = self.entries.remove(&sql) {
            self.stats.evictions += 1;
            tracing::debug!(sql = %sql, "evicting cached statement");
            if let Err(err) = stmt.finalize() {
                tracing::warn!(sql = %sql, error = %err, "failed to finalize evicted statement");
            }
        }
        true
    }
}

impl Drop for StatementCache<'_> {
    fn drop(&mut self) {
        self.clear();
    }
}
