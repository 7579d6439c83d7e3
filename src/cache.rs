use crate::filter::CompiledPredicate;
use crate::models::{BundleKind, DetailResult, ResultBundle};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Bundle(BundleKind),
    Detail,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundle(kind) => kind.as_str(),
            Self::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntryKind,
    pub predicate: String,
}

impl CacheKey {
    pub fn new(kind: EntryKind, predicate: &CompiledPredicate) -> Self {
        Self {
            kind,
            predicate: predicate.cache_key().to_string(),
        }
    }
}

// Bundles and detail results never share a key, so a lookup only meets its own variant.
#[derive(Debug, Clone)]
enum CacheEntry {
    Bundle(Arc<ResultBundle>),
    Detail(Arc<DetailResult>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Per-session store of fetched results. A key is fetched at most once until the
/// next `invalidate_all`, whatever the fetched bundle contains.
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<CacheKey, CacheEntry>,
    last_refreshed: DateTime<Local>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            last_refreshed: Local::now(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_fetch<F>(
        &mut self,
        kind: BundleKind,
        predicate: &CompiledPredicate,
        producer: F,
    ) -> Arc<ResultBundle>
    where
        F: FnOnce() -> ResultBundle,
    {
        let key = CacheKey::new(EntryKind::Bundle(kind), predicate);
        if let Some(CacheEntry::Bundle(bundle)) = self.entries.get(&key) {
            self.hits += 1;
            tracing::debug!(kind = kind.as_str(), predicate = %key.predicate, "result cache hit");
            return Arc::clone(bundle);
        }

        self.misses += 1;
        tracing::debug!(kind = kind.as_str(), predicate = %key.predicate, "result cache miss");
        let bundle = Arc::new(producer());
        self.entries.insert(key, CacheEntry::Bundle(Arc::clone(&bundle)));
        bundle
    }

    pub fn get_or_fetch_detail<F>(
        &mut self,
        predicate: &CompiledPredicate,
        producer: F,
    ) -> Arc<DetailResult>
    where
        F: FnOnce() -> DetailResult,
    {
        let key = CacheKey::new(EntryKind::Detail, predicate);
        if let Some(CacheEntry::Detail(detail)) = self.entries.get(&key) {
            self.hits += 1;
            tracing::debug!(
                kind = key.kind.as_str(),
                predicate = %key.predicate,
                "detail cache hit"
            );
            return Arc::clone(detail);
        }

        self.misses += 1;
        tracing::debug!(kind = key.kind.as_str(), predicate = %key.predicate, "detail cache miss");
        let detail = Arc::new(producer());
        self.entries.insert(key, CacheEntry::Detail(Arc::clone(&detail)));
        detail
    }

    /// Drops every entry of every kind and stamps a new refresh instant.
    pub fn invalidate_all(&mut self) -> DateTime<Local> {
        let dropped = self.entries.len();
        self.entries.clear();
        self.last_refreshed = Local::now();
        tracing::info!(dropped, "result cache invalidated");
        self.last_refreshed
    }

    pub fn last_refreshed(&self) -> DateTime<Local> {
        self.last_refreshed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
