//! Memoization of fetched tables keyed by source identity

use crate::error::Result;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Identity of a cacheable table: a document plus an optional sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceIdentity {
    pub document_id: String,
    pub sheet: Option<String>,
}

impl SourceIdentity {
    pub fn new(document_id: impl Into<String>, sheet: Option<String>) -> Self {
        Self {
            document_id: document_id.into(),
            sheet,
        }
    }

    pub fn document(document_id: impl Into<String>) -> Self {
        Self::new(document_id, None)
    }

    pub fn sheet(document_id: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self::new(document_id, Some(sheet.into()))
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{}#{}", self.document_id, sheet),
            None => write!(f, "{}", self.document_id),
        }
    }
}

/// Result of one successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTable {
    /// Display title of the container document
    pub title: String,
    /// Display title of the sheet within the document
    pub subtitle: String,
    pub rows: Table,
}

impl FetchedTable {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>, rows: Table) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            rows,
        }
    }
}

/// A cached table with its display titles
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub title: String,
    pub subtitle: String,
    pub rows: Arc<Table>,
    pub stored_at: DateTime<Utc>,
    pub fingerprint: String,
}

impl CacheEntry {
    fn new(title: String, subtitle: String, rows: Table) -> Self {
        let fingerprint = rows.fingerprint();
        Self {
            title,
            subtitle,
            rows: Arc::new(rows),
            stored_at: Utc::now(),
            fingerprint,
        }
    }
}

/// Process-scoped table cache.
///
/// Entries live until overwritten by a forced refresh or [`SnapshotCache::put`].
/// There is no expiry. Not thread-safe; see [`SharedSnapshotCache`].
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<SourceIdentity, CacheEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached rows for `identity`, fetching them on a miss.
    ///
    /// The fetcher runs at most once. If it fails nothing is stored and any
    /// earlier entry stays valid.
    pub fn get_or_fetch<F>(
        &mut self,
        identity: &SourceIdentity,
        fetcher: F,
        force_refresh: bool,
    ) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Result<FetchedTable>,
    {
        if !force_refresh {
            if let Some(entry) = self.entries.get(identity) {
                log::info!(
                    "Recalled sheet '{}' of '{}' ({} rows)",
                    entry.subtitle,
                    entry.title,
                    entry.rows.len()
                );
                return Ok(Arc::clone(&entry.rows));
            }
        }

        let fetched = fetcher()?;
        log::info!(
            "Read sheet '{}' of '{}' ({} rows)",
            fetched.subtitle,
            fetched.title,
            fetched.rows.len()
        );
        Ok(self.store(identity, fetched.title, fetched.subtitle, fetched.rows))
    }

    /// Install rows for `identity` without fetching, replacing any entry
    pub fn put(
        &mut self,
        identity: &SourceIdentity,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        rows: Table,
    ) -> Arc<Table> {
        log::debug!("Storing {} rows for {identity} without fetching", rows.len());
        self.store(identity, title.into(), subtitle.into(), rows)
    }

    fn store(
        &mut self,
        identity: &SourceIdentity,
        title: String,
        subtitle: String,
        rows: Table,
    ) -> Arc<Table> {
        let entry = CacheEntry::new(title, subtitle, rows);
        let rows = Arc::clone(&entry.rows);
        self.entries.insert(identity.clone(), entry);
        rows
    }

    pub fn entry(&self, identity: &SourceIdentity) -> Option<&CacheEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &SourceIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &SourceIdentity> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Thread-safe cache with one lock per identity.
///
/// Concurrent requests for the same identity serialize on that identity's
/// lock, so the fetcher runs once; different identities fetch in parallel.
#[derive(Debug, Default, Clone)]
pub struct SharedSnapshotCache {
    slots: Arc<Mutex<HashMap<SourceIdentity, Slot>>>,
}

impl SharedSnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, identity: &SourceIdentity) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(identity.clone()).or_default())
    }

    pub fn get_or_fetch<F>(
        &self,
        identity: &SourceIdentity,
        fetcher: F,
        force_refresh: bool,
    ) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Result<FetchedTable>,
    {
        let slot = self.slot(identity);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if !force_refresh {
            if let Some(entry) = guard.as_ref() {
                log::info!("Recalled sheet '{}' of '{}'", entry.subtitle, entry.title);
                return Ok(Arc::clone(&entry.rows));
            }
        }

        let fetched = fetcher()?;
        log::info!("Read sheet '{}' of '{}'", fetched.subtitle, fetched.title);
        let entry = CacheEntry::new(fetched.title, fetched.subtitle, fetched.rows);
        let rows = Arc::clone(&entry.rows);
        *guard = Some(entry);
        Ok(rows)
    }

    pub fn put(
        &self,
        identity: &SourceIdentity,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        rows: Table,
    ) -> Arc<Table> {
        let slot = self.slot(identity);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = CacheEntry::new(title.into(), subtitle.into(), rows);
        let rows = Arc::clone(&entry.rows);
        *guard = Some(entry);
        rows
    }

    /// Current entry for `identity`; lookups never create a slot
    pub fn entry(&self, identity: &SourceIdentity) -> Option<CacheEntry> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.get(identity)?)
        };
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }
}
