//! Table sources and the cache-backed reader that sits in front of them

use crate::cache::{FetchedTable, SnapshotCache, SourceIdentity};
use crate::error::Result;
use crate::keyed::{KeyedTable, KeyedTableBuilder, RowPolicy};
use crate::table::{Row, Table};
use std::sync::Arc;

/// Reads a whole table for a source identity
pub trait TableFetcher {
    fn fetch(&self, identity: &SourceIdentity) -> Result<FetchedTable>;
}

/// Persists a whole table for a source identity
pub trait TableWriter {
    fn write(&self, identity: &SourceIdentity, rows: &Table) -> Result<()>;
}

impl<T: TableFetcher + ?Sized> TableFetcher for &T {
    fn fetch(&self, identity: &SourceIdentity) -> Result<FetchedTable> {
        (**self).fetch(identity)
    }
}

impl<T: TableFetcher + ?Sized> TableFetcher for Box<T> {
    fn fetch(&self, identity: &SourceIdentity) -> Result<FetchedTable> {
        (**self).fetch(identity)
    }
}

/// Marker cell that counts as empty unless configured otherwise
pub const DEFAULT_PLACEHOLDER: &str = "a";

/// Drops rows that carry no data: every cell empty or a placeholder marker
#[derive(Debug, Clone)]
pub struct RowFilter {
    placeholders: Vec<String>,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self::new(vec![DEFAULT_PLACEHOLDER.to_string()])
    }
}

impl RowFilter {
    pub fn new(placeholders: Vec<String>) -> Self {
        Self { placeholders }
    }

    pub fn is_blank(&self, row: &[String]) -> bool {
        row.iter()
            .all(|cell| cell.is_empty() || self.placeholders.iter().any(|p| p == cell))
    }

    pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        let before = rows.len();
        let kept: Vec<Row> = rows.into_iter().filter(|row| !self.is_blank(row)).collect();
        if kept.len() != before {
            log::debug!("Dropped {} blank rows", before - kept.len());
        }
        kept
    }
}

/// Reads tables through a [`SnapshotCache`] owned by the reader
pub struct SheetReader<F> {
    fetcher: F,
    cache: SnapshotCache,
    filter: RowFilter,
}

impl<F: TableFetcher> SheetReader<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_filter(fetcher, RowFilter::default())
    }

    pub fn with_filter(fetcher: F, filter: RowFilter) -> Self {
        Self {
            fetcher,
            cache: SnapshotCache::new(),
            filter,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Rows of `identity`, fetched only on a cache miss or forced refresh
    pub fn read(
        &mut self,
        identity: &SourceIdentity,
        force_refresh: bool,
    ) -> Result<Arc<Table>> {
        let fetcher = &self.fetcher;
        let filter = &self.filter;
        self.cache.get_or_fetch(
            identity,
            || {
                let fetched = fetcher.fetch(identity)?;
                let rows = filter.apply(fetched.rows.into_rows());
                Ok(FetchedTable::new(fetched.title, fetched.subtitle, Table::new(rows)))
            },
            force_refresh,
        )
    }

    /// Read `identity` and group it by `key_column`
    pub fn keyed<S: AsRef<str>>(
        &mut self,
        identity: &SourceIdentity,
        key_column: &str,
        value_columns: &[S],
        policy: RowPolicy,
    ) -> Result<KeyedTable> {
        let rows = self.read(identity, false)?;
        KeyedTableBuilder::new(policy).build(&rows, key_column, value_columns)
    }

    /// Persist `rows` and make them the cached content of `identity`.
    ///
    /// The cache is only touched once the write succeeded.
    pub fn write_back<W: TableWriter + ?Sized>(
        &mut self,
        writer: &W,
        identity: &SourceIdentity,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        rows: Table,
    ) -> Result<Arc<Table>> {
        writer.write(identity, &rows)?;
        Ok(self.cache.put(identity, title, subtitle, rows))
    }
}
