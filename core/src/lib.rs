//! # tabsnap-core
//!
//! Core library for tabsnap - a tabular snapshot cache and change-detection
//! engine for spreadsheet-like sources.
//!
//! Fetched tables are memoized per source identity, rows are resolved into
//! records through their header and grouped by a key column, and two versions
//! of a row (or of a whole table) can be diffed and explained.

pub mod cache;
pub mod compare;
pub mod config;
pub mod csv_source;
pub mod diff;
pub mod error;
pub mod indexer;
pub mod keyed;
pub mod markup;
pub mod naming;
pub mod source;
pub mod store;
pub mod table;

// Re-export the most commonly used types for convenience
pub use cache::{CacheEntry, FetchedTable, SharedSnapshotCache, SnapshotCache, SourceIdentity};
pub use compare::{TableChanges, TableComparator};
pub use config::Config;
pub use csv_source::CsvWorkbookSource;
pub use diff::{CellChange, DiffMap, RowDiffEngine};
pub use error::{Result, TabsnapError};
pub use indexer::{Record, RowIndexer};
pub use keyed::{KeyedTable, KeyedTableBuilder, RowPolicy};
pub use markup::MarkupTableParser;
pub use source::{RowFilter, SheetReader, TableFetcher, TableWriter};
pub use store::{SnapshotMetadata, SnapshotStore, StoredSnapshot};
pub use table::{Header, Row, Table};
