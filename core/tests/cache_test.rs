//! Cache identity and failure behaviour through a real fetcher

use std::cell::Cell;
use std::sync::Arc;
use tabsnap_core::{
    CsvWorkbookSource, FetchedTable, SheetReader, SnapshotCache, SourceIdentity, Table,
    TableFetcher, TabsnapError,
};

mod common;
use common::{TestWorkbooks, ENROLLMENT_CSV};

/// Fails a configurable number of times before delegating
struct FlakyFetcher<F> {
    inner: F,
    failures_left: Cell<usize>,
    calls: Cell<usize>,
}

impl<F: TableFetcher> TableFetcher for FlakyFetcher<F> {
    fn fetch(&self, identity: &SourceIdentity) -> tabsnap_core::Result<FetchedTable> {
        self.calls.set(self.calls.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(anyhow::anyhow!("connection reset").into());
        }
        self.inner.fetch(identity)
    }
}

#[test]
fn test_repeated_reads_fetch_once() {
    let books = TestWorkbooks::new();
    books.write_sheet("cursos", "altas", ENROLLMENT_CSV);
    let fetcher = FlakyFetcher {
        inner: CsvWorkbookSource::new(books.path()),
        failures_left: Cell::new(0),
        calls: Cell::new(0),
    };
    let mut reader = SheetReader::new(&fetcher);
    let id = SourceIdentity::sheet("cursos", "altas");

    let first = reader.read(&id, false).unwrap();
    let second = reader.read(&id, false).unwrap();

    assert_eq!(fetcher.calls.get(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_failed_fetch_does_not_poison_cache() {
    let books = TestWorkbooks::new();
    books.write_sheet("cursos", "altas", ENROLLMENT_CSV);
    let fetcher = FlakyFetcher {
        inner: CsvWorkbookSource::new(books.path()),
        failures_left: Cell::new(1),
        calls: Cell::new(0),
    };
    let mut reader = SheetReader::new(&fetcher);
    let id = SourceIdentity::document("cursos");

    let err = reader.read(&id, false).unwrap_err();
    assert!(matches!(err, TabsnapError::Source(_)));
    assert!(!reader.cache().contains(&id));

    let rows = reader.read(&id, false).unwrap();
    assert_eq!(fetcher.calls.get(), 2);
    assert_eq!(rows.header().unwrap().names(), &["Pasaporte", "Nombre", "Correo"]);
    assert_eq!(reader.cache().entry(&id).unwrap().subtitle, "altas");
}

#[test]
fn test_separate_caches_are_independent() {
    let mut a = SnapshotCache::new();
    let mut b = SnapshotCache::new();
    let id = SourceIdentity::document("doc");
    let table = Table::from_cells(vec![vec!["h"], vec!["1"]]);

    a.put(&id, "t", "s", table.clone());
    assert!(a.contains(&id));
    assert!(!b.contains(&id));

    let fetched = b
        .get_or_fetch(&id, || Ok(FetchedTable::new("t", "s", Table::default())), false)
        .unwrap();
    assert!(fetched.is_empty());
    assert_eq!(*a.get_or_fetch(&id, || unreachable!(), false).unwrap(), table);
}

#[test]
fn test_missing_sheet_error_propagates() {
    let books = TestWorkbooks::new();
    books.write_sheet("cursos", "altas", ENROLLMENT_CSV);
    let mut reader = SheetReader::new(CsvWorkbookSource::new(books.path()));

    let id = SourceIdentity::sheet("cursos", "inexistente");
    assert!(reader.read(&id, false).is_err());
    assert!(reader.cache().is_empty());
}
