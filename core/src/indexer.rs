//! Column resolution and record extraction over header-indexed rows

use crate::error::{Result, TabsnapError};
use crate::table::Header;
use indexmap::IndexMap;
use serde::Serialize;

/// Column-name keyed view of selected cells of one row.
///
/// The column set is closed: it is exactly the requested columns, each of
/// which was validated against the header when the record was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: IndexMap<String, String>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Value of a column, failing if the column is not part of this record
    pub fn value(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| TabsnapError::column_not_found(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves column names to positions and builds records from rows
pub struct RowIndexer;

impl RowIndexer {
    /// Map each requested column to its position in the header
    pub fn resolve<S: AsRef<str>>(header: &Header, columns: &[S]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                header
                    .position(column)
                    .ok_or_else(|| TabsnapError::column_not_found(column))
            })
            .collect()
    }

    /// Build a record holding only the requested columns of `row`
    pub fn extract<S: AsRef<str>>(
        row: &[String],
        header: &Header,
        columns: &[S],
    ) -> Result<Record> {
        let positions = Self::resolve(header, columns)?;
        Self::extract_resolved(row, columns, &positions)
    }

    /// Same as [`RowIndexer::extract`] with positions already resolved
    pub fn extract_resolved<S: AsRef<str>>(
        row: &[String],
        columns: &[S],
        positions: &[usize],
    ) -> Result<Record> {
        debug_assert_eq!(columns.len(), positions.len());

        let mut values = IndexMap::with_capacity(columns.len());
        for (column, &position) in columns.iter().zip(positions) {
            let cell = row.get(position).ok_or_else(|| TabsnapError::RowTooShort {
                column: column.as_ref().to_string(),
                position,
                row_len: row.len(),
            })?;
            values.insert(column.as_ref().to_string(), cell.clone());
        }

        Ok(Record { values })
    }
}
