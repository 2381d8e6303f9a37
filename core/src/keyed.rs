//! Grouping of table rows into records keyed by a column value

use crate::error::{Result, TabsnapError};
use crate::indexer::{Record, RowIndexer};
use crate::table::Table;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the builder reacts to a malformed row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Abort on the first malformed row
    #[default]
    Strict,
    /// Log the malformed row, record it in the report and continue
    #[serde(alias = "skip_and_report")]
    Skip,
}

/// A body row left out under [`RowPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the table, counting the header as line 1
    pub line: usize,
    pub reason: String,
}

/// Records grouped by key, keys in first-encounter order
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeyedTable {
    key_column: String,
    buckets: IndexMap<String, Vec<Record>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedRow>,
}

impl KeyedTable {
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.buckets
            .iter()
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of records across all keys
    pub fn record_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }
}

/// Builds [`KeyedTable`]s from header-led tables
#[derive(Debug, Clone, Default)]
pub struct KeyedTableBuilder {
    policy: RowPolicy,
}

impl KeyedTableBuilder {
    pub fn new(policy: RowPolicy) -> Self {
        Self { policy }
    }

    /// Group every body row of `table` under its `key_column` value.
    ///
    /// Columns missing from the header fail regardless of policy; only row
    /// defects are eligible for skipping.
    pub fn build<S: AsRef<str>>(
        &self,
        table: &Table,
        key_column: &str,
        value_columns: &[S],
    ) -> Result<KeyedTable> {
        let header = table.header()?;
        let key_position = header
            .position(key_column)
            .ok_or_else(|| TabsnapError::column_not_found(key_column))?;
        let value_positions = RowIndexer::resolve(&header, value_columns)?;

        let mut keyed = KeyedTable {
            key_column: key_column.to_string(),
            ..Default::default()
        };

        for (index, row) in table.body().iter().enumerate() {
            let line = index + 2;
            let outcome = row
                .get(key_position)
                .ok_or_else(|| TabsnapError::RowTooShort {
                    column: key_column.to_string(),
                    position: key_position,
                    row_len: row.len(),
                })
                .and_then(|key| {
                    RowIndexer::extract_resolved(row, value_columns, &value_positions)
                        .map(|record| (key, record))
                });

            match outcome {
                Ok((key, record)) => {
                    keyed.buckets.entry(key.clone()).or_default().push(record);
                }
                Err(e) if self.policy == RowPolicy::Skip && e.is_row_defect() => {
                    log::warn!("Skipping line {line} of table: {e}");
                    keyed.skipped.push(SkippedRow {
                        line,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!(
            "Grouped {} records under {} keys of column '{}'",
            keyed.record_count(),
            keyed.len(),
            key_column
        );

        Ok(keyed)
    }
}
