//! Keyed comparison of two snapshots of the same table

use crate::diff::{DiffMap, RowDiffEngine};
use crate::error::{Result, TabsnapError};
use crate::table::{Row, Table};
use indexmap::IndexMap;
use serde::Serialize;

/// Header-level differences
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeaderChanges {
    /// Columns renamed within the shared prefix of both headers
    pub renamed: Vec<String>,
    /// Columns appended in the newer header
    pub added: Vec<String>,
    /// Columns dropped from the end of the newer header
    pub removed: Vec<String>,
}

impl HeaderChanges {
    pub fn has_changes(&self) -> bool {
        !self.renamed.is_empty() || !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// A key present in both snapshots whose row changed
#[derive(Debug, Clone, Serialize)]
pub struct RowModification {
    pub key: String,
    pub changes: DiffMap,
    pub explanation: Vec<String>,
}

/// Full result of comparing two table snapshots
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableChanges {
    pub key_column: String,
    pub header: HeaderChanges,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<RowModification>,
}

impl TableChanges {
    pub fn has_changes(&self) -> bool {
        self.header.has_changes()
            || !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.modified.is_empty()
    }

    /// Number of changed rows
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Compares snapshots row by row, matching rows on a key column
pub struct TableComparator;

impl TableComparator {
    /// Compare `new` against `old`, matching rows on `key_column`.
    ///
    /// Cells are compared positionally over the prefix shared by both rows;
    /// appended columns show up in [`HeaderChanges::added`] only.
    pub fn compare(old: &Table, new: &Table, key_column: &str) -> Result<TableChanges> {
        let old_header = old.header()?;
        let new_header = new.header()?;

        let old_key = old_header
            .position(key_column)
            .ok_or_else(|| TabsnapError::column_not_found(key_column))?;
        let new_key = new_header
            .position(key_column)
            .ok_or_else(|| TabsnapError::column_not_found(key_column))?;

        let header = Self::compare_headers(old_header.names(), new_header.names())?;

        let old_rows = Self::index_by_key(old.body(), old_key);
        let new_rows = Self::index_by_key(new.body(), new_key);

        let mut changes = TableChanges {
            key_column: key_column.to_string(),
            header,
            ..Default::default()
        };

        for (key, new_row) in &new_rows {
            let Some(old_row) = old_rows.get(key) else {
                changes.added.push(key.clone());
                continue;
            };

            let shared = new_row.len().min(old_row.len());
            let diff = RowDiffEngine::diff(&new_row[..shared], old_row)?;
            if diff.is_empty() {
                continue;
            }

            let explanation = RowDiffEngine::explain(&old_header, &diff).or_else(|_| {
                // Old row wider than its header: fall back to the newer names
                RowDiffEngine::explain(&new_header, &diff)
            })?;
            changes.modified.push(RowModification {
                key: key.clone(),
                changes: diff,
                explanation,
            });
        }

        changes.removed = old_rows
            .keys()
            .filter(|key| !new_rows.contains_key(*key))
            .cloned()
            .collect();

        log::debug!(
            "Compared snapshots on '{}': {} added, {} removed, {} modified",
            key_column,
            changes.added.len(),
            changes.removed.len(),
            changes.modified.len()
        );

        Ok(changes)
    }

    fn compare_headers(old: &[String], new: &[String]) -> Result<HeaderChanges> {
        let shared = old.len().min(new.len());
        let renamed = RowDiffEngine::diff(&new[..shared], &old[..shared])?
            .iter()
            .map(|(_, change)| format!("{} -> {}", change.old, change.new))
            .collect();

        Ok(HeaderChanges {
            renamed,
            added: new[shared..].to_vec(),
            removed: old[shared..].to_vec(),
        })
    }

    /// First row per key; rows too short to hold the key are ignored
    fn index_by_key(rows: &[Row], key_position: usize) -> IndexMap<String, &Row> {
        let mut indexed: IndexMap<String, &Row> = IndexMap::with_capacity(rows.len());
        for row in rows {
            match row.get(key_position) {
                Some(key) if indexed.contains_key(key) => {
                    log::debug!("Ignoring repeated key '{key}' during comparison");
                }
                Some(key) => {
                    indexed.insert(key.clone(), row);
                }
                None => log::warn!("Row without key cell ignored during comparison: {row:?}"),
            }
        }
        indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_removed_modified() {
        let old = Table::from_cells(vec![
            vec!["id", "name", "city"],
            vec!["1", "Ana", "Rosario"],
            vec!["2", "Beto", "Salta"],
            vec!["3", "Caro", "Jujuy"],
        ]);
        let new = Table::from_cells(vec![
            vec!["id", "name", "city"],
            vec!["1", "Ana", "Rosario"],
            vec!["3", "Caro", "Tucumán"],
            vec!["4", "Dani", "Neuquén"],
        ]);

        let changes = TableComparator::compare(&old, &new, "id").unwrap();
        assert!(changes.has_changes());
        assert!(!changes.header.has_changes());
        assert_eq!(changes.added, vec!["4"]);
        assert_eq!(changes.removed, vec!["2"]);
        assert_eq!(changes.modified.len(), 1);
        assert_eq!(changes.modified[0].key, "3");
        assert_eq!(changes.modified[0].explanation, vec!["city: Jujuy -> Tucumán"]);
        assert_eq!(changes.total_changes(), 3);
    }

    #[test]
    fn test_appended_column_is_header_change_only() {
        let old = Table::from_cells(vec![vec!["id", "name"], vec!["1", "Ana"]]);
        let new = Table::from_cells(vec![vec!["id", "name", "mail"], vec!["1", "Ana", "a@x"]]);

        let changes = TableComparator::compare(&old, &new, "id").unwrap();
        assert_eq!(changes.header.added, vec!["mail"]);
        assert!(changes.modified.is_empty());
        assert_eq!(changes.total_changes(), 0);
    }

    #[test]
    fn test_identical_tables() {
        let table = Table::from_cells(vec![vec!["id", "v"], vec!["1", "x"], vec!["2", "y"]]);
        let changes = TableComparator::compare(&table, &table, "id").unwrap();
        assert!(!changes.has_changes());
    }

    #[test]
    fn test_missing_key_column() {
        let table = Table::from_cells(vec![vec!["id"], vec!["1"]]);
        assert!(matches!(
            TableComparator::compare(&table, &table, "code"),
            Err(TabsnapError::ColumnNotFound { .. })
        ));
    }
}
