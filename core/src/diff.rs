//! Positional change detection between two versions of a row

use crate::error::{Result, TabsnapError};
use crate::table::Header;
use serde::Serialize;
use std::collections::BTreeMap;

/// A changed cell: value before and after
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellChange {
    pub old: String,
    pub new: String,
}

/// Sparse map of differing positions, iterated in ascending position order.
///
/// Never holds a pair of equal values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffMap {
    changes: BTreeMap<usize, CellChange>,
}

impl DiffMap {
    pub fn get(&self, position: usize) -> Option<&CellChange> {
        self.changes.get(&position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CellChange)> {
        self.changes.iter().map(|(position, change)| (*position, change))
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Computes and renders cell-level differences between row versions
pub struct RowDiffEngine;

impl RowDiffEngine {
    /// Positions where `new_row` differs from `old_row`.
    ///
    /// Only the first `new_row.len()` positions are compared; cells that
    /// exist only in `old_row` are never reported. Comparison is exact.
    pub fn diff(new_row: &[String], old_row: &[String]) -> Result<DiffMap> {
        if new_row.len() > old_row.len() {
            return Err(TabsnapError::SchemaShrink {
                new_len: new_row.len(),
                old_len: old_row.len(),
            });
        }

        let changes = new_row
            .iter()
            .zip(old_row)
            .enumerate()
            .filter(|(_, (new, old))| new != old)
            .map(|(position, (new, old))| {
                (
                    position,
                    CellChange {
                        old: old.clone(),
                        new: new.clone(),
                    },
                )
            })
            .collect();

        Ok(DiffMap { changes })
    }

    /// Render each change as `"<column>: <old> -> <new>"`
    pub fn explain(header: &Header, changes: &DiffMap) -> Result<Vec<String>> {
        changes
            .iter()
            .map(|(position, change)| {
                let column = header
                    .name(position)
                    .ok_or_else(|| TabsnapError::column_not_found(format!("#{position}")))?;
                Ok(format!("{column}: {} -> {}", change.old, change.new))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_single_changed_cell() {
        let old = row(&["a", "1", "x"]);
        let new = row(&["a", "2", "x"]);
        let changes = RowDiffEngine::diff(&new, &old).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes.get(1),
            Some(&CellChange {
                old: "1".to_string(),
                new: "2".to_string()
            })
        );

        let header: Header = ["Name", "Count", "Tag"].into_iter().collect();
        assert_eq!(
            RowDiffEngine::explain(&header, &changes).unwrap(),
            vec!["Count: 1 -> 2"]
        );
    }

    #[test]
    fn test_identical_rows_have_no_diff() {
        let r = row(&["x", "", "Zoë"]);
        assert!(RowDiffEngine::diff(&r, &r).unwrap().is_empty());
        assert!(RowDiffEngine::diff(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_longer_new_row_is_rejected() {
        let err = RowDiffEngine::diff(&row(&["a", "b", "c"]), &row(&["a", "b"])).unwrap_err();
        assert!(matches!(
            err,
            TabsnapError::SchemaShrink {
                new_len: 3,
                old_len: 2
            }
        ));
    }

    #[test]
    fn test_extra_old_cells_are_ignored() {
        let changes = RowDiffEngine::diff(&row(&["a"]), &row(&["b", "gone", "also gone"])).unwrap();
        assert_eq!(changes.positions().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_comparison_is_exact() {
        let changes = RowDiffEngine::diff(&row(&["Ana ", "ana"]), &row(&["Ana", "Ana"])).unwrap();
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_explain_in_position_order() {
        let old = row(&["1", "2", "3", "4"]);
        let new = row(&["9", "2", "8", "4"]);
        let header: Header = ["a", "b", "c", "d"].into_iter().collect();
        let changes = RowDiffEngine::diff(&new, &old).unwrap();
        let lines = RowDiffEngine::explain(&header, &changes).unwrap();
        assert_eq!(lines, vec!["a: 1 -> 9", "c: 3 -> 8"]);
    }

    #[test]
    fn test_explain_with_short_header() {
        let changes = RowDiffEngine::diff(&row(&["a", "b"]), &row(&["a", "c"])).unwrap();
        let header: Header = ["only"].into_iter().collect();
        let err = RowDiffEngine::explain(&header, &changes).unwrap_err();
        assert!(matches!(err, TabsnapError::ColumnNotFound { ref column } if column == "#1"));
    }

    #[test]
    fn test_reported_changes_reproduce_cells() {
        let old = row(&["Ana", "10", "Norte", "activo"]);
        let new = row(&["Ana", "12", "Sur", "activo"]);
        let changes = RowDiffEngine::diff(&new, &old).unwrap();

        let mut rebuilt_old = new.clone();
        for (position, change) in changes.iter() {
            assert_eq!(new[position], change.new);
            rebuilt_old[position] = change.old.clone();
        }
        assert_eq!(rebuilt_old, old);
    }
}
