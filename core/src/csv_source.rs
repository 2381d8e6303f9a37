//! Local workbook stand-in: a directory of CSV files, one per sheet

use crate::cache::{FetchedTable, SourceIdentity};
use crate::error::{Result, TabsnapError};
use crate::source::{TableFetcher, TableWriter};
use crate::table::{Row, Table};
use std::fs;
use std::path::{Path, PathBuf};

const SHEET_EXTENSION: &str = "csv";
const DEFAULT_SHEET: &str = "Sheet1";

/// Treats `<root>/<document_id>/` as a workbook whose sheets are `*.csv` files
#[derive(Debug, Clone)]
pub struct CsvWorkbookSource {
    root: PathBuf,
}

impl CsvWorkbookSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workbook_dir(&self, identity: &SourceIdentity) -> PathBuf {
        self.root.join(&identity.document_id)
    }

    /// Sheet names of a workbook in file-name order
    pub fn sheet_names(&self, identity: &SourceIdentity) -> Result<Vec<String>> {
        let dir = self.workbook_dir(identity);
        if !dir.is_dir() {
            return Err(TabsnapError::invalid_input(format!(
                "Workbook directory not found: {}",
                dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_sheet = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SHEET_EXTENSION));
            if !is_sheet {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn sheet_path(&self, identity: &SourceIdentity, sheet: &str) -> PathBuf {
        self.workbook_dir(identity)
            .join(format!("{sheet}.{SHEET_EXTENSION}"))
    }

    fn workbook_title(&self, identity: &SourceIdentity) -> String {
        self.workbook_dir(identity)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(identity.document_id.as_str())
            .to_string()
    }
}

impl TableFetcher for CsvWorkbookSource {
    fn fetch(&self, identity: &SourceIdentity) -> Result<FetchedTable> {
        let sheet = match &identity.sheet {
            Some(sheet) => sheet.clone(),
            None => self
                .sheet_names(identity)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    TabsnapError::invalid_input(format!("Workbook '{identity}' has no sheets"))
                })?,
        };

        let path = self.sheet_path(identity, &sheet);
        log::debug!("Reading sheet from {}", path.display());
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows: Vec<Row> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(FetchedTable::new(
            self.workbook_title(identity),
            sheet,
            Table::new(rows),
        ))
    }
}

impl TableWriter for CsvWorkbookSource {
    fn write(&self, identity: &SourceIdentity, rows: &Table) -> Result<()> {
        let dir = self.workbook_dir(identity);
        fs::create_dir_all(&dir)?;

        let sheet = match &identity.sheet {
            Some(sheet) => sheet.clone(),
            None => self
                .sheet_names(identity)?
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_SHEET.to_string()),
        };

        let path = self.sheet_path(identity, &sheet);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)?;
        for row in rows.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workbook() -> (TempDir, CsvWorkbookSource) {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("inscripciones");
        fs::create_dir_all(&book).unwrap();
        fs::write(book.join("b_bajas.csv"), "Pasaporte,Motivo\n9,viaje\n").unwrap();
        fs::write(book.join("a_altas.csv"), "Pasaporte,Correo\n123,a@x\n456\n").unwrap();
        fs::write(book.join("notas.txt"), "not a sheet").unwrap();
        let source = CsvWorkbookSource::new(temp.path());
        (temp, source)
    }

    #[test]
    fn test_first_sheet_by_default() {
        let (_temp, source) = workbook();
        let fetched = source.fetch(&SourceIdentity::document("inscripciones")).unwrap();
        assert_eq!(fetched.title, "inscripciones");
        assert_eq!(fetched.subtitle, "a_altas");
        assert_eq!(fetched.rows.len(), 3);
        // short rows survive untouched
        assert_eq!(fetched.rows.body()[1], vec!["456".to_string()]);
    }

    #[test]
    fn test_named_sheet() {
        let (_temp, source) = workbook();
        let fetched = source
            .fetch(&SourceIdentity::sheet("inscripciones", "b_bajas"))
            .unwrap();
        assert_eq!(fetched.rows.body()[0], vec!["9", "viaje"]);
    }

    #[test]
    fn test_missing_workbook() {
        let (_temp, source) = workbook();
        assert!(source.fetch(&SourceIdentity::document("nada")).is_err());
    }

    #[test]
    fn test_write_then_fetch() {
        let (_temp, source) = workbook();
        let id = SourceIdentity::sheet("inscripciones", "c_nueva");
        let rows = Table::from_cells(vec![vec!["x", "y"], vec!["1, con coma", "2"]]);
        source.write(&id, &rows).unwrap();

        assert_eq!(source.fetch(&id).unwrap().rows, rows);
        assert_eq!(
            source.sheet_names(&SourceIdentity::document("inscripciones")).unwrap(),
            vec!["a_altas", "b_bajas", "c_nueva"]
        );
    }
}
