//! Common test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory of CSV workbooks
pub struct TestWorkbooks {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestWorkbooks {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    /// Write `content` as sheet `sheet` of workbook `document`
    pub fn write_sheet(&self, document: &str, sheet: &str, content: &str) -> PathBuf {
        let dir = self.root.join(document);
        fs::create_dir_all(&dir).expect("Failed to create workbook directory");
        let path = dir.join(format!("{sheet}.csv"));
        fs::write(&path, content).expect("Failed to write sheet");
        path
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory for snapshots, inside the temp dir
    pub fn snapshot_dir(&self) -> PathBuf {
        self.root.join(".tabsnap")
    }
}

/// Enrollment sheet with a repeated passport, a blank row and a short row
pub const ENROLLMENT_CSV: &str = "\
Pasaporte,Nombre,Correo
123,Ana,a@x
456,Beto,b@y
,,
123,Ana,ana@z
789,Caro
";

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
