//! Error types for tabsnap operations

use thiserror::Error;

/// Result alias used throughout the core
pub type Result<T> = std::result::Result<T, TabsnapError>;

/// Errors surfaced by the tabsnap core
#[derive(Debug, Error)]
pub enum TabsnapError {
    /// A requested column is absent from the header
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A row is too short to hold a resolved column position
    #[error("Row has {row_len} cells but column '{column}' is at position {position}")]
    RowTooShort {
        column: String,
        position: usize,
        row_len: usize,
    },

    /// The newer row version has more cells than the older one
    #[error("New row has {new_len} cells but old row only has {old_len}")]
    SchemaShrink { new_len: usize, old_len: usize },

    /// Opaque failure from a fetcher or writer
    #[error("Source error: {0}")]
    Source(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Markup error: {message}")]
    Markup { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Snapshot not found: {name}")]
    SnapshotNotFound { name: String },
}

impl TabsnapError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup {
            message: message.into(),
        }
    }

    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Whether this error describes a single malformed row rather than a
    /// problem with the table as a whole
    pub fn is_row_defect(&self) -> bool {
        matches!(self, Self::RowTooShort { .. })
    }
}
