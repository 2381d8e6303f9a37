//! Command-line interface for tabsnap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabsnap")]
#[command(about = "Cache, group and diff spreadsheet-like tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location (where tabsnap.toml and snapshots live)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Override the directory holding CSV workbooks
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which table to read
#[derive(Args, Clone)]
pub struct SourceArgs {
    /// Document id (workbook directory under the source root)
    pub document: String,

    /// Sheet name (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a sheet and print its rows
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Group a sheet's rows by a key column
    Group {
        #[command(flatten)]
        source: SourceArgs,

        /// Column whose value keys the groups
        #[arg(long)]
        key: String,

        /// Columns to keep in each record (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Skip and report malformed rows instead of failing
        #[arg(long)]
        lenient: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store the current content of a sheet as a named snapshot
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,

        /// Name for the snapshot (defaults to the configured pattern)
        #[arg(long)]
        name: Option<String>,
    },

    /// Compare the current content of a sheet against a snapshot
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// Column identifying rows across versions
        #[arg(long)]
        key: String,

        /// Snapshot to compare against (defaults to latest)
        #[arg(long)]
        compare_to: Option<String>,

        /// Quiet output (machine-readable)
        #[arg(long)]
        quiet: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored snapshots of a sheet
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two stored snapshots of a sheet
    Diff {
        #[command(flatten)]
        source: SourceArgs,

        /// Older snapshot
        from: String,

        /// Newer snapshot
        to: String,

        /// Column identifying rows across versions
        #[arg(long)]
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the table of an HTML/XML listing file
    Markup {
        /// Listing file
        file: PathBuf,

        /// Character encoding of the file
        #[arg(long, default_value = "utf-8")]
        encoding: String,

        /// Group rows by this column instead of printing them
        #[arg(long)]
        key: Option<String>,

        /// Columns to keep when grouping (comma separated)
        #[arg(long, value_delimiter = ',', requires = "key")]
        columns: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect tabsnap settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write the effective configuration to the global config file
    Save,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_group_columns_are_split() {
        let cli = Cli::parse_from([
            "tabsnap", "group", "cursos", "--key", "Pasaporte", "--columns", "Correo,Nombre",
        ]);
        match cli.command {
            Commands::Group { key, columns, source, .. } => {
                assert_eq!(key, "Pasaporte");
                assert_eq!(columns, vec!["Correo", "Nombre"]);
                assert_eq!(source.document, "cursos");
                assert!(source.sheet.is_none());
            }
            _ => panic!("expected group command"),
        }
    }
}
