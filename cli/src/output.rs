//! Output formatting utilities

use serde::Serialize;
use tabsnap_core::compare::{HeaderChanges, TableChanges};
use tabsnap_core::error::Result;
use tabsnap_core::keyed::KeyedTable;
use tabsnap_core::store::SnapshotMetadata;
use tabsnap_core::table::Table;

/// Number of sample entries shown per section before eliding
const SAMPLE: usize = 3;

/// Pretty printer for tabsnap output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a table as tab separated lines
    pub fn print_table(title: &str, subtitle: &str, table: &Table) {
        println!("📄 {title} / {subtitle} ({} rows)", table.len());
        for row in table.rows() {
            println!("{}", row.join("\t"));
        }
    }

    /// Print records grouped by key
    pub fn print_keyed(keyed: &KeyedTable) {
        println!(
            "🔑 {} keys, {} records by '{}'",
            keyed.len(),
            keyed.record_count(),
            keyed.key_column()
        );
        for (i, (key, records)) in keyed.iter().enumerate() {
            let prefix = tree_prefix(i, keyed.len());
            println!("{prefix} {key} ({} records)", records.len());
            for record in records {
                let cells: Vec<String> = record.iter().map(|(c, v)| format!("{c}={v}")).collect();
                let indent = if i + 1 == keyed.len() { "   " } else { "│  " };
                println!("{indent}└─ {}", cells.join(", "));
            }
        }

        if !keyed.skipped().is_empty() {
            println!("⚠️  Skipped rows: {}", keyed.skipped().len());
            for skipped in keyed.skipped() {
                println!("   └─ line {}: {}", skipped.line, skipped.reason);
            }
        }
    }

    /// Print snapshot list
    pub fn print_snapshot_list(snapshots: &[SnapshotMetadata]) {
        if snapshots.is_empty() {
            println!("No snapshots found.");
            return;
        }

        println!("📸 Available Snapshots:");
        for (i, snapshot) in snapshots.iter().enumerate() {
            println!(
                "{} {} ({} rows, {})",
                tree_prefix(i, snapshots.len()),
                snapshot.name,
                snapshot.row_count,
                snapshot.created.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    /// Print the result of comparing two versions of a table
    pub fn print_table_changes(changes: &TableChanges, from: &str, to: &str, quiet: bool) {
        if quiet {
            println!("header_changed={}", changes.header.has_changes());
            println!("rows_changed={}", changes.total_changes());
            return;
        }

        println!("🔍 Diff Results: {from} → {to}");

        if changes.header.has_changes() {
            println!("├─ ❌ Header: CHANGED");
            Self::print_header_changes(&changes.header, "│  ");
        } else {
            println!("├─ ✅ Header: unchanged");
        }

        if !changes.modified.is_empty() {
            println!("├─ Modified rows: {}", changes.modified.len());
            for modification in changes.modified.iter().take(SAMPLE) {
                println!("│  ├─ {}: {}", changes.key_column, modification.key);
                for line in &modification.explanation {
                    println!("│  │  └─ {line}");
                }
            }
            print_elided("│  ", changes.modified.len());
        }

        if !changes.added.is_empty() {
            println!("├─ Added keys: {}", sample(&changes.added));
        }

        if !changes.removed.is_empty() {
            println!("├─ Removed keys: {}", sample(&changes.removed));
        }

        if changes.has_changes() {
            println!("└─ ❌ Rows changed: {}", changes.total_changes());
        } else {
            println!("└─ ✅ Rows: unchanged");
        }
    }

    fn print_header_changes(header: &HeaderChanges, prefix: &str) {
        if !header.renamed.is_empty() {
            println!("{prefix}├─ Renamed: {}", header.renamed.join(", "));
        }
        if !header.added.is_empty() {
            println!("{prefix}├─ Columns added: {}", header.added.join(", "));
        }
        if !header.removed.is_empty() {
            println!("{prefix}└─ Columns removed: {}", header.removed.join(", "));
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    pub fn format_table(title: &str, subtitle: &str, table: &Table) -> Result<String> {
        let json = serde_json::json!({
            "title": title,
            "subtitle": subtitle,
            "rows": table,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}

fn tree_prefix(index: usize, len: usize) -> &'static str {
    if index + 1 == len {
        "└─"
    } else {
        "├─"
    }
}

fn sample(keys: &[String]) -> String {
    let shown: Vec<&str> = keys.iter().take(SAMPLE).map(String::as_str).collect();
    let more = if keys.len() > SAMPLE { ", ..." } else { "" };
    format!("{} ({}{more})", keys.len(), shown.join(", "))
}

fn print_elided(prefix: &str, total: usize) {
    if total > SAMPLE {
        println!("{prefix}└─ ... and {} more", total - SAMPLE);
    }
}
