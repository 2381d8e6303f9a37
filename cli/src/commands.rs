//! Command implementations for tabsnap CLI

use crate::cli::{Cli, Commands, ConfigCommand, SourceArgs};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::FetchProgress;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabsnap_core::config::{self, Config};
use tabsnap_core::error::{Result, TabsnapError};
use tabsnap_core::naming::SnapshotNamer;
use tabsnap_core::{
    CacheEntry, CsvWorkbookSource, KeyedTableBuilder, MarkupTableParser, RowPolicy, SheetReader,
    SnapshotStore, SourceIdentity, Table, TableComparator,
};

/// Everything a command needs: settings, the cached reader and the snapshot store
struct Session {
    config: Config,
    reader: SheetReader<CsvWorkbookSource>,
    store: SnapshotStore,
}

impl Session {
    fn open(workspace_path: Option<&Path>, root_override: Option<&Path>) -> Result<Self> {
        let workspace = match workspace_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let config = config::get_config_in(Some(&workspace))?;

        let source_root = match root_override {
            Some(root) => root.to_path_buf(),
            None => resolve(&workspace, &config.source.root),
        };
        let source = CsvWorkbookSource::new(source_root);
        let store = SnapshotStore::new(resolve(&workspace, &config.snapshot.workspace_dir));
        log::debug!(
            "Workbooks under {}, snapshots under {}",
            source.root().display(),
            store.root().display()
        );

        let reader = SheetReader::with_filter(source, config.source.row_filter());

        Ok(Self {
            config,
            reader,
            store,
        })
    }

    /// Read a sheet through the cache, with a spinner for human output
    fn read(
        &mut self,
        identity: &SourceIdentity,
        show_progress: bool,
    ) -> Result<(Arc<Table>, CacheEntry)> {
        let message = format!("Reading {identity}...");
        let mut progress = FetchProgress::start(&message, show_progress);
        let rows = self.reader.read(identity, false)?;
        let entry = self
            .reader
            .cache()
            .entry(identity)
            .cloned()
            .ok_or_else(|| {
                TabsnapError::invalid_input(format!("No cache entry for {identity}"))
            })?;
        progress.finish(&format!("✅ Read {} rows of '{}'", rows.len(), entry.subtitle));
        Ok((rows, entry))
    }

    fn policy(&self, lenient: bool) -> RowPolicy {
        if lenient {
            RowPolicy::Skip
        } else {
            self.config.keyed.policy
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

fn identity(source: &SourceArgs) -> SourceIdentity {
    SourceIdentity::new(source.document.clone(), source.sheet.clone())
}

/// Execute a command
pub fn execute_command(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.as_deref();
    let root = cli.root.as_deref();

    match cli.command {
        Commands::Fetch { source, json } => {
            fetch_command(&mut Session::open(workspace, root)?, &source, json)
        }
        Commands::Group {
            source,
            key,
            columns,
            lenient,
            json,
        } => group_command(
            &mut Session::open(workspace, root)?,
            &source,
            &key,
            &columns,
            lenient,
            json,
        ),
        Commands::Snapshot { source, name } => {
            snapshot_command(&mut Session::open(workspace, root)?, &source, name.as_deref())
        }
        Commands::Status {
            source,
            key,
            compare_to,
            quiet,
            json,
        } => status_command(
            &mut Session::open(workspace, root)?,
            &source,
            &key,
            compare_to.as_deref(),
            quiet,
            json,
        ),
        Commands::List { source, json } => {
            list_command(&Session::open(workspace, root)?, &source, json)
        }
        Commands::Diff {
            source,
            from,
            to,
            key,
            json,
        } => diff_command(&Session::open(workspace, root)?, &source, &from, &to, &key, json),
        Commands::Markup {
            file,
            encoding,
            key,
            columns,
            json,
        } => markup_command(
            &Session::open(workspace, root)?,
            &file,
            &encoding,
            key.as_deref(),
            &columns,
            json,
        ),
        Commands::Config { command } => config_command(workspace, &command),
    }
}

fn fetch_command(session: &mut Session, source: &SourceArgs, json: bool) -> Result<()> {
    let identity = identity(source);
    let (rows, entry) = session.read(&identity, !json)?;

    if json {
        println!("{}", JsonFormatter::format_table(&entry.title, &entry.subtitle, &rows)?);
    } else {
        PrettyPrinter::print_table(&entry.title, &entry.subtitle, &rows);
    }
    Ok(())
}

fn group_command(
    session: &mut Session,
    source: &SourceArgs,
    key: &str,
    columns: &[String],
    lenient: bool,
    json: bool,
) -> Result<()> {
    let identity = identity(source);
    let policy = session.policy(lenient);
    session.read(&identity, !json)?;
    let keyed = session.reader.keyed(&identity, key, columns, policy)?;

    if json {
        println!("{}", JsonFormatter::format(&keyed)?);
    } else {
        PrettyPrinter::print_keyed(&keyed);
    }
    Ok(())
}

fn snapshot_command(session: &mut Session, source: &SourceArgs, name: Option<&str>) -> Result<()> {
    let identity = identity(source);
    let (_, entry) = session.read(&identity, true)?;

    let name = match name {
        Some(name) => name.to_string(),
        None => {
            let existing = session.store.names(&identity)?;
            SnapshotNamer::new(session.config.snapshot.default_name_pattern.clone())
                .generate_name(&identity, &existing)
        }
    };

    let metadata = session.store.save(&identity, &name, &entry)?;
    println!(
        "✅ Snapshot '{}' of '{} / {}' saved ({} rows)",
        metadata.name, metadata.title, metadata.subtitle, metadata.row_count
    );
    println!("   Fingerprint: {}", metadata.fingerprint);
    Ok(())
}

fn status_command(
    session: &mut Session,
    source: &SourceArgs,
    key: &str,
    compare_to: Option<&str>,
    quiet: bool,
    json: bool,
) -> Result<()> {
    let identity = identity(source);
    let baseline = match compare_to {
        Some(name) => session.store.load(&identity, name)?,
        None => session
            .store
            .latest(&identity)?
            .ok_or_else(|| TabsnapError::SnapshotNotFound {
                name: format!("latest for {identity}"),
            })?,
    };

    let (current, entry) = session.read(&identity, !json && !quiet)?;
    if entry.fingerprint == baseline.metadata.fingerprint {
        log::info!("Content of {identity} is identical to '{}'", baseline.metadata.name);
    }
    let changes = TableComparator::compare(&baseline.rows, &current, key)?;

    if json {
        println!("{}", JsonFormatter::format(&changes)?);
    } else {
        PrettyPrinter::print_table_changes(&changes, &baseline.metadata.name, "current", quiet);
        if changes.has_changes() && !quiet {
            println!();
            println!("🟡 You may want to run:");
            println!("  tabsnap snapshot {} --name <new_version>", source.document);
        }
    }
    Ok(())
}

fn list_command(session: &Session, source: &SourceArgs, json: bool) -> Result<()> {
    let snapshots = session.store.list(&identity(source))?;
    if json {
        println!("{}", JsonFormatter::format(&snapshots)?);
    } else {
        PrettyPrinter::print_snapshot_list(&snapshots);
    }
    Ok(())
}

fn diff_command(
    session: &Session,
    source: &SourceArgs,
    from: &str,
    to: &str,
    key: &str,
    json: bool,
) -> Result<()> {
    let identity = identity(source);
    let old = session.store.load(&identity, from)?;
    let new = session.store.load(&identity, to)?;
    let changes = TableComparator::compare(&old.rows, &new.rows, key)?;

    if json {
        println!("{}", JsonFormatter::format(&changes)?);
    } else {
        PrettyPrinter::print_table_changes(&changes, from, to, false);
    }
    Ok(())
}

fn markup_command(
    session: &Session,
    file: &Path,
    encoding: &str,
    key: Option<&str>,
    columns: &[String],
    json: bool,
) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let table = MarkupTableParser::parse(&bytes, encoding)?;
    let title = file.display().to_string();

    match key {
        Some(key) => {
            let keyed = KeyedTableBuilder::new(session.config.keyed.policy)
                .build(&table, key, columns)?;
            if json {
                println!("{}", JsonFormatter::format(&keyed)?);
            } else {
                PrettyPrinter::print_keyed(&keyed);
            }
        }
        None if json => println!("{}", JsonFormatter::format_table(&title, "table", &table)?),
        None => PrettyPrinter::print_table(&title, "table", &table),
    }
    Ok(())
}

fn config_command(workspace_path: Option<&Path>, command: &ConfigCommand) -> Result<()> {
    let config = config::get_config_in(workspace_path)?;
    match command {
        ConfigCommand::Show => {
            let text = toml::to_string_pretty(&config).map_err(anyhow::Error::from)?;
            println!("{text}");
        }
        ConfigCommand::Save => {
            let path = config::save_config(&config)?;
            println!("✅ Configuration saved to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run(workspace: &Path, args: &[&str]) -> Result<()> {
        let mut argv = vec!["tabsnap", "--workspace", workspace.to_str().unwrap()];
        argv.extend_from_slice(args);
        execute_command(Cli::parse_from(argv))
    }

    /// Pin the workspace settings so no global config leaks in
    fn write_local_config(workspace: &Path) {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        std::fs::write(workspace.join(config::LOCAL_CONFIG_FILE), text).unwrap();
    }

    fn write_sheet(workspace: &Path, content: &str) {
        let dir = workspace.join("cursos");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("altas.csv"), content).unwrap();
    }

    #[test]
    fn test_snapshot_then_diff_workflow() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path();
        write_local_config(workspace);

        write_sheet(workspace, "Pasaporte,Curso\n123,A\n");
        run(workspace, &["snapshot", "cursos", "--name", "v1"]).unwrap();
        write_sheet(workspace, "Pasaporte,Curso\n123,B\n456,A\n");
        run(workspace, &["snapshot", "cursos", "--name", "v2"]).unwrap();

        let session = Session::open(Some(workspace), None).unwrap();
        assert_eq!(session.store.root(), workspace.join(".tabsnap"));
        let identity = SourceIdentity::document("cursos");
        assert_eq!(session.store.names(&identity).unwrap().len(), 2);

        run(workspace, &["diff", "cursos", "v1", "v2", "--key", "Pasaporte", "--json"]).unwrap();
        run(workspace, &["status", "cursos", "--key", "Pasaporte", "--quiet"]).unwrap();
    }

    #[test]
    fn test_status_without_snapshot_fails() {
        let temp = TempDir::new().unwrap();
        write_local_config(temp.path());
        write_sheet(temp.path(), "Pasaporte\n123\n");

        let err = run(temp.path(), &["status", "cursos", "--key", "Pasaporte"]).unwrap_err();
        assert!(matches!(err, TabsnapError::SnapshotNotFound { .. }));
    }

    #[test]
    fn test_default_snapshot_names_increment() {
        let temp = TempDir::new().unwrap();
        write_local_config(temp.path());
        write_sheet(temp.path(), "k,v\n1,a\n");

        run(temp.path(), &["snapshot", "cursos", "--sheet", "altas"]).unwrap();
        run(temp.path(), &["snapshot", "cursos", "--sheet", "altas"]).unwrap();

        let session = Session::open(Some(temp.path()), None).unwrap();
        let mut names = session
            .store
            .names(&SourceIdentity::sheet("cursos", "altas"))
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["altas_1", "altas_2"]);
    }
}
