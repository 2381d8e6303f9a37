//! On-disk snapshots of fetched tables, used to compare across runs

use crate::cache::{CacheEntry, SourceIdentity};
use crate::error::{Result, TabsnapError};
use crate::naming::sanitize;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SOURCES_DIR: &str = "sources";
const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub name: String,
    pub identity: SourceIdentity,
    pub title: String,
    pub subtitle: String,
    pub created: DateTime<Utc>,
    pub fingerprint: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub metadata: SnapshotMetadata,
    pub rows: Table,
}

/// Snapshot files under `<root>/sources/<identity>/<name>.json`
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_dir(&self, identity: &SourceIdentity) -> PathBuf {
        // The hash keeps identities that sanitize alike apart
        let digest = blake3::hash(identity.to_string().as_bytes()).to_hex();
        let slug = format!("{}_{}", sanitize(&identity.to_string()), &digest.as_str()[..8]);
        self.root.join(SOURCES_DIR).join(slug)
    }

    fn snapshot_path(&self, identity: &SourceIdentity, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(TabsnapError::invalid_input(format!(
                "Invalid snapshot name: '{name}'"
            )));
        }
        Ok(self
            .source_dir(identity)
            .join(format!("{name}.{SNAPSHOT_EXTENSION}")))
    }

    /// Persist a cached entry under `name`, replacing a snapshot of that name
    pub fn save(
        &self,
        identity: &SourceIdentity,
        name: &str,
        entry: &CacheEntry,
    ) -> Result<SnapshotMetadata> {
        let path = self.snapshot_path(identity, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let snapshot = StoredSnapshot {
            metadata: SnapshotMetadata {
                name: name.to_string(),
                identity: identity.clone(),
                title: entry.title.clone(),
                subtitle: entry.subtitle.clone(),
                created: Utc::now(),
                fingerprint: entry.fingerprint.clone(),
                row_count: entry.rows.len(),
            },
            rows: (*entry.rows).clone(),
        };

        fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        log::info!("Saved snapshot '{name}' of {identity} to {}", path.display());
        Ok(snapshot.metadata)
    }

    pub fn load(&self, identity: &SourceIdentity, name: &str) -> Result<StoredSnapshot> {
        let path = self.snapshot_path(identity, name)?;
        if !path.exists() {
            return Err(TabsnapError::SnapshotNotFound {
                name: name.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Metadata of every snapshot of `identity`, oldest first
    pub fn list(&self, identity: &SourceIdentity) -> Result<Vec<SnapshotMetadata>> {
        let dir = self.source_dir(identity);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredSnapshot>(&content) {
                Ok(snapshot) => snapshots.push(snapshot.metadata),
                Err(e) => log::warn!("Ignoring unreadable snapshot {}: {e}", path.display()),
            }
        }

        snapshots.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
        Ok(snapshots)
    }

    pub fn names(&self, identity: &SourceIdentity) -> Result<Vec<String>> {
        Ok(self.list(identity)?.into_iter().map(|m| m.name).collect())
    }

    pub fn latest(&self, identity: &SourceIdentity) -> Result<Option<StoredSnapshot>> {
        match self.list(identity)?.pop() {
            Some(metadata) => self.load(identity, &metadata.name).map(Some),
            None => Ok(None),
        }
    }
}
