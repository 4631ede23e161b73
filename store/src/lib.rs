//! Bounded on-disk history of recent analyses.
//!
//! One JSON file holding an array of at most [`MAX_ENTRIES`] entries,
//! newest first. Loading is tolerant: a missing, unreadable, or malformed
//! file becomes an empty history with a `warn` log, never an error, so a
//! bad file can't take the application down. Writes are atomic (temp file
//! plus rename) so a crash mid-write leaves the previous file intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use vigil_types::HistoryEntry;

/// Most recent entries kept; older ones age out on append.
pub const MAX_ENTRIES: usize = 5;

/// File name doubles as the schema version; a future layout change bumps it
/// rather than migrating in place.
pub const HISTORY_FILE_NAME: &str = "history_v1.json";

/// A failed history write. Loads never error; see the crate docs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create history directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to write history file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Owns the history file path and the in-memory entries.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Open the store at the platform default location, loading whatever is
    /// currently on disk.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(default_history_path())
    }

    /// Open the store at `path`. Called once at startup; the file is read
    /// here and never again.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let entries = load_entries(&path);
        Self { path, entries }
    }

    /// Entries newest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a completed analysis: prepend, drop anything past
    /// [`MAX_ENTRIES`], and persist before returning.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        atomic_write(&self.path, &bytes).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), "Failed to read history, starting empty: {err}");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Vec<HistoryEntry>>(&bytes) {
        Ok(mut entries) => {
            entries.truncate(MAX_ENTRIES);
            entries
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "Discarding unreadable history: {err}");
            Vec::new()
        }
    }
}

/// Write via a temp file in the same directory, then rename over the target.
/// On Windows rename-over-existing fails, so fall back to a backup dance.
fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Err(err) = tmp.persist(path) {
        if path.exists() {
            let backup_path = path.with_extension("bak");
            let _ = fs::remove_file(&backup_path);
            fs::rename(path, &backup_path)?;

            if let Err(persist_err) = err.file.persist(path) {
                let _ = fs::rename(&backup_path, path);
                return Err(persist_err.error);
            }
            if let Err(err) = fs::remove_file(&backup_path) {
                tracing::warn!(
                    path = %backup_path.display(),
                    "Failed to remove .bak after atomic write: {err}"
                );
            }
        } else {
            return Err(err.error);
        }
    }

    Ok(())
}

/// `{data_dir}/vigil/history_v1.json`, falling back to a dotted directory
/// under the working directory in constrained environments.
#[must_use]
pub fn default_history_path() -> PathBuf {
    data_dir().join(HISTORY_FILE_NAME)
}

fn data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".vigil"), |dir| dir.join("vigil"))
}
