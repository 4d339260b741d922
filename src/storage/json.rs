//! JSON document storage
//!
//! All users and tasks live in a single pretty-printed JSON document:
//!
//! ```json
//! { "users": [ ... ], "tasks": [ ... ] }
//! ```
//!
//! Every write replaces the whole document.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{Task, User};

/// On-disk shape of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
}

/// Reads and writes the backing JSON file
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    /// Creates a handle for the file at `path`; nothing is touched on disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, or `None` if the file does not exist yet
    pub fn read(&self) -> Result<Option<StoreDocument>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open data file: {}", self.path.display())
                })
            }
        };

        let document = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse data file: {}", self.path.display()))?;

        Ok(Some(document))
    }

    /// Writes the full document (temp file + rename)
    pub fn write(&self, document: &StoreDocument) -> Result<()> {
        self.ensure_parent()?;

        let temp_path = self.temp_path();

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document)
                .context("Failed to serialize data file")?;
            writeln!(writer).context("Failed to write data file")?;
            writer.flush().context("Failed to flush data file")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Creates the parent directory if it is missing
    pub fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display())),
            _ => Ok(()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
