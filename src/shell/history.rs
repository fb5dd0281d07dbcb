//! Bounded persistent input history
//!
//! Backs the rich backend's Up/Down navigation. Entries live newest-last
//! in memory and on disk, one statement per line; persistence failures
//! degrade to an in-memory session.

use std::path::PathBuf;

use tracing::debug;

use crate::shell::error::ShellError;

#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    limit: usize,
    path: Option<PathBuf>,
    dirty: bool,
}

impl History {
    /// In-memory history bounded to `limit` entries
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            path: None,
            dirty: false,
        }
    }

    /// History backed by a file; a missing file starts an empty history
    pub fn with_file(
        path: PathBuf,
        limit: usize,
    ) -> Self {
        let mut history = Self::new(limit);
        if let Ok(source) = std::fs::read_to_string(&path) {
            for line in source.lines() {
                if !line.is_empty() {
                    history.entries.push(line.to_string());
                }
            }
            history.truncate();
        }
        debug!(entries = history.entries.len(), "history loaded");
        history.path = Some(path);
        history
    }

    /// Append an entry, dropping consecutive duplicates and multi-line
    /// statements' inner newlines
    pub fn push(
        &mut self,
        entry: &str,
    ) {
        let entry = entry.replace('\n', " ");
        let entry = entry.trim();
        if entry.is_empty() || self.entries.last().map(String::as_str) == Some(entry) {
            return;
        }
        self.entries.push(entry.to_string());
        self.truncate();
        self.dirty = true;
    }

    fn truncate(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    /// Write pending entries back to the history file
    pub fn save(&mut self) -> Result<(), ShellError> {
        let path = match (&self.path, self.dirty) {
            (Some(path), true) => path,
            _ => return Ok(()),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut body = self.entries.join("\n");
        body.push('\n');
        std::fs::write(path, body)?;
        self.dirty = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, oldest first
    pub fn get(
        &self,
        index: usize,
    ) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }
}
