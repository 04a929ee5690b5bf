use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error};

use crate::aideon::consolidator::engine::Consolidator;
use crate::aideon::consolidator::error::{ConsolidateError, Result};
use crate::aideon::consolidator::io::excel_write::{serialize, write_download};
use crate::aideon::consolidator::io::load_input;
use crate::aideon::consolidator::model::{
    ConsolidatedResult, FileEntry, FileId, InputFile, Summary,
};
use crate::aideon::consolidator::strategy::{Strategy, StrategyKind};

/// Caller-owned state: the file queue, the last result and the last error.
#[derive(Debug, Default)]
pub struct Session {
    entries: Vec<FileEntry>,
    result: Option<ConsolidatedResult>,
    error: Option<String>,
    engine: Consolidator,
}

/// Snapshot of the session suitable for display or JSON output.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub files: &'a [FileEntry],
    pub kind: Option<StrategyKind>,
    pub summary: Option<Summary>,
    pub error: Option<&'a str>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a file as pending. Any previous result is discarded.
    pub fn add_file(&mut self, file: InputFile) -> FileId {
        let entry = FileEntry::new(file);
        let id = entry.id;
        debug!(%id, file = entry.name(), size = entry.file.size, "file queued");
        self.entries.push(entry);
        self.result = None;
        self.error = None;
        id
    }

    /// Reads a file from disk and queues it.
    pub fn add_path(&mut self, path: &Path) -> Result<FileId> {
        let file = load_input(path)?;
        Ok(self.add_file(file))
    }

    /// Removes a queued file; returns `false` when the id is unknown.
    pub fn remove_file(&mut self, id: FileId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Empties the queue and forgets the last result and error.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.result = None;
        self.error = None;
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn entry(&self, id: FileId) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn result(&self) -> Option<&ConsolidatedResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn report(&self) -> StatusReport<'_> {
        StatusReport {
            files: &self.entries,
            kind: self.result.as_ref().map(|result| result.kind),
            summary: self.result.as_ref().map(|result| result.summary),
            error: self.error(),
        }
    }

    /// Consolidates the queued files, updating each entry as the run advances.
    ///
    /// Files queued afterwards are not part of this run. On failure no result
    /// is held and the error message is kept for display.
    pub fn run(&mut self, strategy: &Strategy) -> Result<&ConsolidatedResult> {
        for entry in &mut self.entries {
            entry.reset();
        }
        self.result = None;
        self.error = None;

        let snapshot = self.entries.clone();
        let entries = &mut self.entries;
        let outcome = self.engine.consolidate(&snapshot, strategy, |update| {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.id == update.id) {
                entry.apply(&update);
            }
        });

        match outcome {
            Ok(result) => Ok(&*self.result.insert(result)),
            Err(err) => {
                error!(error = %err, "consolidation failed");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Serialises the held result. A failure here keeps the result so the
    /// export can be retried.
    pub fn export(&mut self) -> Result<Vec<u8>> {
        let result = self.result.as_ref().ok_or(ConsolidateError::NoResult)?;
        match serialize(result) {
            Ok(buffer) => Ok(buffer),
            Err(err) => {
                error!(error = %err, "export failed");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Exports the held result into `dir` under a timestamped file name.
    pub fn download(&mut self, dir: &Path) -> Result<PathBuf> {
        let buffer = self.export()?;
        let kind = self
            .result
            .as_ref()
            .map(|result| result.kind)
            .ok_or(ConsolidateError::NoResult)?;
        write_download(dir, &buffer, kind)
    }
}
