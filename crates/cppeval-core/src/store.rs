//! Results persistence
//!
//! A checkpoint is a full rewrite of the `{metadata, results}` document.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never sees a half-written file.

use crate::error::StoreError;
use crate::types::{AnalysisResult, ResultsDocument, RunMetadata};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for checkpoints of a batch run
pub trait ResultSink: Send + Sync {
    /// Persist the current results with freshly derived metadata
    ///
    /// # Errors
    /// Returns `StoreError` if the document could not be written. Callers log
    /// the failure and keep running.
    fn save(
        &self,
        results: &[AnalysisResult],
        completed: usize,
        total: usize,
    ) -> Result<RunMetadata, StoreError>;
}

/// Pretty-printed JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    path: PathBuf,
}

impl JsonResultStore {
    /// Store writing to `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a results document
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the file does not exist
    /// - `StoreError::Io` / `StoreError::Json` on read or decode failure
    pub fn load(path: impl AsRef<Path>) -> Result<ResultsDocument, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| StoreError::io_error(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let suffix = format!("tmp.{}", std::process::id());
        let ext = match self.path.extension().and_then(|e| e.to_str()) {
            Some(orig) => format!("{orig}.{suffix}"),
            None => suffix,
        };
        self.path.with_extension(ext)
    }

    fn write_document(&self, document: &ResultsDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let temp = self.temp_path();
        let written = std::fs::File::create(&temp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp);
            return Err(StoreError::io_error(&temp, e));
        }

        std::fs::rename(&temp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            StoreError::io_error(&self.path, e)
        })
    }
}

impl ResultSink for JsonResultStore {
    fn save(
        &self,
        results: &[AnalysisResult],
        completed: usize,
        total: usize,
    ) -> Result<RunMetadata, StoreError> {
        let metadata = RunMetadata::from_results(results, completed, total);
        let document = ResultsDocument {
            metadata: metadata.clone(),
            results: results.to_vec(),
        };
        self.write_document(&document)?;
        tracing::info!("Results saved to {}", self.path.display());
        Ok(metadata)
    }
}
