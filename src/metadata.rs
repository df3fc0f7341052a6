// src/metadata.rs
// =============================================================================
// The `.meta` log: one line per mirrored file describing its MIME type and,
// when the server sent one, its character encoding.
//
//   re/mi.html,text/html,UTF-8
//   img/logo.png,image/png
//
// The file is created (or truncated) when the recorder is opened and stays
// open for the whole crawl. Lines are appended in the order pages are
// visited. close() flushes and syncs it; Drop flushes on a best-effort basis
// so already-recorded lines survive an early return.
// =============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::MetadataError;

pub const METADATA_FILE_NAME: &str = ".meta";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub relative_path: String,
    pub mime_type: String,
    pub encoding: Option<String>,
}

impl MetadataRecord {
    pub fn to_line(&self) -> String {
        match &self.encoding {
            Some(encoding) => format!("{},{},{}", self.relative_path, self.mime_type, encoding),
            None => format!("{},{}", self.relative_path, self.mime_type),
        }
    }
}

#[derive(Debug)]
pub struct MetadataRecorder {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    records: usize,
}

impl MetadataRecorder {
    /// Opens `<dump_dir>/.meta`, truncating any previous log.
    pub fn create(dump_dir: &Path) -> Result<Self, MetadataError> {
        let path = dump_dir.join(METADATA_FILE_NAME);
        let file = File::create(&path).map_err(|source| MetadataError::Open {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            records: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> usize {
        self.records
    }

    // Appends one line. Does nothing when there is no MIME type.
    //
    // Returns whether a line was written.
    pub fn record(
        &mut self,
        relative_path: &str,
        mime_type: Option<&str>,
        encoding: Option<&str>,
    ) -> Result<bool, MetadataError> {
        let Some(mime_type) = mime_type else {
            return Ok(false);
        };

        let record = MetadataRecord {
            relative_path: relative_path.to_string(),
            mime_type: mime_type.to_string(),
            encoding: encoding.map(String::from),
        };

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MetadataError::Closed(self.path.clone()))?;

        writeln!(writer, "{}", record.to_line()).map_err(|source| MetadataError::Write {
            path: self.path.clone(),
            source,
        })?;

        self.records += 1;
        Ok(true)
    }

    /// Flushes and syncs the log. A second call is an error.
    pub fn close(&mut self) -> Result<usize, MetadataError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| MetadataError::Closed(self.path.clone()))?;

        let close_err = |source: std::io::Error| MetadataError::Close {
            path: self.path.clone(),
            source,
        };

        let file = writer.into_inner().map_err(|e| close_err(e.into_error()))?;
        file.sync_all().map_err(close_err)?;

        tracing::debug!(path = %self.path.display(), records = self.records, "metadata log closed");
        Ok(self.records)
    }
}

impl Drop for MetadataRecorder {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::error!(path = %self.path.display(), error = %e, "failed to flush metadata log");
            }
        }
    }
}
