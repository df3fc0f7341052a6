// src/mirror.rs
// =============================================================================
// Writes fetched pages to disk, keeping the remote path layout.
//
// Path mapping:
//   url  = http://foo.com/do/re/mi.html
//   scope[0] = http://foo.com/do/
//   root = /out
//   -> /out/re/mi.html
//
// Details:
// - a URL that maps to "" or ends in '/' is written as index.<ext>
//   (extension from the MIME type, "html" when unknown)
// - the URL equal to scope[0] without its trailing slash is the index too
// - URLs outside scope[0] (accepted through another prefix) go to
//   <root>/<host>[_<port>]/<path>
// - ".." segments are refused, empty segments are dropped
// - existing files are overwritten, so re-visits keep the latest content
// =============================================================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::crawl::{Page, PageContent};
use crate::error::MirrorError;
use crate::mime;

/// Where a mirrored page ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    pub url: String,
    /// Relative to the dump root, '/'-separated.
    pub relative_path: String,
    pub local_path: PathBuf,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorStats {
    pub files_written: usize,
    pub bytes_written: u64,
}

#[derive(Debug)]
pub struct MirrorWriter {
    root: PathBuf,
    prefix: String,
    stats: MirrorStats,
}

impl MirrorWriter {
    /// `prefix` must already end with '/'.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            stats: MirrorStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> MirrorStats {
        self.stats
    }

    /// Maps a URL to a path relative to the dump root.
    pub fn relative_path(&self, url: &str, mime_type: Option<&str>) -> Result<String, MirrorError> {
        let remainder = match url.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.to_string(),
            None if format!("{}/", url) == self.prefix => String::new(),
            None => foreign_path(url),
        };

        let mut segments: Vec<String> = Vec::new();
        for segment in remainder.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(MirrorError::UnsafePath {
                        url: url.to_string(),
                        relative: remainder.clone(),
                    })
                }
                s => segments.push(s.to_string()),
            }
        }

        if remainder.is_empty() || remainder.ends_with('/') {
            segments.push(index_name(mime_type));
        }

        Ok(segments.join("/"))
    }

    // Writes the page and drops its body
    //
    // Any filesystem failure (mkdir, create, write) is returned as-is;
    // the caller decides whether that ends the crawl.
    pub fn write(&mut self, page: Page) -> Result<MirrorEntry, MirrorError> {
        let url = page.url().as_str().to_string();
        let relative_path = self.relative_path(&url, page.mime_type())?;
        let local_path = self
            .root
            .join(relative_path.split('/').collect::<PathBuf>());

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|source| MirrorError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let write_err = |source: io::Error| MirrorError::Write {
            url: url.clone(),
            path: local_path.clone(),
            source,
        };

        let bytes_written = match page.content() {
            PageContent::Bytes(bytes) => {
                fs::write(&local_path, bytes).map_err(write_err)?;
                bytes.len() as u64
            }
            PageContent::TempFile(temp) => fs::copy(temp, &local_path).map_err(write_err)?,
        };

        // Releases in-memory bytes or deletes the temp file
        drop(page);

        self.stats.files_written += 1;
        self.stats.bytes_written += bytes_written;
        tracing::debug!(%url, path = %local_path.display(), bytes_written, "mirrored page");

        Ok(MirrorEntry {
            url,
            relative_path,
            local_path,
            bytes_written,
        })
    }

    /// Syncs the dump directory so newly created entries are durable.
    pub fn close(self) -> Result<MirrorStats, MirrorError> {
        sync_dir(&self.root).map_err(|source| MirrorError::Sync {
            path: self.root.clone(),
            source,
        })?;
        Ok(self.stats)
    }
}

fn index_name(mime_type: Option<&str>) -> String {
    let extension = mime_type
        .map(mime::extension_for)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("html");
    format!("index.{}", extension)
}

// http://other.org:8080/x/y -> other.org_8080/x/y
fn foreign_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("unknown-host");
            let server = match parsed.port() {
                Some(port) => format!("{}_{}", host, port),
                None => host.to_string(),
            };
            let mut path = format!("{}{}", server, parsed.path());
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        }
        Err(_) => format!("unknown-host/{}", url),
    }
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    fs::File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(path: &Path) -> io::Result<()> {
    fs::metadata(path).map(|_| ())
}
