// src/error.rs
// =============================================================================
// Error types for the whole crawl pipeline.
//
// The errors are split by *when* they can happen:
// - ConfigError: detected while building the controller, before any fetch
// - MirrorError / MetadataError: filesystem failures while persisting a page
// - VisitError: whichever of the two above broke the visit hook
// - FetchError: a single page could not be downloaded (logged, not fatal)
// - EngineError: the engine stopped early
// - TeardownError: closing the mirror and/or metadata log failed
// - CrawlError: what the controller hands back to the caller
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: lets the ? operator convert one error type into another
// - #[source]: keeps the error chain intact for anyhow's "{:#}" output
// =============================================================================

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::controller::CrawlReport;

/// Problems with the crawl configuration, reported before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no scope URL was given")]
    EmptyScope,

    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("scope URL [{scope}] must be a prefix of the seed URL [{seed}]")]
    SeedOutsideScope { seed: String, scope: String },

    #[error("dump path '{}' exists but is not a directory", .0.display())]
    DumpDirNotDirectory(PathBuf),
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("could not create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not save page: url={url}, file='{}': {source}", .path.display())]
    Write {
        url: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to mirror {url}: '{relative}' escapes the dump directory")]
    UnsafePath { url: String, relative: String },

    #[error("could not sync dump directory '{}': {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("could not open metadata file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not append to metadata file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not flush metadata file '{}': {source}", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("metadata file '{}' is already closed", .0.display())]
    Closed(PathBuf),
}

/// Raised by the visit hook. Always fatal for the crawl.
#[derive(Debug, Error)]
pub enum VisitError {
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// A single page could not be downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not spool body of {url} to a temporary file: {source}")]
    Spool {
        url: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no root link was set")]
    NoRoot,

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("visit of {url} failed: {source}")]
    Visit {
        url: String,
        #[source]
        source: VisitError,
    },
}

/// Collects the failures of both teardown steps; each step is attempted
/// even when the other one fails.
#[derive(Debug, Default)]
pub struct TeardownError {
    pub mirror: Option<MirrorError>,
    pub metadata: Option<MetadataError>,
}

impl TeardownError {
    pub fn is_empty(&self) -> bool {
        self.mirror.is_none() && self.metadata.is_none()
    }
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "teardown failed")?;
        if let Some(e) = &self.mirror {
            write!(f, "; mirror: {}", e)?;
        }
        if let Some(e) = &self.metadata {
            write!(f, "; metadata: {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for TeardownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match (&self.mirror, &self.metadata) {
            (Some(e), _) => Some(e),
            (None, Some(e)) => Some(e),
            (None, None) => None,
        }
    }
}

/// Everything `CrawlController` can fail with.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not create dump directory '{}': {source}", .path.display())]
    DumpDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The run loop stopped early. `report` describes what was done before;
    /// `teardown` is set when closing the mirror or `.meta` failed as well.
    #[error("crawl aborted after {} mirrored page(s): {source}", .report.pages_mirrored)]
    Aborted {
        report: Box<CrawlReport>,
        #[source]
        source: EngineError,
        teardown: Option<TeardownError>,
    },

    #[error(transparent)]
    Teardown(#[from] TeardownError),
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why several error enums instead of one?
//    - Callers can match on exactly the failures that can happen at each step
//    - A configuration problem is never mixed up with a disk failure
//
// 2. Why is TeardownError written by hand?
//    - It can hold two errors at once, which #[derive(Error)] can't format
//      nicely, so we implement Display and Error ourselves
//
// 3. Why Box<CrawlReport>?
//    - Keeps CrawlError small; large enum variants make every Result bigger
// -----------------------------------------------------------------------------
