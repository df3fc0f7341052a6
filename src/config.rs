// src/config.rs
// =============================================================================
// The crawl configuration record.
//
// This is plain data: the CLI (or any embedding program) fills it in and
// CrawlController::new() validates it. Nothing here touches the network or
// the filesystem.
// =============================================================================

use std::path::PathBuf;

use crate::crawl::LinkType;
use crate::limiter::DEFAULT_MAX_PAGES;

pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Where the crawl starts.
    pub seed: String,
    /// Scope prefixes; the first one must be a prefix of `seed`.
    pub scopes: Vec<String>,
    /// Root directory of the mirror. Created if missing.
    pub dump_dir: PathBuf,
    pub max_depth: usize,
    /// Budget of links accepted for fetch.
    pub max_pages: usize,
    pub link_types: Vec<LinkType>,
}

impl CrawlConfig {
    pub fn new(seed: impl Into<String>, scopes: Vec<String>, dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed: seed.into(),
            scopes,
            dump_dir: dump_dir.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            link_types: LinkType::DEFAULT.to_vec(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_link_types(mut self, link_types: Vec<LinkType>) -> Self {
        self.link_types = link_types;
        self
    }
}
