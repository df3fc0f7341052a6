// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine: it fetches pages, finds their links and
// decides the traversal order. It does NOT decide which links are in scope or
// what happens to fetched pages. Those decisions are injected as two hooks:
//
// - accept: called once per new candidate link, before it is queued
// - visit:  called once per successfully fetched page
//
// Submodules:
// - links: extracts links of the requested kinds from HTML
// - queue: HttpEngine, a breadth-first engine built on reqwest
//
// Rust concepts:
// - Traits: CrawlEngine lets tests swap the HTTP engine for a scripted one
// - dyn FnMut: the hooks are closures that may mutate captured state
// =============================================================================

mod links;
mod queue;

pub use links::extract_links;
pub use queue::{EngineOptions, HttpEngine};

use std::fmt;
use std::path::Path;

use tempfile::TempPath;
use url::Url;

use crate::error::{EngineError, VisitError};
use crate::events::CrawlObserver;

/// Which servers the engine may fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Only the root's own host and port.
    Server,
    /// Any host.
    Web,
}

/// Kinds of links the engine follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    Hyperlink,
    Image,
    Code,
    HeaderLink,
}

impl LinkType {
    pub const DEFAULT: [LinkType; 4] = [
        LinkType::Hyperlink,
        LinkType::Image,
        LinkType::Code,
        LinkType::HeaderLink,
    ];
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkType::Hyperlink => "hyperlink",
            LinkType::Image => "image",
            LinkType::Code => "code",
            LinkType::HeaderLink => "header-link",
        };
        f.write_str(name)
    }
}

// A discovered URL and the page it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    url: Url,
    referrer: Option<Url>,
    kind: LinkType,
    depth: usize,
}

impl Link {
    /// The starting point of a crawl.
    pub fn root(url: Url) -> Self {
        Self {
            url,
            referrer: None,
            kind: LinkType::Hyperlink,
            depth: 0,
        }
    }

    pub fn new(url: Url, referrer: Url, kind: LinkType, depth: usize) -> Self {
        Self {
            url,
            referrer: Some(referrer),
            kind,
            depth,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn referrer(&self) -> Option<&Url> {
        self.referrer.as_ref()
    }

    pub fn kind(&self) -> LinkType {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Body of a fetched page. Large bodies live in a temporary file that is
/// deleted when the content is dropped.
#[derive(Debug)]
pub enum PageContent {
    Bytes(Vec<u8>),
    TempFile(TempPath),
}

impl PageContent {
    pub fn temp_path(&self) -> Option<&Path> {
        match self {
            PageContent::Bytes(_) => None,
            PageContent::TempFile(path) => Some(&**path),
        }
    }
}

// A fetched resource, handed to the visit hook by value
//
// The hook owns the page from then on; dropping it releases the body.
#[derive(Debug)]
pub struct Page {
    url: Url,
    mime_type: Option<String>,
    content_encoding: Option<String>,
    content: PageContent,
}

impl Page {
    pub fn new(
        url: Url,
        mime_type: Option<String>,
        content_encoding: Option<String>,
        content: PageContent,
    ) -> Self {
        Self {
            url,
            mime_type,
            content_encoding,
            content,
        }
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }
}

pub type AcceptHook<'a> = dyn FnMut(&Link) -> bool + 'a;
pub type VisitHook<'a> = dyn FnMut(Page) -> Result<(), VisitError> + 'a;

/// The two decisions the engine delegates to its caller.
pub struct CrawlHooks<'a> {
    pub accept: &'a mut AcceptHook<'a>,
    pub visit: &'a mut VisitHook<'a>,
}

/// What an engine must offer to be driven by `CrawlController`.
///
/// `run` processes one page at a time and only returns once the queue is
/// empty, a limit is reached, or the visit hook fails.
#[allow(async_fn_in_trait)]
pub trait CrawlEngine {
    fn set_root(&mut self, root: Link);
    fn set_scope(&mut self, prefixes: &[String]);
    fn set_domain(&mut self, domain: Domain);
    fn set_link_types(&mut self, types: &[LinkType]);
    fn set_max_depth(&mut self, max_depth: usize);
    fn set_max_pages(&mut self, max_pages: usize);
    fn add_listener(&mut self, listener: Box<dyn CrawlObserver>);

    /// Returns the number of pages handed to the visit hook.
    async fn run(&mut self, hooks: CrawlHooks<'_>) -> Result<usize, EngineError>;
}
