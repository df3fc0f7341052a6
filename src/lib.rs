//! Mirror a website to disk, limited to a set of URL scope prefixes.
//!
//! The crate is split into a small decision core and a crawl engine:
//!
//! - [`scope`]: which links are in scope ([`scope::ScopeFilter`])
//! - [`limiter`]: the page budget
//! - [`mirror`]: URL to local path mapping and file writing
//! - [`metadata`]: the `.meta` log (path, MIME type, encoding)
//! - [`controller`]: wires the above into a [`crawl::CrawlEngine`] and owns
//!   teardown
//! - [`crawl`]: the engine trait and the reqwest based [`crawl::HttpEngine`]
//!
//! # Usage
//!
//! ```rust,no_run
//! use site_dumper::config::CrawlConfig;
//! use site_dumper::controller::CrawlController;
//! use site_dumper::crawl::HttpEngine;
//!
//! # async fn example() -> Result<(), site_dumper::error::CrawlError> {
//! let config = CrawlConfig::new(
//!     "http://foo.com/do/re/mi.html",
//!     vec!["http://foo.com/do".to_string()],
//!     "/tmp/dump",
//! );
//! let controller = CrawlController::new(config)?;
//! let report = controller.run(&mut HttpEngine::default()).await?;
//! println!("mirrored {} page(s)", report.pages_mirrored);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod crawl;
pub mod error;
pub mod events;
pub mod limiter;
pub mod metadata;
pub mod mime;
pub mod mirror;
pub mod scope;
