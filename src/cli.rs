// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Shape:
//   site-dumper run <seed> <scope>[,<scope>...] <dump_dir> [<max_depth> [<max_pages>]]
//
// The HTTP knobs (delay, timeout, user agent) are flags that can also come
// from environment variables, so CI jobs can set them once.
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use site_dumper::config::DEFAULT_MAX_DEPTH;
use site_dumper::limiter::DEFAULT_MAX_PAGES;

#[derive(Parser, Debug)]
#[command(
    name = "site-dumper",
    version,
    about = "Mirror a website to disk, staying inside a set of URL prefixes",
    long_about = "site-dumper crawls a website from a seed URL, follows only links that start with \
                  one of the scope URLs, saves every fetched file under the dump directory and \
                  writes a .meta file listing each file's MIME type and encoding."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl and mirror a site
    ///
    /// Example: site-dumper run http://foo.com/do/re/mi.html http://foo.com/do ./dump 3 50
    Run {
        /// URL where the crawl starts
        seed: String,

        /// Comma-separated scope URLs; the first must be a prefix of the seed
        ///
        /// Files are saved relative to the first scope URL.
        scopes: String,

        /// Directory the mirror is written to (created if missing)
        dump_dir: PathBuf,

        /// Maximum link depth from the seed
        #[arg(default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Maximum number of links accepted for download
        #[arg(default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Print the crawl report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Milliseconds to wait between two requests
        #[arg(long, env = "SITE_DUMPER_DELAY_MS", default_value_t = 100)]
        delay_ms: u64,

        /// Per-request timeout in seconds
        #[arg(long, env = "SITE_DUMPER_TIMEOUT_SECS", default_value_t = 30)]
        timeout_secs: u64,

        /// User-Agent header sent with every request
        #[arg(long, env = "SITE_DUMPER_USER_AGENT")]
        user_agent: Option<String>,
    },
}

// "a,b,,c " -> ["a", "b", "c"]
pub fn split_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
