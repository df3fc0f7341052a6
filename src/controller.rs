// src/controller.rs
// =============================================================================
// CrawlController ties the pieces together:
//
// 1. new(): validate the config, normalize the scope, create the dump
//    directory and open the `.meta` log
// 2. run(): configure the engine, plug in the two hooks and drive the crawl
//    - accept: ScopeFilter (in scope AND within the page budget)
//    - visit:  MirrorWriter, then MetadataRecorder
// 3. teardown: close the mirror and the metadata log, on success AND on
//    failure, then report
//
// Failure policy: the first mirror or metadata error stops the crawl. The
// error comes back as CrawlError::Aborted together with a report of what was
// done up to that point, and any teardown failure on top of it. Lines
// already recorded in `.meta` are flushed before run() returns.
//
// Rust concepts:
// - run(self) takes ownership, so teardown can't happen twice
// - the two hooks borrow different fields of the controller, which is why
//   they can both be alive (and mutable) at the same time
// =============================================================================

use std::fs;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::{CrawlEngine, CrawlHooks, Link, LinkType, Page};
use crate::error::{ConfigError, CrawlError, TeardownError, VisitError};
use crate::limiter::PageLimiter;
use crate::metadata::MetadataRecorder;
use crate::mirror::{MirrorEntry, MirrorWriter};
use crate::scope::{canonical_prefix, CrawlScope, ScopeFilter};

/// Summary of a crawl, also attached to `CrawlError::Aborted`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub dump_dir: String,
    pub pages_accepted: usize,
    pub pages_mirrored: usize,
    pub metadata_records: usize,
    pub bytes_written: u64,
    pub elapsed_secs: f64,
}

#[derive(Debug)]
pub struct CrawlController {
    seed: Url,
    filter: ScopeFilter,
    max_depth: usize,
    link_types: Vec<LinkType>,
    mirror: MirrorWriter,
    metadata: MetadataRecorder,
}

impl CrawlController {
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let first_scope = config.scopes.first().ok_or(ConfigError::EmptyScope)?;

        let seed = Url::parse(&config.seed).map_err(|source| ConfigError::InvalidSeed {
            url: config.seed.clone(),
            source,
        })?;

        // Both sides as `Url` prints them, since that is the form the engine
        // reports. The '/' is not appended yet.
        if !seed.as_str().starts_with(&canonical_prefix(first_scope)) {
            return Err(ConfigError::SeedOutsideScope {
                seed: config.seed.clone(),
                scope: first_scope.clone(),
            }
            .into());
        }

        let scope = CrawlScope::new(config.scopes.iter().cloned())?;

        let dump_dir = config.dump_dir;
        if dump_dir.exists() && !dump_dir.is_dir() {
            return Err(ConfigError::DumpDirNotDirectory(dump_dir).into());
        }
        fs::create_dir_all(&dump_dir).map_err(|source| CrawlError::DumpDir {
            path: dump_dir.clone(),
            source,
        })?;

        let mirror = MirrorWriter::new(&dump_dir, scope.primary());
        let metadata = MetadataRecorder::create(&dump_dir)?;

        tracing::info!(
            seed = %seed,
            scope = ?scope.prefixes(),
            dump_dir = %dump_dir.display(),
            max_pages = config.max_pages,
            "crawl configured"
        );

        Ok(Self {
            seed,
            filter: ScopeFilter::new(scope, PageLimiter::new(config.max_pages)),
            max_depth: config.max_depth,
            link_types: config.link_types,
            mirror,
            metadata,
        })
    }

    pub fn scope(&self) -> &CrawlScope {
        self.filter.scope()
    }

    /// Runs the crawl to completion, then tears down.
    pub async fn run<E: CrawlEngine>(mut self, engine: &mut E) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let max_pages = self.filter.limiter().max_pages();

        engine.set_root(Link::root(self.seed.clone()));
        engine.set_scope(self.filter.scope().prefixes());
        engine.set_domain(self.filter.scope().domain());
        engine.set_link_types(&self.link_types);
        engine.set_max_depth(self.max_depth);
        // The root is fetched without using budget, hence the +1
        engine.set_max_pages(max_pages.saturating_add(1));

        let outcome = {
            let filter = &mut self.filter;
            let mirror = &mut self.mirror;
            let metadata = &mut self.metadata;

            let mut accept = |link: &Link| filter.accept(link.url().as_str());
            let mut visit = |page: Page| -> Result<(), VisitError> {
                mirror_and_record(mirror, metadata, page).map(|_| ())
            };

            engine
                .run(CrawlHooks {
                    accept: &mut accept,
                    visit: &mut visit,
                })
                .await
        };

        let report = self.report(started.elapsed());
        let teardown = self.close();

        match (outcome, teardown) {
            (Ok(pages_visited), Ok(())) => {
                tracing::info!(pages_visited, pages_mirrored = report.pages_mirrored, "crawl complete");
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(CrawlError::Teardown(e)),
            (Err(source), teardown) => {
                let teardown = teardown.err();
                if let Some(e) = &teardown {
                    tracing::error!(error = %e, "teardown after aborted crawl also failed");
                }
                Err(CrawlError::Aborted {
                    report: Box::new(report),
                    source,
                    teardown,
                })
            }
        }
    }

    /// Closes the mirror and the metadata log. Both are attempted even if
    /// the first one fails.
    pub fn close(mut self) -> Result<(), TeardownError> {
        let mut errors = TeardownError::default();

        match self.mirror.close() {
            Ok(stats) => tracing::debug!(?stats, "mirror closed"),
            Err(e) => errors.mirror = Some(e),
        }
        if let Err(e) = self.metadata.close() {
            errors.metadata = Some(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn report(&self, elapsed: Duration) -> CrawlReport {
        let stats = self.mirror.stats();
        CrawlReport {
            seed: self.seed.to_string(),
            dump_dir: self.mirror.root().display().to_string(),
            pages_accepted: self.filter.limiter().accepted(),
            pages_mirrored: stats.files_written,
            metadata_records: self.metadata.records(),
            bytes_written: stats.bytes_written,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

// The visit step: write the file, then describe it in `.meta`
fn mirror_and_record(
    mirror: &mut MirrorWriter,
    metadata: &mut MetadataRecorder,
    page: Page,
) -> Result<MirrorEntry, VisitError> {
    let mime_type = page.mime_type().map(String::from);
    let encoding = page.content_encoding().map(String::from);

    let entry = mirror.write(page)?;
    metadata.record(&entry.relative_path, mime_type.as_deref(), encoding.as_deref())?;

    Ok(entry)
}
