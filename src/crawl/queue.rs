// src/crawl/queue.rs
// =============================================================================
// This module implements the crawl engine with a breadth-first approach.
//
// How it works:
// 1. Start with the root link in a queue (the root skips the accept hook)
// 2. Fetch the page, following redirects
// 3. If it's HTML and not too deep, pull its links out
// 4. Hand the page to the visit hook (the hook now owns the body)
// 5. Offer each new link to the accept hook; queue the accepted ones
// 6. Repeat until the queue is empty or the page limit is hit
//
// Pages are processed one at a time, so the hooks are never called
// concurrently. A failed fetch is reported and skipped (no retries); a
// failed visit stops the whole run.
//
// Rust concepts:
// - HashSet: to offer each URL to the accept hook only once
// - VecDeque: the breadth-first queue
// - tempfile: big bodies are spooled to disk instead of memory
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::io::Write;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tempfile::NamedTempFile;
use url::Url;

use super::{extract_links, CrawlEngine, CrawlHooks, Domain, Link, LinkType, Page, PageContent};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{EngineError, FetchError};
use crate::events::{CrawlEvent, CrawlObserver, SkipReason};
use crate::mime;

/// Knobs for the HTTP side of the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub timeout: Duration,
    /// Pause between two fetches.
    pub delay: Duration,
    pub user_agent: String,
    /// Bodies larger than this are written to a temporary file.
    pub spill_threshold: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            delay: Duration::from_millis(100),
            user_agent: format!("site-dumper/{}", env!("CARGO_PKG_VERSION")),
            spill_threshold: 8 * 1024 * 1024,
        }
    }
}

pub struct HttpEngine {
    options: EngineOptions,
    root: Option<Link>,
    scope: Vec<String>,
    domain: Domain,
    link_types: Vec<LinkType>,
    max_depth: usize,
    max_pages: Option<usize>,
    listeners: Vec<Box<dyn CrawlObserver>>,
}

impl HttpEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            root: None,
            scope: Vec::new(),
            domain: Domain::Server,
            link_types: LinkType::DEFAULT.to_vec(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: None,
            listeners: Vec::new(),
        }
    }

    fn emit(&mut self, event: CrawlEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    // Engine-level filter applied before the accept hook
    //
    // SERVER mode: same host and port as the root.
    // WEB mode: any host that one of the scope prefixes points at, or any
    // host at all when no scope was given.
    fn check_server(&self, root: &Url, candidate: &Url) -> bool {
        match self.domain {
            Domain::Server => same_server(root, candidate),
            Domain::Web => {
                self.scope.is_empty()
                    || self
                        .scope
                        .iter()
                        .filter_map(|prefix| Url::parse(prefix).ok())
                        .any(|prefix| same_server(&prefix, candidate))
            }
        }
    }

    async fn fetch(&self, client: &Client, link: &Link) -> Result<Page, FetchError> {
        let url = link.url().as_str().to_string();

        let mut response = client
            .get(link.url().clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status(),
            });
        }

        let resolved = response.url().clone();
        let (mime_type, content_encoding) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(mime::parse_content_type)
            .unwrap_or((None, None));

        // Stream the body, switching to a temp file once it gets big
        let mut buffer = Vec::new();
        let mut spool: Option<NamedTempFile> = None;
        let spool_err = |source: std::io::Error| FetchError::Spool {
            url: url.clone(),
            source,
        };

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?
        {
            match spool.as_mut() {
                Some(file) => file.write_all(&chunk).map_err(spool_err)?,
                None => {
                    buffer.extend_from_slice(&chunk);
                    if buffer.len() > self.options.spill_threshold {
                        let mut file = NamedTempFile::new().map_err(spool_err)?;
                        file.write_all(&buffer).map_err(spool_err)?;
                        buffer = Vec::new();
                        spool = Some(file);
                    }
                }
            }
        }

        let content = match spool {
            Some(mut file) => {
                file.flush().map_err(spool_err)?;
                PageContent::TempFile(file.into_temp_path())
            }
            None => PageContent::Bytes(buffer),
        };

        Ok(Page::new(resolved, mime_type, content_encoding, content))
    }
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl CrawlEngine for HttpEngine {
    fn set_root(&mut self, root: Link) {
        self.root = Some(root);
    }

    fn set_scope(&mut self, prefixes: &[String]) {
        self.scope = prefixes.to_vec();
    }

    fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    fn set_link_types(&mut self, types: &[LinkType]) {
        self.link_types = types.to_vec();
    }

    fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    fn set_max_pages(&mut self, max_pages: usize) {
        self.max_pages = Some(max_pages);
    }

    fn add_listener(&mut self, listener: Box<dyn CrawlObserver>) {
        self.listeners.push(listener);
    }

    async fn run(&mut self, hooks: CrawlHooks<'_>) -> Result<usize, EngineError> {
        let root = self.root.clone().ok_or(EngineError::NoRoot)?;

        let client = Client::builder()
            .timeout(self.options.timeout)
            .user_agent(self.options.user_agent.clone())
            .build()
            .map_err(EngineError::Client)?;

        self.emit(CrawlEvent::CrawlStarted {
            root: root.url().to_string(),
        });

        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        seen.insert(root.url().as_str().to_string());
        queue.push_back(root.clone());

        let mut visited = 0;

        while let Some(link) = queue.pop_front() {
            if self.max_pages.is_some_and(|max| visited >= max) {
                tracing::debug!(visited, "page limit reached, stopping");
                break;
            }

            if visited > 0 {
                tokio::time::sleep(self.options.delay).await;
            }

            let page = match self.fetch(&client, &link).await {
                Ok(page) => page,
                Err(e) => {
                    self.emit(CrawlEvent::FetchFailed {
                        url: link.url().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            // Links are pulled out before the page is handed over,
            // since the visit hook takes ownership of the body
            let is_html = page.mime_type().is_some_and(mime::is_html);
            let candidates = if is_html && link.depth() < self.max_depth {
                match read_text(page.content()) {
                    Ok(html) => extract_links(&html, page.url(), &self.link_types),
                    Err(e) => {
                        tracing::warn!(url = %page.url(), error = %e, "could not read page body");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            let page_url = page.url().clone();
            (hooks.visit)(page).map_err(|source| EngineError::Visit {
                url: page_url.to_string(),
                source,
            })?;
            visited += 1;
            self.emit(CrawlEvent::PageVisited {
                url: page_url.to_string(),
            });

            for (url, kind) in candidates {
                if !seen.insert(url.as_str().to_string()) {
                    continue;
                }

                // Only pages below max_depth are parsed, so depth never exceeds it
                let depth = link.depth() + 1;
                if !self.check_server(root.url(), &url) {
                    self.emit(CrawlEvent::LinkSkipped {
                        url: url.to_string(),
                        reason: SkipReason::OtherServer,
                    });
                    continue;
                }

                let candidate = Link::new(url, page_url.clone(), kind, depth);
                if (hooks.accept)(&candidate) {
                    self.emit(CrawlEvent::LinkAccepted {
                        url: candidate.url().to_string(),
                        depth,
                    });
                    queue.push_back(candidate);
                } else {
                    self.emit(CrawlEvent::LinkRejected {
                        url: candidate.url().to_string(),
                    });
                }
            }
        }

        self.emit(CrawlEvent::CrawlFinished {
            pages_visited: visited,
        });

        Ok(visited)
    }
}

fn same_server(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

fn read_text(content: &PageContent) -> std::io::Result<String> {
    let bytes = match content {
        PageContent::Bytes(bytes) => std::borrow::Cow::Borrowed(bytes.as_slice()),
        PageContent::TempFile(path) => std::borrow::Cow::Owned(std::fs::read(path)?),
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is the root never offered to the accept hook?
//    - The root is where the user asked us to start; it's always fetched
//    - Only links *discovered* on pages count against the page budget
//
// 2. Why the `seen` set?
//    - The same URL usually appears on many pages
//    - Each URL is offered to the accept hook once, so a page budget
//      isn't spent twice on the same link
//
// 3. What does (hooks.visit)(page) mean?
//    - hooks.visit is a field holding a closure
//    - The parentheses around it tell Rust to call the field, not a method
//
// 4. Why is a failed fetch skipped but a failed visit fatal?
//    - A 404 on one link is normal on the web
//    - A failed disk write means the mirror is no longer trustworthy
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MirrorError, VisitError};
    use crate::events::RecordingObserver;
    use httpmock::prelude::*;
    use std::path::PathBuf;

    fn engine_for(server: &MockServer, path: &str) -> HttpEngine {
        let mut engine = HttpEngine::new(EngineOptions {
            delay: Duration::ZERO,
            ..EngineOptions::default()
        });
        engine.set_root(Link::root(Url::parse(&server.url(path)).unwrap()));
        engine
    }

    #[test]
    fn test_same_server_compares_port() {
        let a = Url::parse("http://example.com/a").unwrap();
        let b = Url::parse("http://example.com:80/b").unwrap();
        let c = Url::parse("http://example.com:8080/b").unwrap();
        assert!(same_server(&a, &b));
        assert!(!same_server(&a, &c));
    }

    #[tokio::test]
    async fn test_run_without_root_fails() {
        let mut engine = HttpEngine::default();
        let mut accept = |_: &Link| true;
        let mut visit = |_: Page| -> Result<(), VisitError> { Ok(()) };
        let result = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await;
        assert!(matches!(result, Err(EngineError::NoRoot)));
    }

    #[tokio::test]
    async fn test_crawls_accepted_links_breadth_first() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/site/index.html");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body(r#"<a href="a.html">A</a><a href="/other/b.html">B</a><img src="logo.png">"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/site/a.html");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<a href="index.html">Back</a>"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/site/logo.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body("PNG");
            })
            .await;

        let mut engine = engine_for(&server, "/site/index.html");
        let recorder = RecordingObserver::new();
        engine.add_listener(Box::new(recorder.clone()));

        let prefix = server.url("/site/");
        let mut offered = Vec::new();
        let mut pages = Vec::new();
        let mut accept = |link: &Link| {
            offered.push(link.url().to_string());
            link.url().as_str().starts_with(&prefix)
        };
        let mut visit = |page: Page| -> Result<(), VisitError> {
            pages.push((page.url().to_string(), page.mime_type().map(String::from)));
            Ok(())
        };

        let visited = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        assert_eq!(visited, 3);
        // index.html is never offered again: it was the root
        assert_eq!(offered.len(), 3);
        assert_eq!(pages[0].0, server.url("/site/index.html"));
        assert_eq!(pages[0].1.as_deref(), Some("text/html"));
        assert!(pages.iter().any(|(url, mime)| {
            url == &server.url("/site/logo.png") && mime.as_deref() == Some("image/png")
        }));

        let events = recorder.events();
        assert!(events.contains(&CrawlEvent::LinkRejected {
            url: server.url("/other/b.html"),
        }));
        assert_eq!(
            events.last(),
            Some(&CrawlEvent::CrawlFinished { pages_visited: 3 })
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/index.html");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<a href="missing.html">gone</a>"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.html");
                then.status(404);
            })
            .await;

        let mut engine = engine_for(&server, "/index.html");
        let recorder = RecordingObserver::new();
        engine.add_listener(Box::new(recorder.clone()));

        let mut accept = |_: &Link| true;
        let mut visit = |_: Page| -> Result<(), VisitError> { Ok(()) };
        let visited = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        assert_eq!(visited, 1);
        assert!(recorder
            .events()
            .iter()
            .any(|e| matches!(e, CrawlEvent::FetchFailed { url, .. } if url == &server.url("/missing.html"))));
    }

    #[tokio::test]
    async fn test_visit_error_aborts_run() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/index.html");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<a href="next.html">next</a>"#);
            })
            .await;
        let next = server
            .mock_async(|when, then| {
                when.method(GET).path("/next.html");
                then.status(200).header("content-type", "text/html").body("");
            })
            .await;

        let mut engine = engine_for(&server, "/index.html");
        let mut accept = |_: &Link| true;
        let mut visit = |page: Page| -> Result<(), VisitError> {
            Err(VisitError::Mirror(MirrorError::UnsafePath {
                url: page.url().to_string(),
                relative: "../x".to_string(),
            }))
        };
        let result = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await;

        match result {
            Err(EngineError::Visit { url, .. }) => assert_eq!(url, server.url("/index.html")),
            other => panic!("expected visit error, got {:?}", other),
        }
        next.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_depth_and_page_limits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/0.html");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<a href="1.html">1</a><a href="2.html">2</a>"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/1.html");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<a href="deep.html">deep</a>"#);
            })
            .await;
        let two = server
            .mock_async(|when, then| {
                when.method(GET).path("/2.html");
                then.status(200).header("content-type", "text/html").body("");
            })
            .await;

        let mut engine = engine_for(&server, "/0.html");
        engine.set_max_depth(1);
        engine.set_max_pages(2);
        let recorder = RecordingObserver::new();
        engine.add_listener(Box::new(recorder.clone()));

        let mut accept = |_: &Link| true;
        let mut visit = |_: Page| -> Result<(), VisitError> { Ok(()) };
        let visited = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        assert_eq!(visited, 2);
        two.assert_hits_async(0).await;
        // 1.html sits at the depth limit, so its links are not even parsed
        assert!(!recorder
            .events()
            .iter()
            .any(|e| matches!(e, CrawlEvent::LinkSkipped { .. })));
    }

    #[tokio::test]
    async fn test_web_mode_follows_scope_hosts_only() {
        let home = MockServer::start_async().await;
        let cdn = MockServer::start_async().await;
        let stranger = MockServer::start_async().await;

        home.mock_async(|when, then| {
            when.method(GET).path("/index.html");
            then.status(200)
                .header("content-type", "text/html")
                .body(format!(
                    r#"<a href="{}">cdn</a><a href="{}">elsewhere</a>"#,
                    cdn.url("/lib.html"),
                    stranger.url("/x.html")
                ));
        })
        .await;
        let lib = cdn
            .mock_async(|when, then| {
                when.method(GET).path("/lib.html");
                then.status(200).header("content-type", "text/html").body("");
            })
            .await;
        let x = stranger
            .mock_async(|when, then| {
                when.method(GET).path("/x.html");
                then.status(200).header("content-type", "text/html").body("");
            })
            .await;

        let mut engine = engine_for(&home, "/index.html");
        engine.set_scope(&[home.url("/"), cdn.url("/")]);
        engine.set_domain(Domain::Web);
        let recorder = RecordingObserver::new();
        engine.add_listener(Box::new(recorder.clone()));

        let mut accept = |_: &Link| true;
        let mut visit = |_: Page| -> Result<(), VisitError> { Ok(()) };
        let visited = engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        assert_eq!(visited, 2);
        lib.assert_hits_async(1).await;
        x.assert_hits_async(0).await;

        let events = recorder.events();
        assert!(events.contains(&CrawlEvent::LinkAccepted {
            url: cdn.url("/lib.html"),
            depth: 1,
        }));
        assert!(events.contains(&CrawlEvent::LinkSkipped {
            url: stranger.url("/x.html"),
            reason: SkipReason::OtherServer,
        }));
    }

    #[tokio::test]
    async fn test_server_mode_skips_other_ports() {
        let home = MockServer::start_async().await;
        let other = MockServer::start_async().await;

        home.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("content-type", "text/html")
                .body(format!(r#"<a href="{}">other</a>"#, other.url("/")));
        })
        .await;

        let mut engine = engine_for(&home, "/");
        let recorder = RecordingObserver::new();
        engine.add_listener(Box::new(recorder.clone()));

        let mut offered = 0;
        let mut accept = |_: &Link| {
            offered += 1;
            true
        };
        let mut visit = |_: Page| -> Result<(), VisitError> { Ok(()) };
        engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        assert_eq!(offered, 0);
        assert!(recorder.events().contains(&CrawlEvent::LinkSkipped {
            url: other.url("/"),
            reason: SkipReason::OtherServer,
        }));
    }

    #[tokio::test]
    async fn test_large_body_is_spooled_to_temp_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/big.bin");
                then.status(200)
                    .header("content-type", "application/octet-stream")
                    .body(vec![7u8; 4096]);
            })
            .await;

        let mut engine = HttpEngine::new(EngineOptions {
            delay: Duration::ZERO,
            spill_threshold: 1024,
            ..EngineOptions::default()
        });
        engine.set_root(Link::root(Url::parse(&server.url("/big.bin")).unwrap()));

        let mut spooled: Option<(PathBuf, Vec<u8>)> = None;
        let mut accept = |_: &Link| true;
        let mut visit = |page: Page| -> Result<(), VisitError> {
            let path = page.content().temp_path().map(PathBuf::from);
            if let Some(path) = path {
                let bytes = std::fs::read(&path).unwrap();
                spooled = Some((path, bytes));
            }
            Ok(())
        };
        engine
            .run(CrawlHooks {
                accept: &mut accept,
                visit: &mut visit,
            })
            .await
            .unwrap();

        let (path, bytes) = spooled.expect("body should have been spooled");
        assert_eq!(bytes.len(), 4096);
        // dropping the page deleted the temp file
        assert!(!path.exists());
    }
}
