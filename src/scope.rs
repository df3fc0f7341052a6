// src/scope.rs
// =============================================================================
// Decides whether a discovered link is inside the crawl scope.
//
// A scope is an ordered list of URL prefixes. Each prefix is first written
// the way `Url` serializes it (lower-case host, default port dropped) so it
// lines up with the URLs the engine hands us, then gets a trailing '/'.
// A link is in scope when its URL string starts with any of the prefixes.
// This is a plain text comparison: no dot-segment handling, no
// query-string handling.
//
// The first prefix is special: mirrored files are laid out relative to it.
// =============================================================================

use url::Url;

use crate::crawl::Domain;
use crate::error::ConfigError;
use crate::limiter::PageLimiter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    prefixes: Vec<String>,
}

impl CrawlScope {
    /// Builds a scope from raw prefixes, canonicalizing each one and adding
    /// a trailing '/' where missing.
    pub fn new<I, S>(prefixes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(|p| {
                let raw: String = p.into();
                normalize_prefix(canonical_prefix(&raw))
            })
            .collect();

        if prefixes.is_empty() {
            return Err(ConfigError::EmptyScope);
        }

        Ok(Self { prefixes })
    }

    /// The prefix mirrored paths are relative to.
    pub fn primary(&self) -> &str {
        &self.prefixes[0]
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn contains(&self, url: &str) -> bool {
        self.prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
    }

    /// More than one prefix means the crawl may cross servers.
    pub fn domain(&self) -> Domain {
        if self.prefixes.len() > 1 {
            Domain::Web
        } else {
            Domain::Server
        }
    }
}

/// The link-acceptance decision: in scope and still within budget.
///
/// Budget is only spent on links that are in scope.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scope: CrawlScope,
    limiter: PageLimiter,
}

impl ScopeFilter {
    pub fn new(scope: CrawlScope, limiter: PageLimiter) -> Self {
        Self { scope, limiter }
    }

    pub fn accept(&mut self, url: &str) -> bool {
        self.scope.contains(url) && self.limiter.try_acquire()
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    pub fn limiter(&self) -> &PageLimiter {
        &self.limiter
    }
}

/// The prefix as `Url` would print it. Text that doesn't parse as a URL is
/// kept as given and can only match literally.
pub fn canonical_prefix(prefix: &str) -> String {
    match Url::parse(prefix) {
        Ok(url) => url.to_string(),
        Err(_) => prefix.to_string(),
    }
}

fn normalize_prefix(mut prefix: String) -> String {
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_trailing_slash() {
        let scope = CrawlScope::new(["http://x/a"]).unwrap();
        assert_eq!(scope.primary(), "http://x/a/");
    }

    #[test]
    fn test_keeps_existing_slash() {
        let scope = CrawlScope::new(["http://x/a/"]).unwrap();
        assert_eq!(scope.primary(), "http://x/a/");
    }

    #[test]
    fn test_prefix_is_canonicalized_like_urls() {
        let scope = CrawlScope::new(["http://Foo.COM/do", "http://foo.com:80/re/"]).unwrap();
        assert_eq!(scope.prefixes(), ["http://foo.com/do/", "http://foo.com/re/"]);
        assert!(scope.contains(Url::parse("http://FOO.com:80/do/mi.html").unwrap().as_str()));
    }

    #[test]
    fn test_unparseable_prefix_is_kept_literally() {
        assert_eq!(canonical_prefix("not a url"), "not a url");
        // a bare host gets its root path
        assert_eq!(canonical_prefix("http://x"), "http://x/");
    }

    #[test]
    fn test_empty_scope_is_rejected() {
        let result = CrawlScope::new(Vec::<String>::new());
        assert!(matches!(result, Err(ConfigError::EmptyScope)));
    }

    #[test]
    fn test_prefix_match_is_literal() {
        let scope = CrawlScope::new(["http://x/a"]).unwrap();
        assert!(scope.contains("http://x/a/b.html"));
        assert!(!scope.contains("http://x/ab.html"));
        assert!(!scope.contains("http://x/a"));
        // no dot-segment normalization
        assert!(scope.contains("http://x/a/../secret"));
    }

    #[test]
    fn test_any_prefix_matches() {
        let scope = CrawlScope::new(["http://x/a", "http://y/b/"]).unwrap();
        assert!(scope.contains("http://y/b/c"));
        assert!(scope.contains("http://x/a/c"));
        assert!(!scope.contains("http://z/"));
    }

    #[test]
    fn test_filter_spends_budget_only_in_scope() {
        let scope = CrawlScope::new(["http://x/a"]).unwrap();
        let mut filter = ScopeFilter::new(scope, PageLimiter::new(3));

        assert!(!filter.accept("http://y/a/1"));
        assert!(filter.accept("http://x/a/1"));
        assert!(filter.accept("http://x/a/2"));
        assert!(!filter.accept("http://x/b/3"));
        assert!(filter.accept("http://x/a/3"));
        // the 4th in-scope candidate is over budget
        assert!(!filter.accept("http://x/a/4"));
        assert_eq!(filter.limiter().accepted(), 3);
    }

    #[test]
    fn test_domain_mode() {
        let single = CrawlScope::new(["http://x/a"]).unwrap();
        assert_eq!(single.domain(), Domain::Server);

        let multi = CrawlScope::new(["http://x/a", "http://y/"]).unwrap();
        assert_eq!(multi.domain(), Domain::Web);
    }
}
