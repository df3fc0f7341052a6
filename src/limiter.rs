// src/limiter.rs
// =============================================================================
// Page budget for the crawl.
//
// Every link the scope filter accepts takes one unit of budget. Once the
// budget is spent, every later decision is "no". The count is taken when a
// link is accepted, not when its page is written, so it bounds the number of
// pages *queued for fetch*. A fetch that fails still used its unit.
// =============================================================================

pub const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Debug, Clone)]
pub struct PageLimiter {
    accepted: usize,
    max_pages: usize,
}

impl PageLimiter {
    pub fn new(max_pages: usize) -> Self {
        Self {
            accepted: 0,
            max_pages,
        }
    }

    /// Takes one unit of budget if any is left.
    pub fn try_acquire(&mut self) -> bool {
        if self.accepted < self.max_pages {
            self.accepted += 1;
            true
        } else {
            false
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.accepted >= self.max_pages
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

impl Default for PageLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}
