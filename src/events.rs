// src/events.rs
// =============================================================================
// Crawl lifecycle events and the observers that consume them.
//
// The engine reports what it is doing as CrawlEvent values. Anything that
// implements CrawlObserver can be registered with the engine through
// add_listener(); the core never writes to stdout or a log directly.
//
// Observers shipped here:
// - TracingObserver: forwards events to `tracing` (the default in main.rs)
// - RecordingObserver: keeps events in memory, handy for tests and reports
// =============================================================================

use std::sync::{Arc, Mutex};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    CrawlStarted { root: String },
    /// The acceptance hook said yes; the link is queued for fetch.
    LinkAccepted { url: String, depth: usize },
    /// The acceptance hook said no.
    LinkRejected { url: String },
    /// Dropped by the engine itself before the hook.
    LinkSkipped { url: String, reason: SkipReason },
    PageVisited { url: String },
    FetchFailed { url: String, error: String },
    CrawlFinished { pages_visited: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OtherServer,
}

pub trait CrawlObserver {
    fn on_event(&mut self, event: &CrawlEvent);
}

#[derive(Debug, Default)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn on_event(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::CrawlStarted { root } => tracing::info!(%root, "crawl started"),
            CrawlEvent::LinkAccepted { url, depth } => {
                tracing::debug!(%url, depth, "link accepted")
            }
            CrawlEvent::LinkRejected { url } => tracing::debug!(%url, "link rejected"),
            CrawlEvent::LinkSkipped { url, reason } => {
                tracing::trace!(%url, ?reason, "link skipped")
            }
            CrawlEvent::PageVisited { url } => tracing::info!(%url, "page mirrored"),
            CrawlEvent::FetchFailed { url, error } => {
                tracing::warn!(%url, %error, "failed to fetch page")
            }
            CrawlEvent::CrawlFinished { pages_visited } => {
                tracing::info!(pages_visited, "crawl finished")
            }
        }
    }
}

/// Stores every event it sees. Clones share the same buffer, so a test can
/// hand one clone to the engine and read events back through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<CrawlEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CrawlObserver for RecordingObserver {
    fn on_event(&mut self, event: &CrawlEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_shares_buffer() {
        let recorder = RecordingObserver::new();
        let mut handle = recorder.clone();

        handle.on_event(&CrawlEvent::CrawlStarted {
            root: "http://x/".to_string(),
        });
        handle.on_event(&CrawlEvent::CrawlFinished { pages_visited: 0 });

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            CrawlEvent::CrawlFinished { pages_visited: 0 }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = CrawlEvent::LinkSkipped {
            url: "http://y/".to_string(),
            reason: SkipReason::OtherServer,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "link_skipped");
        assert_eq!(json["reason"], "other_server");
    }
}
