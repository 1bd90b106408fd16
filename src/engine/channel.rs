//! Channels between the engine and its collaborators.
//!
//! `OutputChannel` carries compiled output to the list view or request
//! builder. `UpstreamInbox` carries fresh unfiltered payloads from the list
//! loader to the engine.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::query::{QueryParams, ResultPage};

/// What the engine publishes after each compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// Client mode: the filtered page.
    Page(ResultPage),
    /// Server mode: parameters for the remote query.
    Params(QueryParams),
    /// Server mode with nothing to filter on. Distinct from "no output yet".
    NoParams,
}

type Subscriber = Box<dyn FnMut(&EngineOutput) + Send>;

#[derive(Default)]
struct ChannelInner {
    latest: Option<EngineOutput>,
    published: u64,
    subscribers: Vec<Subscriber>,
}

/// Latest-value channel with push notification. Clones share state.
#[derive(Clone, Default)]
pub struct OutputChannel {
    inner: Arc<Mutex<ChannelInner>>,
}

impl OutputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback run on every publish.
    pub fn subscribe(&self, subscriber: impl FnMut(&EngineOutput) + Send + 'static) {
        self.inner.lock().subscribers.push(Box::new(subscriber));
    }

    pub fn publish(&self, output: EngineOutput) {
        // Subscribers run without the lock held so they may read the channel.
        let mut subscribers = {
            let mut inner = self.inner.lock();
            inner.latest = Some(output.clone());
            inner.published += 1;
            std::mem::take(&mut inner.subscribers)
        };

        for subscriber in subscribers.iter_mut() {
            subscriber(&output);
        }

        let mut inner = self.inner.lock();
        subscribers.append(&mut inner.subscribers);
        inner.subscribers = subscribers;
    }

    pub fn latest(&self) -> Option<EngineOutput> {
        self.inner.lock().latest.clone()
    }

    /// Number of publishes so far.
    pub fn published(&self) -> u64 {
        self.inner.lock().published
    }
}

impl std::fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("OutputChannel")
            .field("latest", &inner.latest)
            .field("published", &inner.published)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Holds the most recent unfiltered payload until the engine adopts it.
/// Later pushes replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct UpstreamInbox {
    pending: Arc<Mutex<Option<ResultPage>>>,
}

impl UpstreamInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, page: ResultPage) {
        *self.pending.lock() = Some(page);
    }

    pub fn take(&self) -> Option<ResultPage> {
        self.pending.lock().take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_notifies_and_keeps_latest() {
        let channel = OutputChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        channel.subscribe(move |out| sink.lock().push(out.clone()));

        assert!(channel.latest().is_none());
        channel.publish(EngineOutput::NoParams);
        channel.publish(EngineOutput::Page(ResultPage::from_results(vec![json!({"id": 1})])));

        assert_eq!(channel.published(), 2);
        assert_eq!(seen.lock().len(), 2);
        assert!(matches!(channel.latest(), Some(EngineOutput::Page(p)) if p.count == 1));
    }

    #[test]
    fn test_subscriber_may_read_channel() {
        let channel = OutputChannel::new();
        let reader = channel.clone();
        let seen = Arc::new(Mutex::new(0u64));
        let sink = seen.clone();
        channel.subscribe(move |_| *sink.lock() = reader.published());

        channel.publish(EngineOutput::NoParams);
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_inbox_latest_wins() {
        let inbox = UpstreamInbox::new();
        inbox.push(ResultPage::new(1, vec![]));
        inbox.push(ResultPage::new(2, vec![]));

        assert!(inbox.has_pending());
        assert_eq!(inbox.take().map(|p| p.count), Some(2));
        assert!(inbox.take().is_none());
    }
}
