//! Live-mode plumbing between a transport and the engine.

use crate::error::TransportError;
use crate::model::RunModel;

/// Source of refreshed run models. Implementations own any I/O and timeouts.
pub trait Transport {
    /// Poll once. `Ok(None)` means nothing new since the last poll.
    fn poll(&mut self) -> Result<Option<RunModel>, TransportError>;
}

/// Holds at most one pending model. A newer model replaces an unconsumed
/// one (last write wins); there is no queue.
#[derive(Debug, Default)]
pub struct LiveFeed {
    pending: Option<RunModel>,
    generation: u64,
    superseded: u64,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, model: RunModel) {
        self.generation += 1;
        if self.pending.replace(model).is_some() {
            self.superseded += 1;
            tracing::debug!(generation = self.generation, "pending refresh superseded");
        }
    }

    pub fn take(&mut self) -> Option<RunModel> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Models offered so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Models replaced before anyone took them.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    /// Poll `transport` once and offer whatever it returns. Transport errors
    /// are logged and swallowed; the previous data stays on screen.
    pub fn pump<T: Transport + ?Sized>(&mut self, transport: &mut T) -> bool {
        match transport.poll() {
            Ok(Some(model)) => {
                self.offer(model);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "live transport poll failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Scripted(VecDeque<Result<Option<RunModel>, TransportError>>);

    impl Transport for Scripted {
        fn poll(&mut self) -> Result<Option<RunModel>, TransportError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn titled(title: &str) -> RunModel {
        RunModel {
            title: title.into(),
            ..RunModel::default()
        }
    }

    #[test]
    fn last_write_wins() {
        let mut feed = LiveFeed::new();
        feed.offer(titled("one"));
        feed.offer(titled("two"));
        assert_eq!(feed.superseded(), 1);
        assert_eq!(feed.take().map(|m| m.title), Some("two".to_string()));
        assert!(feed.take().is_none());
    }

    #[test]
    fn pump_ignores_errors_and_empty_polls() {
        let mut transport = Scripted(VecDeque::from([
            Err(TransportError::Other("connection reset".into())),
            Ok(None),
            Ok(Some(titled("fresh"))),
        ]));
        let mut feed = LiveFeed::new();
        assert!(!feed.pump(&mut transport));
        assert!(!feed.pump(&mut transport));
        assert!(feed.pump(&mut transport));
        assert_eq!(feed.generation(), 1);
        assert_eq!(feed.take().map(|m| m.title), Some("fresh".to_string()));
    }
}
