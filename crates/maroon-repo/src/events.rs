use maroon_dag::Index;
use maroon_types::ContentHash;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of the timeline broadcast channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// Change notifications for whatever is drawing the timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimelineEvent {
    /// A new index snapshot was persisted for `identity`.
    IndexChanged { identity: String, index: Index },
    /// The head of `identity` now points at `head`.
    HeadChanged { identity: String, head: ContentHash },
    /// The repository of `identity` was deleted or moved away.
    Removed { identity: String },
}

impl TimelineEvent {
    pub fn identity(&self) -> &str {
        match self {
            Self::IndexChanged { identity, .. }
            | Self::HeadChanged { identity, .. }
            | Self::Removed { identity } => identity,
        }
    }
}

/// A broadcast channel receiver for timeline events.
pub type EventStream = broadcast::Receiver<TimelineEvent>;

/// Fan-out of timeline events to any number of subscribers.
///
/// Cloning shares the underlying channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<TimelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventStream {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver an event to current subscribers. Having none is fine.
    pub fn publish(&self, event: TimelineEvent) {
        if self.sender.send(event).is_err() {
            debug!("timeline event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(TimelineEvent::HeadChanged {
            identity: "/a.txt".into(),
            head: maroon_crypto::hash(b"a"),
        });
    }

    #[test]
    fn subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let index = Index::build(b"hello");
        bus.publish(TimelineEvent::IndexChanged {
            identity: "/a.txt".into(),
            index: index.clone(),
        });
        bus.publish(TimelineEvent::HeadChanged {
            identity: "/a.txt".into(),
            head: index.head(),
        });

        match rx.try_recv().unwrap() {
            TimelineEvent::IndexChanged { identity, index: got } => {
                assert_eq!(identity, "/a.txt");
                assert_eq!(got, index);
            }
            other => panic!("unexpected {other:?}"),
        }
        let second = rx.try_recv().unwrap();
        assert_eq!(second.identity(), "/a.txt");
        assert!(matches!(second, TimelineEvent::HeadChanged { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.clone().publish(TimelineEvent::HeadChanged {
            identity: "/b.txt".into(),
            head: maroon_crypto::hash(b"b"),
        });
        assert!(rx.try_recv().is_ok());
    }
}
