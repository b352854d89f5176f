use heapless::Vec;
use log::{debug, warn};

use crate::error::Error;
use crate::topic::topics::TopicKind;

/// ping, action, group action, matrix action, accel action and one spare
pub const MAX_SUBSCRIBED_TOPICS: usize = 6;

/// Topics currently subscribed at the broker, in subscribe order.
///
/// Entries name a topic of the [`TopicSet`](crate::topic::topics::TopicSet),
/// the topic text itself stays there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    entries: Vec<TopicKind, MAX_SUBSCRIBED_TOPICS>,
}

impl SubscriptionRegistry {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, kind: TopicKind) -> Result<(), Error> {
        if self.entries.push(kind).is_err() {
            warn!("[SUB] Registry full, {kind:?} not registered");
            return Err(Error::RegistryFull {
                capacity: MAX_SUBSCRIBED_TOPICS,
            });
        }
        debug!(
            "[SUB] Registered {kind:?} ({}/{MAX_SUBSCRIBED_TOPICS})",
            self.entries.len()
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub const fn capacity(&self) -> usize {
        MAX_SUBSCRIBED_TOPICS
    }

    pub fn contains(&self, kind: TopicKind) -> bool {
        self.entries.contains(&kind)
    }

    pub fn kinds(&self) -> &[TopicKind] {
        &self.entries
    }
}
