//! Change notification for view layers.

use std::fmt;

/// What changed in the document controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Emoji or background reference changed (and was persisted).
    DocumentChanged,
    /// Selection membership changed.
    SelectionChanged,
    /// The decoded background image was cleared or replaced.
    BackgroundChanged,
}

/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ChangeEvent)>;

/// Registry of change subscribers, called in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn notify(&mut self, event: ChangeEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
