//! Per-instance notifications.
//!
//! Every component instance carries a [`Listeners`] list. The scene publishes
//! a [`ComponentEvent`] after each enable/disable transition and once on
//! removal, synchronously and in subscription order.

/// A lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentEvent {
    /// The instance became effective-enabled.
    Enabled,
    /// The instance stopped being effective-enabled.
    Disabled,
    /// The instance was torn down and detached from its entity.
    Removed,
}

/// Handle returned by [`Listeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(ComponentEvent)>;

/// Subscriber list of one component instance.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future event.
    pub fn subscribe(&mut self, callback: impl FnMut(ComponentEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Deliver `event` to every subscriber.
    pub fn publish(&mut self, event: ComponentEvent) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}
