//! The enable/disable state machine shared by every component instance.
//!
//! An instance is *effective-enabled* when its own explicit flag and its
//! owning entity's flag are both set. [`Lifecycle`] owns the explicit flag and
//! decides, for each request, which [`Transition`] the scene must carry out:
//! joining or leaving the per-type collection and running the matching hook.

use crate::events::{ComponentEvent, Listeners};

/// Side effect required by a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Effective state did not change; nothing to do.
    Unchanged,
    /// Append to the scene collection, run `on_enable`, publish `Enabled`.
    Enabled,
    /// Remove from the scene collection, run `on_disable`, publish `Disabled`.
    Disabled,
    /// Enable was requested while the owning entity is disabled. State is
    /// unchanged; the caller reports a warning.
    Blocked,
}

impl Transition {
    /// The event published for this transition, if any.
    #[must_use]
    pub fn event(self) -> Option<ComponentEvent> {
        match self {
            Self::Enabled => Some(ComponentEvent::Enabled),
            Self::Disabled => Some(ComponentEvent::Disabled),
            Self::Unchanged | Self::Blocked => None,
        }
    }
}

/// Explicit enabled flag plus subscriber list of one instance.
#[derive(Debug)]
pub struct Lifecycle {
    explicit: bool,
    listeners: Listeners,
}

impl Lifecycle {
    /// New instances start explicitly enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            explicit: true,
            listeners: Listeners::new(),
        }
    }

    #[must_use]
    pub fn is_explicitly_enabled(&self) -> bool {
        self.explicit
    }

    /// Effective-enabled given the owning entity's flag.
    #[must_use]
    pub fn is_enabled(&self, entity_enabled: bool) -> bool {
        self.explicit && entity_enabled
    }

    /// Handle a request to set the instance's enabled property.
    ///
    /// Setting the current effective value is a no-op. Enabling under a
    /// disabled entity is [`Transition::Blocked`] and leaves the flag alone.
    pub fn request(&mut self, value: bool, entity_enabled: bool) -> Transition {
        if value == self.is_enabled(entity_enabled) {
            return Transition::Unchanged;
        }
        if value && !entity_enabled {
            return Transition::Blocked;
        }
        self.explicit = value;
        if value {
            Transition::Enabled
        } else {
            Transition::Disabled
        }
    }

    /// Effective change caused by the owning entity's flag flipping from
    /// `was` to `now`. The explicit flag is never touched, so toggling the
    /// entity back restores the previous state exactly.
    #[must_use]
    pub fn entity_toggled(&self, was: bool, now: bool) -> Transition {
        match (self.is_enabled(was), self.is_enabled(now)) {
            (false, true) => Transition::Enabled,
            (true, false) => Transition::Disabled,
            _ => Transition::Unchanged,
        }
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_current_value_is_noop() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.request(true, true), Transition::Unchanged);
        assert!(lc.is_explicitly_enabled());
    }

    #[test]
    fn test_disable_then_enable() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.request(false, true), Transition::Disabled);
        assert!(!lc.is_explicitly_enabled());
        assert_eq!(lc.request(true, true), Transition::Enabled);
        assert!(lc.is_enabled(true));
    }

    #[test]
    fn test_enable_on_disabled_entity_blocked() {
        let mut lc = Lifecycle::new();
        lc.request(false, true);
        assert_eq!(lc.request(true, false), Transition::Blocked);
        assert!(!lc.is_explicitly_enabled());
    }

    #[test]
    fn test_disable_request_under_disabled_entity_is_noop() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.request(false, false), Transition::Unchanged);
        assert!(lc.is_explicitly_enabled());
    }

    #[test]
    fn test_entity_toggle_preserves_explicit_flag() {
        let lc = Lifecycle::new();
        assert_eq!(lc.entity_toggled(true, false), Transition::Disabled);
        assert_eq!(lc.entity_toggled(false, true), Transition::Enabled);
        assert!(lc.is_explicitly_enabled());

        let mut off = Lifecycle::new();
        off.request(false, true);
        assert_eq!(off.entity_toggled(true, false), Transition::Unchanged);
        assert_eq!(off.entity_toggled(false, true), Transition::Unchanged);
    }

    #[test]
    fn test_transition_events() {
        assert_eq!(Transition::Enabled.event(), Some(ComponentEvent::Enabled));
        assert_eq!(Transition::Blocked.event(), None);
    }
}
