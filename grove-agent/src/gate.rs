use std::collections::BTreeMap;

/// Per-actor debounce for externally triggered events.
///
/// Independent of the tick loop: callers supply wall-clock milliseconds, so
/// the gate itself holds no clock and replays deterministically in tests.
#[derive(Debug, Clone, Default)]
pub struct InteractionGate {
    last_accepted_ms: BTreeMap<u64, u64>,
}

impl InteractionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a trigger at `now_ms` falls inside the debounce window opened
    /// by the actor's last accepted trigger.
    pub fn is_debounced(&self, actor: u64, now_ms: u64, window_ms: u64) -> bool {
        match self.last_accepted_ms.get(&actor) {
            Some(&last) => now_ms.saturating_sub(last) < window_ms,
            None => false,
        }
    }

    /// Record an accepted trigger for the actor.
    pub fn debounce(&mut self, actor: u64, now_ms: u64) {
        self.last_accepted_ms.insert(actor, now_ms);
    }

    /// Accept-or-reject in one call: records the trigger only when accepted.
    pub fn try_accept(&mut self, actor: u64, now_ms: u64, window_ms: u64) -> bool {
        if self.is_debounced(actor, now_ms, window_ms) {
            return false;
        }
        self.debounce(actor, now_ms);
        true
    }
}
