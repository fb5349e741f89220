use std::collections::BTreeSet;

/// A recorded state change.
///
/// `seq` is assigned by the bus and increases by one per emitted event, so
/// consumers can order changes recorded across several drains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<K> {
    pub seq: u64,
    pub kind: K,
    pub message: String,
}

/// Append-only queue of change events, drained by whoever reacts to them.
#[derive(Debug)]
pub struct EventBus<K> {
    events: Vec<Event<K>>,
    next_seq: u64,
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K> EventBus<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: K, message: impl Into<String>) {
        self.events.push(Event {
            seq: self.next_seq,
            kind,
            message: message.into(),
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> &[Event<K>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<K>> {
        std::mem::take(&mut self.events)
    }
}

impl<K: Ord + Copy> EventBus<K> {
    /// Drains pending events and returns each distinct kind once, in `K`'s
    /// order rather than emission order.
    pub fn drain_kinds(&mut self) -> BTreeSet<K> {
        self.drain().into_iter().map(|e| e.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Kind {
        First,
        Second,
    }

    #[test]
    fn records_events_with_sequence_numbers() {
        let mut bus = EventBus::new();
        bus.emit(Kind::Second, "hello");
        bus.emit(Kind::First, "world");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[0].seq, 0);
        assert_eq!(bus.events()[1].seq, 1);
    }

    #[test]
    fn drain_clears_events_but_keeps_counting() {
        let mut bus = EventBus::new();
        bus.emit(Kind::First, "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
        bus.emit(Kind::First, "m");
        assert_eq!(bus.events()[0].seq, 1);
    }

    #[test]
    fn drain_kinds_dedups_and_orders() {
        let mut bus = EventBus::new();
        bus.emit(Kind::Second, "a");
        bus.emit(Kind::First, "b");
        bus.emit(Kind::Second, "c");
        let kinds: Vec<Kind> = bus.drain_kinds().into_iter().collect();
        assert_eq!(kinds, vec![Kind::First, Kind::Second]);
        assert!(bus.is_empty());
    }
}
