//! Typed combat events and the ring-buffer event queue.

use serde::{Deserialize, Serialize};

use skillgraph_core::combat::{DamageKind, UnitId};

/// The closed union of event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Cast {
        caster: UnitId,
    },
    Hit {
        source: UnitId,
        target: UnitId,
        base_damage: i32,
        damage: DamageKind,
    },
}

impl EventKind {
    /// Registration key for the plan lookup table.
    pub fn key(&self) -> EventKey {
        match self {
            EventKind::Cast { .. } => EventKey::Cast,
            EventKind::Hit { .. } => EventKey::Hit,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Cast { .. } => "Cast",
            EventKind::Hit { .. } => "Hit",
        }
    }

    /// The acting unit.
    pub fn caster(&self) -> UnitId {
        match self {
            EventKind::Cast { caster } => *caster,
            EventKind::Hit { source, .. } => *source,
        }
    }

    /// The affected unit, where the event kind has one.
    pub fn target(&self) -> Option<UnitId> {
        match self {
            EventKind::Cast { .. } => None,
            EventKind::Hit { target, .. } => Some(*target),
        }
    }
}

/// Lookup key per concrete event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKey {
    Cast,
    Hit,
}

/// An enqueued event plus its trigger-chain metadata. Created on enqueue,
/// consumed exactly once on dequeue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Correlates every event spawned from the same initial action.
    pub root_event_id: u32,
    /// Monotone depth along the trigger chain.
    pub trigger_depth: u32,
    /// Deterministic seed for this event's execution.
    pub random_seed: u32,
    pub payload: EventKind,
}

/// FIFO event queue over a ring buffer.
///
/// Doubles capacity when full, preserving FIFO order across the resize:
/// when the live region wraps, head..end is copied first, then start..tail.
#[derive(Debug)]
pub struct EventQueue {
    buffer: Box<[Option<EventEnvelope>]>,
    head: usize,
    len: usize,
}

impl EventQueue {
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(1);
        EventQueue {
            buffer: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn enqueue(&mut self, envelope: EventEnvelope) {
        if self.len == self.buffer.len() {
            self.resize(self.buffer.len() * 2);
        }
        let tail = (self.head + self.len) % self.buffer.len();
        self.buffer[tail] = Some(envelope);
        self.len += 1;
    }

    pub fn try_dequeue(&mut self) -> Option<EventEnvelope> {
        if self.len == 0 {
            return None;
        }
        let envelope = self.buffer[self.head].take();
        self.head = (self.head + 1) % self.buffer.len();
        self.len -= 1;
        envelope
    }

    fn resize(&mut self, new_capacity: usize) {
        let mut grown: Vec<Option<EventEnvelope>> = (0..new_capacity).map(|_| None).collect();

        let capacity = self.buffer.len();
        let first_run = (capacity - self.head).min(self.len);
        for i in 0..first_run {
            grown[i] = self.buffer[self.head + i].take();
        }
        // Wrapped remainder sits at the start of the old buffer.
        for i in 0..(self.len - first_run) {
            grown[first_run + i] = self.buffer[i].take();
        }

        self.buffer = grown.into_boxed_slice();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_envelope(root: u32, depth: u32) -> EventEnvelope {
        EventEnvelope {
            root_event_id: root,
            trigger_depth: depth,
            random_seed: 42,
            payload: EventKind::Hit {
                source: UnitId(1),
                target: UnitId(2),
                base_damage: 10,
                damage: DamageKind::Physical,
            },
        }
    }

    #[test]
    fn event_kind_accessors() {
        let cast = EventKind::Cast { caster: UnitId(3) };
        assert_eq!(cast.key(), EventKey::Cast);
        assert_eq!(cast.caster(), UnitId(3));
        assert_eq!(cast.target(), None);

        let hit = EventKind::Hit {
            source: UnitId(1),
            target: UnitId(2),
            base_damage: 5,
            damage: DamageKind::Cold,
        };
        assert_eq!(hit.key(), EventKey::Hit);
        assert_eq!(hit.caster(), UnitId(1));
        assert_eq!(hit.target(), Some(UnitId(2)));
    }

    #[test]
    fn fifo_order() {
        let mut queue = EventQueue::new(4);
        for root in 1..=3 {
            queue.enqueue(hit_envelope(root, 0));
        }
        assert_eq!(queue.len(), 3);
        for root in 1..=3 {
            assert_eq!(queue.try_dequeue().unwrap().root_event_id, root);
        }
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut queue = EventQueue::new(2);
        for root in 1..=9 {
            queue.enqueue(hit_envelope(root, 0));
        }
        assert_eq!(queue.len(), 9);
        for root in 1..=9 {
            assert_eq!(queue.try_dequeue().unwrap().root_event_id, root);
        }
    }

    #[test]
    fn resize_preserves_fifo_across_wrap() {
        let mut queue = EventQueue::new(4);
        // Advance head so the live region wraps the buffer end.
        for root in 1..=4 {
            queue.enqueue(hit_envelope(root, 0));
        }
        assert_eq!(queue.try_dequeue().unwrap().root_event_id, 1);
        assert_eq!(queue.try_dequeue().unwrap().root_event_id, 2);
        for root in 5..=8 {
            queue.enqueue(hit_envelope(root, 0));
        }

        // 3..=8 are live and the buffer has wrapped and resized.
        for root in 3..=8 {
            assert_eq!(queue.try_dequeue().unwrap().root_event_id, root);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut queue = EventQueue::new(0);
        queue.enqueue(hit_envelope(1, 0));
        assert_eq!(queue.try_dequeue().unwrap().root_event_id, 1);
    }
}
