//! Event notifications for rendering and logging collaborators
//!
//! The session publishes here instead of calling into whoever draws the
//! overlay; the consumer drains the queue after each frame.

use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

use crate::association::ViolationRecord;
use crate::counting::CrossingEvent;
use crate::sink::EvidencePaths;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Crossing(CrossingEvent),

    Violation(ViolationRecord),

    EvidenceSaved {
        frame_index: u64,
        paths: EvidencePaths,
    },
}

impl SessionEvent {
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::Crossing(event) => event.frame_index,
            Self::Violation(record) => record.frame_index,
            Self::EvidenceSaved { frame_index, .. } => *frame_index,
        }
    }
}

/// Bounded queue; the oldest event is dropped when full
pub struct EventBus {
    events: VecDeque<SessionEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: SessionEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    /// Events lost to overflow since the bus was created
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadwatch_core::BBox;

    fn violation(frame_index: u64) -> SessionEvent {
        SessionEvent::Violation(ViolationRecord {
            frame_index,
            carrier: BBox::new(0, 0, 10, 10),
            identifier: BBox::new(4, 4, 6, 6),
            carrier_track: None,
        })
    }

    #[test]
    fn test_publish_and_drain() {
        let mut bus = EventBus::new(8);
        bus.publish(violation(1));
        bus.publish(violation(2));
        assert_eq!(bus.pending_count(), 2);

        let drained = bus.drain();
        assert_eq!(drained.iter().map(|e| e.frame_index()).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut bus = EventBus::new(2);
        for frame in 1..=4 {
            bus.publish(violation(frame));
        }
        assert_eq!(bus.dropped(), 2);
        let frames: Vec<u64> = bus.drain().iter().map(|e| e.frame_index()).collect();
        assert_eq!(frames, vec![3, 4]);
    }

    #[test]
    fn test_event_json_tag() {
        let json = serde_json::to_string(&violation(9)).unwrap();
        assert!(json.starts_with(r#"{"kind":"violation","frame_index":9"#));
    }
}
