use roadwatch_core::TrackId;
use std::collections::HashMap;
use tracing::debug;

use super::engine::ViolationRecord;

/// Optional session-level filter: one record per carrier track
///
/// The association engine itself reports a persisting violation once per
/// frame. When enabled, this keeps only the first record for each carrier
/// track id. Carriers without a track id cannot be recognised across frames
/// and always pass.
///
/// Follows the same idle policy as the track store: with
/// [`ViolationDeduplicator::with_max_idle`], a carrier not seen for more than
/// that many frames is forgotten and may be reported again. Without it the
/// set of reported tracks only grows.
#[derive(Debug, Clone, Default)]
pub struct ViolationDeduplicator {
    /// Reported carrier track -> last frame it was seen as a carrier
    reported: HashMap<TrackId, u64>,
    max_idle: Option<u64>,
}

impl ViolationDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_idle(mut self, frames: u64) -> Self {
        self.max_idle = Some(frames);
        self
    }

    /// Refresh the carriers present in `frame_index` and drop idle ones
    ///
    /// Returns how many reported tracks were forgotten.
    pub fn begin_frame<I>(&mut self, frame_index: u64, carriers: I) -> usize
    where
        I: IntoIterator<Item = TrackId>,
    {
        let mut forgotten = 0;
        if let Some(max_idle) = self.max_idle {
            let before = self.reported.len();
            self.reported
                .retain(|_, last_seen| frame_index.saturating_sub(*last_seen) <= max_idle);
            forgotten = before - self.reported.len();
        }
        if forgotten > 0 {
            debug!(
                "Frame {}: forgot {} idle reported carriers",
                frame_index, forgotten
            );
        }

        for track_id in carriers {
            if let Some(last_seen) = self.reported.get_mut(&track_id) {
                *last_seen = frame_index;
            }
        }
        forgotten
    }

    /// Whether `record` should be emitted; remembers its carrier if so
    pub fn admit(&mut self, record: &ViolationRecord) -> bool {
        let Some(track_id) = record.carrier_track else {
            return true;
        };

        match self.reported.insert(track_id, record.frame_index) {
            Some(_) => false,
            None => true,
        }
    }

    pub fn reported_tracks(&self) -> usize {
        self.reported.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadwatch_core::BBox;

    fn record(frame_index: u64, carrier_track: Option<TrackId>) -> ViolationRecord {
        ViolationRecord {
            frame_index,
            carrier: BBox::new(0, 0, 10, 10),
            identifier: BBox::new(2, 2, 4, 4),
            carrier_track,
        }
    }

    #[test]
    fn test_first_record_per_track_admitted() {
        let mut dedup = ViolationDeduplicator::new();
        assert!(dedup.admit(&record(1, Some(4))));
        assert!(!dedup.admit(&record(2, Some(4))));
        assert!(dedup.admit(&record(2, Some(5))));
        assert_eq!(dedup.reported_tracks(), 2);
    }

    #[test]
    fn test_untracked_always_admitted() {
        let mut dedup = ViolationDeduplicator::new();
        assert!(dedup.admit(&record(1, None)));
        assert!(dedup.admit(&record(2, None)));
        assert_eq!(dedup.reported_tracks(), 0);
    }

    #[test]
    fn test_no_forgetting_by_default() {
        let mut dedup = ViolationDeduplicator::new();
        assert!(dedup.admit(&record(1, Some(4))));
        assert_eq!(dedup.begin_frame(10_000, []), 0);
        assert!(!dedup.admit(&record(10_000, Some(4))));
    }

    #[test]
    fn test_idle_carrier_forgotten() {
        let mut dedup = ViolationDeduplicator::new().with_max_idle(2);
        dedup.begin_frame(1, [4]);
        assert!(dedup.admit(&record(1, Some(4))));

        // still visible, just not violating
        dedup.begin_frame(3, [4]);
        assert_eq!(dedup.begin_frame(5, [4]), 0);

        // out of view for frames 6..=7, back at 8
        assert_eq!(dedup.begin_frame(8, [4]), 1);
        assert_eq!(dedup.reported_tracks(), 0);
        assert!(dedup.admit(&record(8, Some(4))));
    }
}
