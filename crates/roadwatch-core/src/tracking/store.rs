//! Per-track position history and counted flags

use std::collections::HashMap;
use tracing::debug;

use crate::detection::TrackId;
use crate::geometry::Point;

/// What the store remembers about one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRecord {
    /// `None` only for a track flagged before it was ever observed
    pub last_centroid: Option<Point>,
    /// Goes false → true at most once
    pub counted: bool,
    /// Frame index of the most recent `observe` or `mark_counted`
    pub last_seen: u64,
}

/// Session-scoped track history
///
/// Grows without bound unless an idle limit is configured with
/// [`TrackStore::with_max_idle`]. Evicting a track also forgets that it was
/// counted, so a tracker that reuses the id later can count it again.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    records: HashMap<TrackId, TrackRecord>,
    current_frame: u64,
    max_idle: Option<u64>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop tracks not seen for more than `frames` frames
    pub fn with_max_idle(mut self, frames: u64) -> Self {
        self.max_idle = Some(frames);
        self
    }

    pub fn max_idle(&self) -> Option<u64> {
        self.max_idle
    }

    /// Advance to `frame_index` and apply the eviction policy
    ///
    /// Returns how many tracks were evicted.
    pub fn begin_frame(&mut self, frame_index: u64) -> usize {
        self.current_frame = frame_index;

        let Some(max_idle) = self.max_idle else {
            return 0;
        };

        let before = self.records.len();
        self.records
            .retain(|_, record| frame_index.saturating_sub(record.last_seen) <= max_idle);
        let evicted = before - self.records.len();

        if evicted > 0 {
            debug!(
                "Evicted {} idle tracks at frame {} ({} remain)",
                evicted,
                frame_index,
                self.records.len()
            );
        }
        evicted
    }

    /// Record `centroid` as the latest position of `track_id`
    ///
    /// Returns the previous position, or `None` on the first sighting.
    pub fn observe(&mut self, track_id: TrackId, centroid: Point) -> Option<Point> {
        let frame = self.current_frame;
        let record = self.records.entry(track_id).or_insert(TrackRecord {
            last_centroid: None,
            counted: false,
            last_seen: frame,
        });

        record.last_seen = frame;
        record.last_centroid.replace(centroid)
    }

    /// Unknown tracks read as not counted
    pub fn is_counted(&self, track_id: TrackId) -> bool {
        self.records
            .get(&track_id)
            .is_some_and(|record| record.counted)
    }

    /// Set the counted flag; returns true only when it was newly set
    pub fn mark_counted(&mut self, track_id: TrackId) -> bool {
        let frame = self.current_frame;
        let record = self.records.entry(track_id).or_insert(TrackRecord {
            last_centroid: None,
            counted: false,
            last_seen: frame,
        });

        let newly = !record.counted;
        record.counted = true;
        record.last_seen = frame;
        newly
    }

    pub fn get(&self, track_id: TrackId) -> Option<&TrackRecord> {
        self.records.get(&track_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counted_tracks(&self) -> usize {
        self.records.values().filter(|r| r.counted).count()
    }
}
