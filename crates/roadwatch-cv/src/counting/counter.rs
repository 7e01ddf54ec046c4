//! Exactly-once line crossing counter

use roadwatch_core::{
    ClassId, ClassTable, CountingLine, Detection, Point, TrackId, TrackStore,
};
use serde::Serialize;
use tracing::{debug, info};

use super::aggregate::CountAggregate;

/// A tracked object's centroid path crossed the counting line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossingEvent {
    pub frame_index: u64,
    pub track_id: TrackId,
    pub class_id: ClassId,
    pub class_name: String,
    /// Centroid in the previous frame the track was seen
    pub from: Point,
    /// Centroid in this frame
    pub to: Point,
    /// Class total after this crossing
    pub class_total: u64,
}

/// Counts each track at most once when its centroid path crosses the line
#[derive(Debug, Clone, Default)]
pub struct LineCrossingCounter {
    tracks: TrackStore,
    counts: CountAggregate,
}

impl LineCrossingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured store (e.g. one with an idle eviction limit)
    pub fn with_store(tracks: TrackStore) -> Self {
        Self {
            tracks,
            counts: CountAggregate::new(),
        }
    }

    pub fn counts(&self) -> &CountAggregate {
        &self.counts
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    /// Evaluate one frame's counted-class detections against `line`
    ///
    /// Detections without a track id are skipped. The returned events are in
    /// detection order; the resulting totals do not depend on that order.
    pub fn process(
        &mut self,
        frame_index: u64,
        line: &CountingLine,
        detections: &[Detection],
        table: &ClassTable,
    ) -> Vec<CrossingEvent> {
        self.tracks.begin_frame(frame_index);

        let mut events = Vec::new();
        let mut untracked = 0usize;

        for detection in detections {
            let Some(track_id) = detection.track_id else {
                untracked += 1;
                continue;
            };

            let class_name = table
                .name(detection.class_id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("class_{}", detection.class_id));

            if let Some(event) =
                self.evaluate(frame_index, line, track_id, detection, class_name)
            {
                events.push(event);
            }
        }

        if untracked > 0 {
            debug!(
                "Frame {}: skipped {} detections without a track id",
                frame_index, untracked
            );
        }
        events
    }

    fn evaluate(
        &mut self,
        frame_index: u64,
        line: &CountingLine,
        track_id: TrackId,
        detection: &Detection,
        class_name: String,
    ) -> Option<CrossingEvent> {
        let current = detection.center();
        let previous = self.tracks.observe(track_id, current)?;

        if self.tracks.is_counted(track_id) || !line.is_crossed_by(previous, current) {
            return None;
        }

        let class_total = self.counts.increment(&class_name);
        self.tracks.mark_counted(track_id);

        info!(
            "Track {} ({}) crossed the line at frame {}: {} -> {} (total {})",
            track_id, class_name, frame_index, previous, current, class_total
        );

        Some(CrossingEvent {
            frame_index,
            track_id,
            class_id: detection.class_id,
            class_name,
            from: previous,
            to: current,
            class_total,
        })
    }
}
