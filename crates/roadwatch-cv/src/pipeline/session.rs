//! Per-video processing context

use image::RgbImage;
use roadwatch_core::{ClassTable, CountingLine, Frame, TrackStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::events::{EventBus, SessionEvent};
use crate::Result;
use crate::association::{AssociationEngine, ViolationDeduplicator, ViolationRecord};
use crate::counting::{CountAggregate, CrossingEvent, LineCrossingCounter};
use crate::sink::{CountFile, EvidenceDir};
use crate::traits::{CountSink, EvidenceSink};

/// What one call to [`Session::process_frame`] produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub crossings: Vec<CrossingEvent>,
    pub violations: Vec<ViolationRecord>,
    pub rejected: usize,
    pub evidence_failures: usize,
    pub count_write_failed: bool,
}

/// Running totals over the whole session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub crossings: u64,
    pub violations: u64,
    pub rejected_detections: u64,
    pub evidence_saved: u64,
    pub evidence_failures: u64,
    pub count_write_failures: u64,
}

/// All mutable state for one video source
///
/// Frames must be fed in order, one at a time. Nothing here is shared, so
/// several sessions can run side by side for different sources.
pub struct Session {
    config: SessionConfig,
    classes: ClassTable,
    counter: LineCrossingCounter,
    dedup: Option<ViolationDeduplicator>,
    count_sink: Option<Box<dyn CountSink>>,
    evidence_sink: Option<Box<dyn EvidenceSink>>,
    events: EventBus,
    stats: SessionStats,
    last_frame: Option<u64>,
}

impl Session {
    /// Session without sinks; events and counts stay in memory
    pub fn new(config: SessionConfig, classes: ClassTable) -> Self {
        let tracks = match config.counting.max_idle_frames {
            Some(frames) => TrackStore::new().with_max_idle(frames),
            None => TrackStore::new(),
        };
        let dedup = config.violation.dedup_by_track.then(|| {
            match config.counting.max_idle_frames {
                Some(frames) => ViolationDeduplicator::new().with_max_idle(frames),
                None => ViolationDeduplicator::new(),
            }
        });
        let events = EventBus::new(config.events.max_pending);

        Self {
            config,
            classes,
            counter: LineCrossingCounter::with_store(tracks),
            dedup,
            count_sink: None,
            evidence_sink: None,
            events,
            stats: SessionStats::default(),
            last_frame: None,
        }
    }

    /// Session writing to the files named in `config`
    ///
    /// Only the sinks the configured mode needs are created.
    pub fn from_config(config: SessionConfig, classes: ClassTable) -> Result<Self> {
        let mut session = Self::new(config, classes);

        if session.config.mode.counts() {
            let sink = CountFile::new(session.config.counting.counts_file.clone());
            session = session.with_count_sink(sink);
        }
        if session.config.mode.associates() {
            let sink = EvidenceDir::create(
                session.config.violation.evidence_dir.clone(),
                session.config.violation.image_format,
            )?;
            session = session.with_evidence_sink(sink);
        }

        Ok(session)
    }

    pub fn with_count_sink(mut self, sink: impl CountSink + 'static) -> Self {
        self.count_sink = Some(Box::new(sink));
        self
    }

    pub fn with_evidence_sink(mut self, sink: impl EvidenceSink + 'static) -> Self {
        self.evidence_sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn counts(&self) -> &CountAggregate {
        self.counter.counts()
    }

    pub fn tracks(&self) -> &TrackStore {
        self.counter.tracks()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Hand pending notifications to the caller
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    /// Run one frame through classification, the enabled engines and the sinks
    ///
    /// `line` is the caller's current counting line; it is clamped to the
    /// frame before use. `image` is needed only to crop violation evidence.
    /// Never fails: bad detections and sink errors are logged and counted.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        image: Option<&RgbImage>,
        line: &CountingLine,
    ) -> FrameReport {
        if let Some(last) = self.last_frame.filter(|&last| frame.index <= last) {
            warn!(
                "Frame index {} does not advance past {}; processing anyway",
                frame.index, last
            );
        }
        self.last_frame = Some(frame.index);

        let classified = frame.classify(&self.classes);
        for rejection in &classified.rejected {
            warn!(
                "Frame {}: rejected detection #{}: {}",
                frame.index, rejection.position, rejection.error
            );
        }
        debug!(
            "Frame {}: {} role entries, {} rejected",
            frame.index,
            classified.accepted(),
            classified.rejected.len()
        );

        let mut report = FrameReport {
            frame_index: frame.index,
            rejected: classified.rejected.len(),
            ..FrameReport::default()
        };

        if self.config.mode.counts() {
            let line = line.clamped(frame.width, frame.height);
            report.crossings =
                self.counter
                    .process(frame.index, &line, &classified.counted, &self.classes);

            if !report.crossings.is_empty() {
                report.count_write_failed = !self.persist_counts();
            }
            for crossing in &report.crossings {
                self.events.publish(SessionEvent::Crossing(crossing.clone()));
            }
        }

        if self.config.mode.associates() {
            if let Some(dedup) = self.dedup.as_mut() {
                dedup.begin_frame(
                    frame.index,
                    classified.carriers.iter().filter_map(|d| d.track_id),
                );
            }
            let records = AssociationEngine::associate(
                frame.index,
                &classified.carriers,
                &classified.markers,
                &classified.identifiers,
            );

            for record in records {
                if let Some(dedup) = self.dedup.as_mut() {
                    if !dedup.admit(&record) {
                        debug!(
                            "Frame {}: carrier track {:?} already reported",
                            frame.index, record.carrier_track
                        );
                        continue;
                    }
                }
                report.violations.push(record);
            }

            for (ordinal, record) in report.violations.iter().enumerate() {
                info!(
                    "Violation captured at frame {}: carrier {} identifier {}",
                    record.frame_index, record.carrier, record.identifier
                );
                self.events.publish(SessionEvent::Violation(*record));
                if !self.persist_evidence(image, record, ordinal) {
                    report.evidence_failures += 1;
                }
            }
        }

        self.stats.frames += 1;
        self.stats.crossings += report.crossings.len() as u64;
        self.stats.violations += report.violations.len() as u64;
        self.stats.rejected_detections += report.rejected as u64;
        self.stats.evidence_failures += report.evidence_failures as u64;
        if report.count_write_failed {
            self.stats.count_write_failures += 1;
        }

        report
    }

    /// Rewrite the count snapshot; false if the write failed
    fn persist_counts(&mut self) -> bool {
        let Some(sink) = self.count_sink.as_mut() else {
            return true;
        };

        match sink.write_snapshot(self.counter.counts()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error writing counts: {}", e);
                false
            }
        }
    }

    /// Save both crops for one record; false if nothing could be saved
    fn persist_evidence(
        &mut self,
        image: Option<&RgbImage>,
        record: &ViolationRecord,
        ordinal: usize,
    ) -> bool {
        let Some(sink) = self.evidence_sink.as_mut() else {
            return true;
        };
        let Some(image) = image else {
            warn!(
                "Frame {}: no frame image, evidence not saved",
                record.frame_index
            );
            return false;
        };

        match sink.save(image, record, ordinal) {
            Ok(paths) => {
                debug!(
                    "Saved evidence {:?} and {:?}",
                    paths.carrier, paths.identifier
                );
                self.stats.evidence_saved += 1;
                self.events.publish(SessionEvent::EvidenceSaved {
                    frame_index: record.frame_index,
                    paths,
                });
                true
            }
            Err(e) => {
                warn!("Frame {}: evidence not saved: {}", record.frame_index, e);
                false
            }
        }
    }
}
