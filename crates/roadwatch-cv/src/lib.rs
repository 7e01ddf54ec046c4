//! Roadwatch event engines
//!
//! Turns per-frame detections into line crossings and helmet-style
//! violations, and persists counts and evidence crops.

pub mod association;
pub mod counting;
pub mod error;
pub mod pipeline;
pub mod sink;

// Re-export commonly used types
pub use association::{AssociationEngine, ViolationDeduplicator, ViolationRecord};
pub use counting::{CountAggregate, CrossingEvent, LineCrossingCounter};
pub use error::SinkError;
pub use pipeline::{FrameReport, Mode, Session, SessionConfig, SessionEvent, SessionStats};
pub use sink::{CountFile, EvidenceDir, EvidenceFormat, EvidencePaths};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Seams between the engines and where their output ends up
pub mod traits {
    use crate::association::ViolationRecord;
    use crate::counting::CountAggregate;
    use crate::error::SinkError;
    use crate::sink::EvidencePaths;
    use image::RgbImage;

    /// Receives the full count aggregate after every change
    pub trait CountSink {
        fn write_snapshot(&mut self, counts: &CountAggregate) -> Result<(), SinkError>;
    }

    /// Persists the carrier and identifier crops of one violation
    pub trait EvidenceSink {
        /// `ordinal` numbers the violations found within the same frame
        fn save(
            &mut self,
            frame: &RgbImage,
            record: &ViolationRecord,
            ordinal: usize,
        ) -> Result<EvidencePaths, SinkError>;
    }
}
