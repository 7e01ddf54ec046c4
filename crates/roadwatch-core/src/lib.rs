//! Roadwatch core types
//!
//! Pixel geometry, validated detections with their class roles, and the
//! per-track state the line counter keeps between frames.

pub mod detection;
pub mod error;
pub mod geometry;
pub mod tracking;

pub use detection::{
    AssociationRole, ClassId, ClassInfo, ClassTable, ClassifiedFrame, Detection, Frame,
    RawDetection, Rejection, TrackId,
};
pub use error::DetectionError;
pub use geometry::{BBox, Point};
pub use tracking::{CountingLine, TrackRecord, TrackStore};
