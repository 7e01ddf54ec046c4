//! Detector output as the rest of the system sees it

pub mod classes;
pub mod frame;

pub use classes::{AssociationRole, ClassInfo, ClassTable};
pub use frame::{ClassifiedFrame, Frame, Rejection};

use crate::error::DetectionError;
use crate::geometry::{BBox, Point};
use serde::{Deserialize, Serialize};

/// Numeric class label emitted by the detector
pub type ClassId = u32;

/// Identity assigned by the external tracker, stable across frames
pub type TrackId = u64;

/// One detected object in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: ClassId,
    pub bbox: BBox,
    pub track_id: Option<TrackId>,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_id: ClassId, bbox: BBox) -> Self {
        Self {
            class_id,
            bbox,
            track_id: None,
            confidence: 1.0,
        }
    }

    pub fn with_track(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Detection as serialized by the detector, before validation
///
/// Class ids are signed here so an out-of-range value can be reported
/// instead of failing the whole frame at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: i64,
    pub bbox: [f32; 4],
    #[serde(default)]
    pub track_id: Option<TrackId>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl RawDetection {
    /// Truncate to pixel coordinates
    ///
    /// Only checks what cannot survive the conversion. Box ordering and
    /// class membership are checked when the frame is classified.
    pub fn into_detection(self) -> Result<Detection, DetectionError> {
        if self.bbox.iter().any(|c| !c.is_finite()) {
            return Err(DetectionError::NonFiniteCoordinate(self.bbox));
        }
        let class_id =
            ClassId::try_from(self.class_id).map_err(|_| DetectionError::UnknownClass(self.class_id))?;

        let detection = Detection::new(class_id, BBox::from_xyxy(self.bbox))
            .with_confidence(self.confidence);
        Ok(match self.track_id {
            Some(track_id) => detection.with_track(track_id),
            None => detection,
        })
    }
}
