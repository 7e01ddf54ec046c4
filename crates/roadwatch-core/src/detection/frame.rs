use serde::{Deserialize, Serialize};

use super::classes::{AssociationRole, ClassTable};
use super::Detection;
use crate::error::DetectionError;

/// Everything the detector produced for one video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonically increasing within a session
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// In detector output order. Association tie-breaks depend on it.
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
            detections: Vec::new(),
        }
    }

    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.detections = detections;
        self
    }

    pub fn push(&mut self, detection: Detection) {
        self.detections.push(detection);
    }

    /// Validate every detection and sort it into per-role lists
    ///
    /// Input order is preserved within each list. A detection whose class
    /// is both counted and has an association role lands in both lists.
    pub fn classify(&self, table: &ClassTable) -> ClassifiedFrame {
        let mut classified = ClassifiedFrame::default();

        for (position, detection) in self.detections.iter().enumerate() {
            if !detection.bbox.is_well_formed() {
                classified.rejected.push(Rejection {
                    position,
                    error: DetectionError::InvertedBox(detection.bbox),
                });
                continue;
            }

            let Some(info) = table.get(detection.class_id) else {
                classified.rejected.push(Rejection {
                    position,
                    error: DetectionError::UnknownClass(i64::from(detection.class_id)),
                });
                continue;
            };

            if info.counted {
                classified.counted.push(*detection);
            }
            match info.role {
                Some(AssociationRole::Carrier) => classified.carriers.push(*detection),
                Some(AssociationRole::Marker) => classified.markers.push(*detection),
                Some(AssociationRole::Identifier) => classified.identifiers.push(*detection),
                None => {}
            }
        }

        classified
    }
}

/// A detection dropped during classification
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Index into the frame's detection list
    pub position: usize,
    pub error: DetectionError,
}

/// Per-role detection lists for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedFrame {
    pub counted: Vec<Detection>,
    pub carriers: Vec<Detection>,
    pub markers: Vec<Detection>,
    pub identifiers: Vec<Detection>,
    pub rejected: Vec<Rejection>,
}

impl ClassifiedFrame {
    /// Entries across all role lists; a detection listed twice counts twice
    pub fn accepted(&self) -> usize {
        self.counted.len() + self.carriers.len() + self.markers.len() + self.identifiers.len()
    }
}
