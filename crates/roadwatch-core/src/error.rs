use crate::geometry::BBox;
use thiserror::Error;

/// Why a single detection was rejected from a frame
///
/// Rejection is local: the rest of the frame is still processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("inverted box {0} (x1 > x2 or y1 > y2)")]
    InvertedBox(BBox),

    #[error("unknown class id {0}")]
    UnknownClass(i64),

    #[error("non-finite coordinate in box {0:?}")]
    NonFiniteCoordinate([f32; 4]),
}
