//! File-backed event sinks

pub mod counts;
pub mod evidence;

pub use counts::CountFile;
pub use evidence::{CropRect, EvidenceDir, EvidenceFormat, EvidencePaths, clamp_to_frame, crop};
