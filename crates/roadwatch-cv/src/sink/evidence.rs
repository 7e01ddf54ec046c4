//! Violation evidence crops

use image::{ImageFormat, RgbImage, imageops};
use roadwatch_core::BBox;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::association::ViolationRecord;
use crate::error::SinkError;
use crate::traits::EvidenceSink;

/// Encoding used for evidence crops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceFormat {
    #[default]
    Jpg,
    Png,
}

impl EvidenceFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Where one violation's two crops were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidencePaths {
    pub carrier: PathBuf,
    pub identifier: PathBuf,
}

/// Pixel rectangle `(x, y, width, height)` guaranteed to lie inside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a box to the frame, `max(0, c)` first and then `min(dimension, c)`
///
/// Returns `None` when nothing of the box is left inside the frame.
pub fn clamp_to_frame(bbox: &BBox, width: u32, height: u32) -> Option<CropRect> {
    let w = i64::from(width);
    let h = i64::from(height);
    let clamp = |c: i32, dim: i64| i64::from(c).max(0).min(dim);

    let x1 = clamp(bbox.x1, w);
    let y1 = clamp(bbox.y1, h);
    let x2 = clamp(bbox.x2, w);
    let y2 = clamp(bbox.y2, h);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    // all four values are within 0..=u32::MAX here
    Some(CropRect {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

/// Cut the clamped region of `bbox` out of `frame`
pub fn crop(
    frame: &RgbImage,
    bbox: &BBox,
    role: &'static str,
    frame_index: u64,
) -> Result<RgbImage, SinkError> {
    let (width, height) = frame.dimensions();
    let rect = clamp_to_frame(bbox, width, height).ok_or(SinkError::EmptyCrop {
        role,
        frame_index,
        width,
        height,
    })?;

    Ok(imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Directory of evidence crops named by frame index, ordinal and role
#[derive(Debug, Clone)]
pub struct EvidenceDir {
    dir: PathBuf,
    format: EvidenceFormat,
}

impl EvidenceDir {
    /// Create the directory if it does not exist yet
    pub fn create<P: Into<PathBuf>>(dir: P, format: EvidenceFormat) -> Result<Self, SinkError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| SinkError::io(&dir, e))?;
            debug!("Created evidence directory {:?}", dir);
        }
        Ok(Self { dir, format })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `frame_<index>_<ordinal>_<role>.<ext>`
    ///
    /// The ordinal separates several violations found in the same frame.
    pub fn artifact_path(&self, frame_index: u64, ordinal: usize, role: &str) -> PathBuf {
        self.dir.join(format!(
            "frame_{}_{}_{}.{}",
            frame_index,
            ordinal,
            role,
            self.format.extension()
        ))
    }

    fn write(&self, image: &RgbImage, path: &Path) -> Result<(), SinkError> {
        image
            .save_with_format(path, self.format.image_format())
            .map_err(|e| SinkError::image(path, e))
    }

    #[cfg(feature = "parallel")]
    fn write_pair(&self, pair: [(&RgbImage, &Path); 2]) -> Result<(), SinkError> {
        let [(carrier, carrier_path), (identifier, identifier_path)] = pair;
        let (a, b) = rayon::join(
            || self.write(carrier, carrier_path),
            || self.write(identifier, identifier_path),
        );
        a.and(b)
    }

    #[cfg(not(feature = "parallel"))]
    fn write_pair(&self, pair: [(&RgbImage, &Path); 2]) -> Result<(), SinkError> {
        for (image, path) in pair {
            self.write(image, path)?;
        }
        Ok(())
    }
}

impl EvidenceSink for EvidenceDir {
    fn save(
        &mut self,
        frame: &RgbImage,
        record: &ViolationRecord,
        ordinal: usize,
    ) -> Result<EvidencePaths, SinkError> {
        // crop both first so a bad box never leaves half a pair on disk
        let carrier = crop(frame, &record.carrier, "carrier", record.frame_index)?;
        let identifier = crop(frame, &record.identifier, "identifier", record.frame_index)?;

        let paths = EvidencePaths {
            carrier: self.artifact_path(record.frame_index, ordinal, "carrier"),
            identifier: self.artifact_path(record.frame_index, ordinal, "identifier"),
        };
        self.write_pair([(&carrier, &paths.carrier), (&identifier, &paths.identifier)])?;

        Ok(paths)
    }
}
