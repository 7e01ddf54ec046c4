//! Replay a recorded detection log through a session

use anyhow::Context;
use image::RgbImage;
use roadwatch_core::{CountingLine, Frame, RawDetection};
use roadwatch_cv::{Result, Session};
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One line of the detection log
#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub width: u32,
    pub height: u32,
    /// Frame image, relative to the log file's directory
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// New counting line, applied before this frame
    #[serde(default)]
    pub line: Option<CountingLine>,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl FrameRecord {
    /// Convert to a frame, dropping detections with unusable coordinates
    pub fn into_frame(self) -> (Frame, usize) {
        let mut frame = Frame::new(self.frame_index, self.width, self.height);
        let mut dropped = 0;

        for (position, raw) in self.detections.into_iter().enumerate() {
            match raw.into_detection() {
                Ok(detection) => frame.push(detection),
                Err(e) => {
                    warn!(
                        "Frame {}: dropped detection #{}: {}",
                        self.frame_index, position, e
                    );
                    dropped += 1;
                }
            }
        }

        (frame, dropped)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub malformed_lines: u64,
    pub dropped_detections: u64,
    pub missing_images: u64,
}

/// Feed every frame of `reader` to `session`
///
/// Malformed lines are skipped. Events drained after each frame are written
/// as JSON lines to `events_out` when given.
pub fn replay<R: BufRead>(
    reader: R,
    base_dir: &Path,
    session: &mut Session,
    mut line: CountingLine,
    mut events_out: Option<&mut dyn Write>,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (line_num, text) in reader.lines().enumerate() {
        let text = text.with_context(|| format!("Failed to read log line {}", line_num + 1))?;
        if text.trim().is_empty() {
            continue;
        }

        let record: FrameRecord = match serde_json::from_str(&text) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed log line {}: {}", line_num + 1, e);
                summary.malformed_lines += 1;
                continue;
            }
        };

        if let Some(new_line) = record.line {
            debug!("Counting line moved to {:?} at frame {}", new_line, record.frame_index);
            line = new_line;
        }

        let image = match &record.image {
            Some(path) => {
                let image = load_image(&base_dir.join(path));
                if image.is_none() {
                    summary.missing_images += 1;
                }
                image
            }
            None => None,
        };

        let (frame, dropped) = record.into_frame();
        summary.dropped_detections += dropped as u64;

        session.process_frame(&frame, image.as_ref(), &line);
        summary.frames += 1;

        let events = session.drain_events();
        if let Some(out) = events_out.as_mut() {
            for event in &events {
                serde_json::to_writer(&mut **out, event).context("Failed to encode event")?;
                writeln!(out).context("Failed to write event")?;
            }
        }
    }

    info!(
        "Replayed {} frames ({} malformed lines, {} dropped detections)",
        summary.frames, summary.malformed_lines, summary.dropped_detections
    );
    Ok(summary)
}

fn load_image(path: &Path) -> Option<RgbImage> {
    match image::open(path) {
        Ok(image) => Some(image.to_rgb8()),
        Err(e) => {
            warn!("Failed to load frame image {:?}: {}", path, e);
            None
        }
    }
}
