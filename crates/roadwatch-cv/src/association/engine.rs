//! Carrier → marker → identifier association
//!
//! Stateless: each call sees only the current frame's lists. Both searches
//! resolve ties by input order, so callers pass detections in the
//! detector's native order and get reproducible records back.

use roadwatch_core::{BBox, Detection, TrackId};
use serde::Serialize;
use tracing::debug;

/// A carrier with a violation marker and an identifier inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ViolationRecord {
    pub frame_index: u64,
    pub carrier: BBox,
    pub identifier: BBox,
    /// Tracker identity of the carrier, when the detector provided one
    pub carrier_track: Option<TrackId>,
}

/// Spatial association over one frame's classified detections
pub struct AssociationEngine;

impl AssociationEngine {
    /// Whether any marker's centre lies strictly inside the carrier
    ///
    /// Stops at the first match; which marker matched is not reported.
    pub fn has_violation(carrier: &Detection, markers: &[Detection]) -> bool {
        markers
            .iter()
            .any(|marker| carrier.bbox.contains_center_of(&marker.bbox))
    }

    /// Identifier whose centre is inside the carrier and closest to its centre
    ///
    /// On equal distance the earlier identifier wins.
    pub fn nearest_identifier<'a>(
        carrier: &Detection,
        identifiers: &'a [Detection],
    ) -> Option<&'a Detection> {
        let carrier_center = carrier.center();
        let mut best: Option<(&Detection, f64)> = None;

        for identifier in identifiers {
            let center = identifier.center();
            if !carrier.bbox.contains(center) {
                continue;
            }

            let distance = carrier_center.distance(center);
            if best.is_none_or(|(_, closest)| distance < closest) {
                best = Some((identifier, distance));
            }
        }

        best.map(|(identifier, _)| identifier)
    }

    /// Run both tests for every carrier, in carrier order
    pub fn associate(
        frame_index: u64,
        carriers: &[Detection],
        markers: &[Detection],
        identifiers: &[Detection],
    ) -> Vec<ViolationRecord> {
        let mut records = Vec::new();

        for carrier in carriers {
            if !Self::has_violation(carrier, markers) {
                continue;
            }

            match Self::nearest_identifier(carrier, identifiers) {
                Some(identifier) => records.push(ViolationRecord {
                    frame_index,
                    carrier: carrier.bbox,
                    identifier: identifier.bbox,
                    carrier_track: carrier.track_id,
                }),
                None => debug!(
                    "Frame {}: violation on carrier {} but no identifier inside it",
                    frame_index, carrier.bbox
                ),
            }
        }

        records
    }
}
