//! Zone merging and capture detection.
//!
//! A freshly closed candidate either joins the zone set on its own or is
//! folded into existing territory, depending on the level's [`MergePolicy`].
//! Whatever shape comes out the other end is the one enemies get captured in.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MergeError;
use crate::geometry::{Bounds, Point};
use crate::hull::convex_hull;
use crate::zone::{Decay, SafeZone, ZoneId, ZoneSet, ZoneShape};

/// Default distance for [`MergePolicy::ProximityGroupMerge`].
pub const PROXIMITY_THRESHOLD: f64 = 50.0;

/// How a candidate combines with the zones already on the board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergePolicy {
    /// Store the candidate as an independent zone.
    #[default]
    Append,
    /// The candidate replaces every zone.
    DirectReplace,
    /// Hull of the candidate and all polygon vertices replaces every zone.
    HullMerge,
    /// Zones near the candidate are hulled together with it.
    ProximityGroupMerge { threshold: f64 },
    /// `HullMerge`, then the result is put on a timer.
    TemporalTag { lifespan: u64, kill_on_expire: bool },
    /// Nothing is stored; the candidate only captures and scores.
    CaptureOnly,
}

impl MergePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::DirectReplace => "direct_replace",
            Self::HullMerge => "hull_merge",
            Self::ProximityGroupMerge { .. } => "proximity_group_merge",
            Self::TemporalTag { .. } => "temporal_tag",
            Self::CaptureOnly => "capture_only",
        }
    }
}

/// Makes a candidate that is stored on its own temporary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateDecay {
    pub lifespan: u64,
    /// The zone becomes permanent if it captured an enemy.
    #[serde(default)]
    pub survive_on_capture: bool,
}

/// Result of one merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Zone now holding the candidate's territory, if one was stored.
    pub zone: Option<ZoneId>,
    /// Shape enemies are tested against.
    pub capture_shape: ZoneShape,
    /// Area of the candidate alone, the basis for scoring.
    pub candidate_area: f64,
    /// The candidate was stored as-is, so candidate decay applied to it.
    pub standalone: bool,
}

/// Fold `candidate` into `zones` according to `policy`.
///
/// Never fails: internal merge errors are logged and the candidate is
/// appended instead.
pub fn merge_candidate(
    zones: &mut ZoneSet,
    candidate: ZoneShape,
    policy: MergePolicy,
    candidate_decay: Option<CandidateDecay>,
    now: u64,
) -> MergeOutcome {
    let candidate_area = candidate.area();
    let standalone_decay = candidate_decay.map(|d| Decay::new(now, d.lifespan, false));

    let outcome = match policy {
        MergePolicy::Append => standalone(zones.insert(candidate.clone(), standalone_decay), candidate, candidate_area),
        MergePolicy::DirectReplace => {
            standalone(zones.replace_all(candidate.clone(), standalone_decay), candidate, candidate_area)
        }
        MergePolicy::HullMerge => hull_merge(zones, candidate, candidate_area, None, standalone_decay),
        MergePolicy::TemporalTag { lifespan, kill_on_expire } => {
            let tag = Some(Decay::new(now, lifespan, kill_on_expire));
            hull_merge(zones, candidate, candidate_area, tag, tag)
        }
        MergePolicy::ProximityGroupMerge { threshold } => {
            proximity_merge(zones, candidate, candidate_area, threshold, standalone_decay)
        }
        MergePolicy::CaptureOnly => MergeOutcome {
            zone: None,
            capture_shape: candidate,
            candidate_area,
            standalone: false,
        },
    };

    debug!(
        policy = policy.name(),
        zones = zones.len(),
        area = candidate_area,
        "candidate merged"
    );
    outcome
}

fn standalone(id: ZoneId, candidate: ZoneShape, candidate_area: f64) -> MergeOutcome {
    MergeOutcome {
        zone: Some(id),
        capture_shape: candidate,
        candidate_area,
        standalone: true,
    }
}

/// Hull the candidate with every polygon vertex on the board.
///
/// With no polygon to merge into, the candidate alone replaces the set and
/// `alone_decay` applies; otherwise the hull takes `merged_decay`.
fn hull_merge(
    zones: &mut ZoneSet,
    candidate: ZoneShape,
    candidate_area: f64,
    merged_decay: Option<Decay>,
    alone_decay: Option<Decay>,
) -> MergeOutcome {
    if !zones.has_polygon() {
        let id = zones.replace_all(candidate.clone(), alone_decay);
        return standalone(id, candidate, candidate_area);
    }

    let mut points = zones.polygon_vertices();
    points.extend(candidate.corners());

    let Some(merged) = ZoneShape::polygon(convex_hull(&points)) else {
        warn!(points = points.len(), "hull merge degenerated, keeping candidate");
        let id = zones.replace_all(candidate.clone(), alone_decay);
        return standalone(id, candidate, candidate_area);
    };

    let id = zones.replace_all(merged.clone(), merged_decay);
    MergeOutcome {
        zone: Some(id),
        capture_shape: merged,
        candidate_area,
        standalone: false,
    }
}

fn proximity_merge(
    zones: &mut ZoneSet,
    candidate: ZoneShape,
    candidate_area: f64,
    threshold: f64,
    alone_decay: Option<Decay>,
) -> MergeOutcome {
    let candidate_bounds = candidate.bounds();
    let group: Vec<&SafeZone> = zones
        .iter()
        .filter(|z| candidate_bounds.expand(threshold).overlaps(&z.shape.bounds()))
        .collect();

    if group.is_empty() {
        let id = zones.insert(candidate.clone(), alone_decay);
        return standalone(id, candidate, candidate_area);
    }

    let member_ids: Vec<ZoneId> = group.iter().map(|z| z.id).collect();
    let shapes: Vec<&ZoneShape> = std::iter::once(&candidate).chain(group.iter().map(|z| &z.shape)).collect();

    match group_hull(&shapes) {
        Ok(merged) => {
            for id in &member_ids {
                zones.remove(*id);
            }
            let id = zones.insert(merged.clone(), None);
            debug!(merged = member_ids.len(), "proximity group hulled");
            MergeOutcome {
                zone: Some(id),
                capture_shape: merged,
                candidate_area,
                standalone: false,
            }
        }
        Err(err) => {
            warn!(error = %err, "merging failed, adding zone separately");
            let id = zones.insert(candidate.clone(), alone_decay);
            standalone(id, candidate, candidate_area)
        }
    }
}

/// Hull of every shape's corners plus the group's bounding-box corners.
pub fn group_hull(shapes: &[&ZoneShape]) -> Result<ZoneShape, MergeError> {
    let bounds = shapes
        .iter()
        .map(|s| s.bounds())
        .reduce(|a, b| a.union(&b))
        .filter(Bounds::is_finite)
        .ok_or(MergeError::InvalidBounds)?;

    let mut points: Vec<Point> = shapes.iter().flat_map(|s| s.corners()).collect();
    points.extend(bounds.corners());

    let hull = convex_hull(&points);
    if hull.len() < 3 {
        return Err(MergeError::TooFewPoints(hull.len()));
    }
    ZoneShape::polygon(hull).ok_or(MergeError::TooFewPoints(0))
}

/// Enemies and other bodies found inside a closed shape.
///
/// Returns the indices of `positions` that `shape` contains, in order.
pub fn captured_indices(shape: &ZoneShape, positions: &[Point]) -> Vec<usize> {
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| shape.contains(**p))
        .map(|(i, _)| i)
        .collect()
}
