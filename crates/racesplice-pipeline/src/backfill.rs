//! Attribute back-filling for newly spliced points.
//!
//! Every point whose attribute is [`Attribute::Unknown`] takes the
//! attribute of the nearest reference point, provided that point lies
//! within the distance threshold. Points already carrying a value are
//! never touched.
//!
//! The lookup is a linear scan per unknown point. Trajectories are in the
//! hundreds to low thousands of points, so no spatial index is kept.

use crate::types::{BackfillReport, Point, Trajectory, TrajectoryPoint};

/// Nearest reference point to `position`, with its distance. Ties go to
/// the lowest index.
fn nearest(reference: &[TrajectoryPoint], position: Point) -> Option<(&TrajectoryPoint, f64)> {
    let mut best: Option<(&TrajectoryPoint, f64)> = None;
    for candidate in reference {
        let d2 = candidate.position.distance_squared(position);
        if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
            best = Some((candidate, d2));
        }
    }
    best.map(|(p, d2)| (p, d2.sqrt()))
}

/// Resolve unknown attributes in `trajectory` from `reference`.
///
/// Points left unresolved (no reference point within
/// `distance_threshold`) keep [`Attribute::Unknown`] and are logged as
/// warnings. Reference points with an unknown attribute are still
/// candidates; copying one leaves the point unresolved.
#[must_use]
pub fn fix_missing(
    trajectory: &Trajectory,
    reference: &Trajectory,
    distance_threshold: f64,
) -> (Trajectory, BackfillReport) {
    let mut report = BackfillReport::default();

    let points = trajectory
        .points()
        .iter()
        .enumerate()
        .map(|(index, point)| {
            if point.attribute.is_known() {
                return *point;
            }
            match nearest(reference.points(), point.position) {
                Some((source, dist))
                    if dist <= distance_threshold && source.attribute.is_known() =>
                {
                    report.filled += 1;
                    TrajectoryPoint {
                        position: point.position,
                        attribute: source.attribute,
                    }
                }
                Some((_, dist)) if dist <= distance_threshold => {
                    report.unresolved += 1;
                    tracing::warn!(
                        index,
                        x = point.position.x,
                        y = point.position.y,
                        nearest = dist,
                        "nearest reference attribute is unknown"
                    );
                    *point
                }
                Some((_, dist)) => {
                    report.unresolved += 1;
                    tracing::warn!(
                        index,
                        x = point.position.x,
                        y = point.position.y,
                        nearest = dist,
                        threshold = distance_threshold,
                        "no reference attribute within tolerance"
                    );
                    *point
                }
                None => {
                    report.unresolved += 1;
                    tracing::warn!(index, "reference trajectory is empty");
                    *point
                }
            }
        })
        .collect();

    if report.filled > 0 || report.unresolved > 0 {
        tracing::info!(
            filled = report.filled,
            unresolved = report.unresolved,
            "back-filled attributes"
        );
    }
    (points, report)
}

/// Whether every attribute in `trajectory` is known.
#[must_use]
pub fn is_fully_resolved(trajectory: &Trajectory) -> bool {
    trajectory.points().iter().all(|p| p.attribute.is_known())
}
