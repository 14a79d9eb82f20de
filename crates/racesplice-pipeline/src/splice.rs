//! Trajectory splicing: replace a contiguous arc of a racing line with a
//! newly found grid path.
//!
//! The two ends of the found path are matched to their nearest trajectory
//! indices in grid space. The span between those indices is replaced by
//! the path converted to world coordinates, reversed first if its last
//! point is closer to the span start than its first point is. Everything
//! outside the span, attributes included, is kept as is.

use crate::frame::{grid_to_world, world_to_grid};
use crate::types::{GridCell, MapFrame, SpliceReport, Trajectory, TrajectoryPoint};

/// Index of the trajectory point whose grid projection is nearest to
/// `cell`. Ties go to the lowest index. Returns `None` for an empty
/// trajectory.
#[must_use]
pub fn nearest_index(trajectory: &Trajectory, cell: GridCell, frame: &MapFrame) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, position) in trajectory.positions().enumerate() {
        let dist = world_to_grid(position, frame).distance(cell);
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best.map(|(i, _)| i)
}

/// Keep every `step`th cell of `path`, always retaining the last cell.
///
/// A `step` of 0 or 1 returns the path unchanged.
#[must_use]
pub fn discretize(path: &[GridCell], step: usize) -> Vec<GridCell> {
    if step <= 1 {
        return path.to_vec();
    }
    let mut thinned: Vec<GridCell> = path.iter().step_by(step).copied().collect();
    if let Some(&last) = path.last()
        && thinned.last() != Some(&last)
    {
        thinned.push(last);
    }
    thinned
}

/// Convert grid cells to world-space trajectory points whose attribute is
/// still unknown.
#[must_use]
pub fn path_to_world(path: &[GridCell], frame: &MapFrame) -> Vec<TrajectoryPoint> {
    path.iter()
        .map(|&cell| {
            let p = grid_to_world(cell, frame);
            TrajectoryPoint::unknown(p.x, p.y)
        })
        .collect()
}

/// Reverse `segment` in place if its last point is strictly closer to
/// `anchor` than its first point. Returns whether it was reversed.
pub fn orient_segment(anchor: &TrajectoryPoint, segment: &mut [TrajectoryPoint]) -> bool {
    let (Some(first), Some(last)) = (segment.first(), segment.last()) else {
        return false;
    };
    let to_first = anchor.position.distance(first.position);
    let to_last = anchor.position.distance(last.position);
    if to_last < to_first {
        segment.reverse();
        true
    } else {
        false
    }
}

/// `trajectory[..i1] ++ segment ++ trajectory[i2 + 1..]`.
///
/// Indices are clamped to the trajectory, so the output length is
/// `len - (i2 - i1 + 1) + segment.len()` whenever `i1 <= i2 < len`.
#[must_use]
pub fn replace_span(
    trajectory: &Trajectory,
    i1: usize,
    i2: usize,
    segment: Vec<TrajectoryPoint>,
) -> Trajectory {
    let points = trajectory.points();
    let head = i1.min(points.len());
    let tail = i2.saturating_add(1).clamp(head, points.len());

    let mut spliced = Vec::with_capacity(points.len() - (tail - head) + segment.len());
    spliced.extend_from_slice(&points[..head]);
    spliced.extend(segment);
    spliced.extend_from_slice(&points[tail..]);
    Trajectory::new(spliced)
}

/// Splice a found grid path into `trajectory`.
///
/// The first and last cells of `path` are matched to trajectory indices
/// `i1 <= i2`, the path is converted to world points (attribute unknown),
/// oriented against `trajectory[i1]`, and replaces the inclusive span
/// `i1..=i2`.
///
/// Returns `None` if `path` or `trajectory` is empty.
#[must_use]
pub fn splice_path(
    trajectory: &Trajectory,
    path: &[GridCell],
    frame: &MapFrame,
) -> Option<(Trajectory, SpliceReport)> {
    let (&start, &end) = (path.first()?, path.last()?);
    let a = nearest_index(trajectory, start, frame)?;
    let b = nearest_index(trajectory, end, frame)?;
    let (i1, i2) = if a <= b { (a, b) } else { (b, a) };

    let mut segment = path_to_world(path, frame);
    let reversed = orient_segment(&trajectory.points()[i1], &mut segment);
    let inserted = segment.len();

    tracing::debug!(i1, i2, inserted, reversed, "splicing segment");

    let report = SpliceReport {
        start,
        end,
        replaced: (i1, i2),
        inserted,
        reversed,
    };
    Some((replace_span(trajectory, i1, i2, segment), report))
}

/// Rotate a closed-loop trajectory so the point nearest `seam` comes first,
/// then append a copy of that point to close the loop.
///
/// A trajectory whose last position equals its first is already closed on
/// disk; its duplicate is dropped before rotating so the loop is not
/// doubled. Returns an empty trajectory unchanged.
#[must_use]
pub fn rotate_to_seam(trajectory: Trajectory, seam: GridCell, frame: &MapFrame) -> Trajectory {
    let mut points = trajectory.into_points();
    let closed = points.len() >= 2
        && points.first().map(|p| p.position) == points.last().map(|p| p.position);
    if closed {
        points.pop();
    }

    let open = Trajectory::new(points);
    let Some(k) = nearest_index(&open, seam, frame) else {
        return open;
    };

    let points = open.points();
    let mut rotated = Vec::with_capacity(points.len() + 1);
    rotated.extend_from_slice(&points[k..]);
    rotated.extend_from_slice(&points[..k]);
    rotated.push(points[k]);
    Trajectory::new(rotated)
}
