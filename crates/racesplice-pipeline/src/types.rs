//! Shared types for the racesplice pipeline.

use serde::{Deserialize, Serialize};

use crate::marker::{Marker, MarkerPalette};
use crate::search::SearchKind;

/// Re-export `RgbImage` and `Rgb` so downstream crates can hand map
/// rasters and colors to the pipeline without depending on `image`
/// directly.
pub use image::{Rgb, RgbImage};

/// On-disk value standing in for [`Attribute::Unknown`].
pub const UNKNOWN_SENTINEL: f64 = -999.0;

/// A discrete pixel position in the map raster.
///
/// Row 0 is the top of the image. Coordinates are signed so that world
/// points projecting outside the raster are still representable; callers
/// must bounds-check before indexing pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    /// Column (pixels from left edge).
    pub x: i64,
    /// Row (pixels from top edge).
    pub y: i64,
}

impl GridCell {
    /// Create a new cell.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another cell, in pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(self, other: Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

/// A 2D point in world coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// World X.
    pub x: f64,
    /// World Y (increases upward).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Per-point attribute carried by a trajectory (target velocity in
/// practice).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    /// A value computed upstream.
    Known(f64),
    /// Not yet known; resolved by the back-filler.
    Unknown,
}

impl Attribute {
    /// Interpret a raw on-disk value, mapping [`UNKNOWN_SENTINEL`] to
    /// [`Attribute::Unknown`].
    #[must_use]
    pub fn from_raw(value: f64) -> Self {
        if (value - UNKNOWN_SENTINEL).abs() < f64::EPSILON {
            Self::Unknown
        } else {
            Self::Known(value)
        }
    }

    /// The raw on-disk value.
    #[must_use]
    pub const fn to_raw(self) -> f64 {
        match self {
            Self::Known(v) => v,
            Self::Unknown => UNKNOWN_SENTINEL,
        }
    }

    /// Returns `true` for [`Attribute::Known`].
    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// One sample of a racing line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Position in world coordinates.
    pub position: Point,
    /// Attribute attached to this position.
    pub attribute: Attribute,
}

impl TrajectoryPoint {
    /// Create a point with a known attribute.
    #[must_use]
    pub const fn new(x: f64, y: f64, attribute: f64) -> Self {
        Self {
            position: Point::new(x, y),
            attribute: Attribute::Known(attribute),
        }
    }

    /// Create a point whose attribute still has to be back-filled.
    #[must_use]
    pub const fn unknown(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            attribute: Attribute::Unknown,
        }
    }
}

/// An ordered racing line around a closed loop.
///
/// Order is the traversal sequence and is only changed by splicing or
/// seam rotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory(Vec<TrajectoryPoint>);

impl Trajectory {
    /// Create a trajectory from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the trajectory has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.0
    }

    /// Iterate over world positions only.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.0.iter().map(|p| p.position)
    }

    /// Consumes the trajectory and returns the underlying vector.
    #[must_use]
    pub fn into_points(self) -> Vec<TrajectoryPoint> {
        self.0
    }
}

impl FromIterator<TrajectoryPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrajectoryPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Map origin pose: world coordinates of the lower-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Origin {
    /// World X of the lower-left corner.
    pub x: f64,
    /// World Y of the lower-left corner.
    pub y: f64,
    /// Yaw. Carried for completeness; the converter ignores it.
    pub theta: f64,
}

/// Transform parameters between world and grid coordinates for one map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    /// World units per pixel. Always positive.
    pub resolution: f64,
    /// Pose of the lower-left pixel.
    pub origin: Origin,
    /// Raster height in pixels.
    pub height: u32,
}

/// How landmark pairs are discovered on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LandmarkMode {
    /// One START and one END marker. The first match of each in scan order
    /// is used and a missing marker aborts the run.
    Single,
    /// Every START pixel is searched, in scan order, until it reaches any
    /// END-colored cell. Failures are logged and skipped.
    #[default]
    Multiple,
}

/// Configuration for the extraction and splicing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Exact colors of the map markers.
    pub palette: MarkerPalette,

    /// Landmark pairing mode.
    pub mode: LandmarkMode,

    /// Search strategy for [`LandmarkMode::Single`]. Multi-instance runs
    /// terminate on a color predicate and always search breadth-first.
    pub search: SearchKind,

    /// Keep every Nth cell of a found path. Must be at least 1.
    pub discretization_step: usize,

    /// Maximum world distance for copying an attribute from the
    /// reference trajectory during back-fill.
    pub distance_threshold: f64,

    /// Rotate the trajectory so it starts at the SEAM marker, when one is
    /// present.
    pub rotate_to_seam: bool,
}

impl PipelineConfig {
    /// Default discretization step (no thinning).
    pub const DEFAULT_DISCRETIZATION_STEP: usize = 1;

    /// Default back-fill distance threshold in world units.
    pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 1.0;

    /// Check invariants that serde and the public fields cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `discretization_step`
    /// is zero or `distance_threshold` is negative or not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.discretization_step == 0 {
            return Err(PipelineError::InvalidConfig(
                "discretization_step must be at least 1".to_string(),
            ));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "distance_threshold must be a finite non-negative number, got {}",
                self.distance_threshold
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            palette: MarkerPalette::default(),
            mode: LandmarkMode::default(),
            search: SearchKind::default(),
            discretization_step: Self::DEFAULT_DISCRETIZATION_STEP,
            distance_threshold: Self::DEFAULT_DISTANCE_THRESHOLD,
            rotate_to_seam: true,
        }
    }
}

/// Outcome of one applied splice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceReport {
    /// First cell of the found path (the START landmark).
    pub start: GridCell,
    /// Last cell of the found path.
    pub end: GridCell,
    /// Inclusive index range `(i1, i2)` replaced in the trajectory as it
    /// was before this splice.
    pub replaced: (usize, usize),
    /// Number of points inserted.
    pub inserted: usize,
    /// Whether the new segment was reversed to match trajectory direction.
    pub reversed: bool,
}

/// Outcome of attribute back-filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackfillReport {
    /// Points whose attribute was copied from the reference.
    pub filled: usize,
    /// Points left [`Attribute::Unknown`] because no reference point was
    /// within the threshold.
    pub unresolved: usize,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    /// The spliced, back-filled trajectory ready to persist.
    pub trajectory: Trajectory,
    /// One report per applied splice, in application order.
    pub splices: Vec<SpliceReport>,
    /// Back-fill statistics.
    pub backfill: BackfillReport,
    /// Whether the trajectory was rotated to a seam marker.
    pub rotated: bool,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required marker color has no matching pixel.
    #[error("no {0} marker found in the map")]
    LandmarkNotFound(Marker),

    /// The search exhausted the frontier without reaching the end.
    #[error("no path found from ({}, {})", start.x, start.y)]
    NoPathFound {
        /// Cell the search started from.
        start: GridCell,
    },

    /// The input trajectory cannot be spliced.
    #[error("trajectory needs at least 2 points, got {0}")]
    TrajectoryTooShort(usize),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_cell_identity_is_positional() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(GridCell::new(3, 4));
        assert!(set.contains(&GridCell::new(3, 4)));
        assert!(!set.contains(&GridCell::new(4, 3)));
    }

    #[test]
    fn grid_cell_distance_is_euclidean() {
        let d = GridCell::new(0, 0).distance(GridCell::new(3, 4));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attribute_sentinel_round_trip() {
        assert_eq!(Attribute::from_raw(UNKNOWN_SENTINEL), Attribute::Unknown);
        assert_eq!(Attribute::from_raw(2.5), Attribute::Known(2.5));
        assert!((Attribute::Unknown.to_raw() - UNKNOWN_SENTINEL).abs() < f64::EPSILON);
        assert!(!Attribute::Unknown.is_known());
        assert!(Attribute::Known(0.0).is_known());
    }

    #[test]
    fn trajectory_accessors() {
        let t: Trajectory = vec![
            TrajectoryPoint::new(0.0, 0.0, 1.0),
            TrajectoryPoint::unknown(1.0, 1.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(t.len(), 2);
        assert!(!t.is_empty());
        assert_eq!(t.first().unwrap().attribute, Attribute::Known(1.0));
        assert_eq!(t.last().unwrap().attribute, Attribute::Unknown);
        assert_eq!(t.positions().count(), 2);
    }

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, LandmarkMode::Multiple);
        assert_eq!(config.search, SearchKind::BreadthFirst);
        assert_eq!(config.discretization_step, 1);
        assert!((config.distance_threshold - 1.0).abs() < f64::EPSILON);
        assert!(config.rotate_to_seam);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pipeline_config_rejects_zero_step() {
        let config = PipelineConfig {
            discretization_step: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn pipeline_config_rejects_negative_threshold() {
        let config = PipelineConfig {
            distance_threshold: -0.1,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn pipeline_config_serde_round_trip() {
        let config = PipelineConfig {
            mode: LandmarkMode::Single,
            search: SearchKind::DepthFirst,
            discretization_step: 5,
            distance_threshold: 0.25,
            rotate_to_seam: false,
            ..PipelineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn pipeline_config_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"discretization_step": 5}"#).unwrap();
        assert_eq!(config.discretization_step, 5);
        assert_eq!(config.mode, LandmarkMode::Multiple);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::LandmarkNotFound(Marker::End).to_string(),
            "no END marker found in the map",
        );
        assert_eq!(
            PipelineError::NoPathFound {
                start: GridCell::new(1, 2)
            }
            .to_string(),
            "no path found from (1, 2)",
        );
        assert_eq!(
            PipelineError::TrajectoryTooShort(1).to_string(),
            "trajectory needs at least 2 points, got 1",
        );
    }
}
