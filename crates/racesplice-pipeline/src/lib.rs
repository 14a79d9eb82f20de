//! racesplice-pipeline: Path extraction and trajectory stitching (sans-IO).
//!
//! Repairs or extends a recorded racing line from a marker-annotated map:
//! locate landmarks -> grid search -> pixel-to-world conversion ->
//! splice into the trajectory -> back-fill attributes.
//!
//! This crate has **no I/O dependencies** -- it operates on an in-memory
//! raster and trajectory and returns structured data. File formats live
//! in `racesplice-io`.

pub mod backfill;
pub mod frame;
pub mod marker;
pub mod search;
pub mod splice;
pub mod types;

pub use marker::{ColorParseError, Marker, MarkerPalette, parse_hex_color, to_hex_color};
pub use search::{Goal, PathSearch, SearchGrid, SearchKind};
pub use types::{
    Attribute, BackfillReport, GridCell, LandmarkMode, MapFrame, Origin, PipelineConfig,
    PipelineError, Point, ProcessResult, Rgb, RgbImage, SpliceReport, Trajectory, TrajectoryPoint,
    UNKNOWN_SENTINEL,
};

/// Run the full extraction and splicing pipeline.
///
/// # Pipeline steps
///
/// 1. Validate the configuration and the trajectory length
/// 2. Optional rotation of the loop to the first SEAM marker
/// 3. Snapshot the trajectory as the back-fill reference
/// 4. Locate landmark pairs and search a path for each
/// 5. Discretize, convert and splice each path, in scan order
/// 6. Back-fill unknown attributes from the reference
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::TrajectoryTooShort`] for fewer than 2 points.
/// Returns [`PipelineError::LandmarkNotFound`] if a required START or END
/// marker is absent.
/// Returns [`PipelineError::NoPathFound`] if single-landmark mode cannot
/// connect its START and END.
pub fn process(
    map: &RgbImage,
    frame: &MapFrame,
    trajectory: Trajectory,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    // 1. Validate.
    config.validate()?;
    if trajectory.len() < 2 {
        return Err(PipelineError::TrajectoryTooShort(trajectory.len()));
    }

    // 2. Seam rotation.
    let seam = config
        .rotate_to_seam
        .then(|| marker::find_first_marker(map, config.palette.seam))
        .flatten();
    let trajectory = match seam {
        Some(cell) => {
            tracing::info!(x = cell.x, y = cell.y, "rotating trajectory to seam");
            splice::rotate_to_seam(trajectory, cell, frame)
        }
        None => trajectory,
    };

    // 3. Reference for back-fill.
    let reference = trajectory.clone();

    // 4. Landmark pairs and searches.
    let paths = landmark_paths(map, config)?;

    // 5. Splice sequentially; each splice sees the previous ones.
    let mut current = trajectory;
    let mut splices = Vec::with_capacity(paths.len());
    for path in paths {
        let path = splice::discretize(&path, config.discretization_step);
        let Some((next, report)) = splice::splice_path(&current, &path, frame) else {
            continue;
        };
        tracing::info!(
            start.x = report.start.x,
            start.y = report.start.y,
            i1 = report.replaced.0,
            i2 = report.replaced.1,
            inserted = report.inserted,
            reversed = report.reversed,
            "spliced segment"
        );
        current = next;
        splices.push(report);
    }

    // 6. Back-fill.
    let (trajectory, backfill) =
        backfill::fix_missing(&current, &reference, config.distance_threshold);

    Ok(ProcessResult {
        trajectory,
        splices,
        backfill,
        rotated: seam.is_some(),
    })
}

/// Search one path per landmark pair, according to `config.mode`.
fn landmark_paths(
    map: &RgbImage,
    config: &PipelineConfig,
) -> Result<Vec<Vec<GridCell>>, PipelineError> {
    let palette = &config.palette;
    let grid = SearchGrid::new(map, palette);

    match config.mode {
        LandmarkMode::Single => {
            let start = marker::find_first_marker(map, palette.start)
                .ok_or(PipelineError::LandmarkNotFound(Marker::Start))?;
            let end = marker::find_first_marker(map, palette.end)
                .ok_or(PipelineError::LandmarkNotFound(Marker::End))?;
            tracing::info!(
                start.x = start.x,
                start.y = start.y,
                end.x = end.x,
                end.y = end.y,
                search = ?config.search,
                "searching single landmark pair"
            );
            let path = config.search.search(&grid, start, Goal::Cell(end));
            if path.is_empty() {
                return Err(PipelineError::NoPathFound { start });
            }
            Ok(vec![path])
        }
        LandmarkMode::Multiple => {
            let starts = marker::find_markers(map, palette.start);
            if starts.is_empty() {
                return Err(PipelineError::LandmarkNotFound(Marker::Start));
            }
            if marker::find_first_marker(map, palette.end).is_none() {
                return Err(PipelineError::LandmarkNotFound(Marker::End));
            }
            tracing::info!(count = starts.len(), "searching from every START marker");

            let mut paths = Vec::with_capacity(starts.len());
            for start in starts {
                let path =
                    SearchKind::BreadthFirst.search(&grid, start, Goal::Marker(Marker::End));
                if path.is_empty() {
                    tracing::warn!(
                        x = start.x,
                        y = start.y,
                        "no path from START marker to any END marker, skipping"
                    );
                    continue;
                }
                paths.push(path);
            }
            Ok(paths)
        }
    }
}
