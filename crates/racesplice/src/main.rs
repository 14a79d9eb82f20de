//! racesplice: Repair or extend a recorded racing line from a marker-annotated map.
//!
//! Loads a ROS map (YAML metadata plus raster), a trajectory file, runs
//! the splicing pipeline and writes the result.
//!
//! # Usage
//!
//! ```text
//! racesplice [OPTIONS] <MAP_YAML> <INPUT_CSV> <OUTPUT_CSV>
//! ```
//!
//! Log verbosity follows `RUST_LOG` when set, otherwise `info` (or
//! `debug` with `--verbose`).

#![allow(clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use racesplice_pipeline::{LandmarkMode, MarkerPalette, PipelineConfig, Rgb, SearchKind};
use tracing_subscriber::EnvFilter;

/// Splice marker-drawn paths into a racing line.
///
/// START, END and PATH pixels in the map image describe detours; each is
/// searched, converted to world coordinates and spliced into the input
/// trajectory. New points take their attribute from the nearest original
/// point.
#[derive(Parser)]
#[command(name = "racesplice", version)]
struct Cli {
    /// Map metadata YAML (`image`, `resolution`, `origin`).
    map_yaml: PathBuf,

    /// Input trajectory (`x, y[, attribute]` per line, no header).
    input_csv: PathBuf,

    /// Output trajectory path.
    output_csv: PathBuf,

    /// Map image to use instead of the one named in the metadata.
    #[arg(long)]
    map_image: Option<PathBuf>,

    /// Landmark mode.
    #[arg(long, value_enum, default_value_t = Mode::Multiple)]
    mode: Mode,

    /// Search strategy for single landmark mode.
    #[arg(long, value_enum, default_value_t = Search::Bfs)]
    search: Search,

    /// Keep every N-th path cell (the last cell is always kept).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_DISCRETIZATION_STEP, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    step: usize,

    /// Back-fill distance threshold in world units.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_DISTANCE_THRESHOLD)]
    threshold: f64,

    /// Skip rotating the loop to the SEAM marker.
    #[arg(long)]
    no_seam: bool,

    /// START marker color as `#rrggbb` (default #11ff00).
    #[arg(long, value_parser = racesplice_pipeline::parse_hex_color)]
    start_color: Option<Rgb<u8>>,

    /// END marker color as `#rrggbb` (default #0a00ff).
    #[arg(long, value_parser = racesplice_pipeline::parse_hex_color)]
    end_color: Option<Rgb<u8>>,

    /// PATH color as `#rrggbb` (default #84367b).
    #[arg(long, value_parser = racesplice_pipeline::parse_hex_color)]
    path_color: Option<Rgb<u8>>,

    /// SEAM marker color as `#rrggbb` (default #f6ff00).
    #[arg(long, value_parser = racesplice_pipeline::parse_hex_color)]
    seam_color: Option<Rgb<u8>>,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Landmark mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// First START to first END.
    Single,
    /// Every START to its nearest reachable END.
    Multiple,
}

/// Search strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Search {
    /// Breadth-first (shortest in steps).
    Bfs,
    /// Depth-first.
    Dfs,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let defaults = MarkerPalette::default();
    let palette = MarkerPalette {
        start: cli.start_color.unwrap_or(defaults.start),
        end: cli.end_color.unwrap_or(defaults.end),
        path: cli.path_color.unwrap_or(defaults.path),
        seam: cli.seam_color.unwrap_or(defaults.seam),
    };

    Ok(PipelineConfig {
        palette,
        mode: match cli.mode {
            Mode::Single => LandmarkMode::Single,
            Mode::Multiple => LandmarkMode::Multiple,
        },
        search: match cli.search {
            Search::Bfs => SearchKind::BreadthFirst,
            Search::Dfs => SearchKind::DepthFirst,
        },
        discretization_step: cli.step,
        distance_threshold: cli.threshold,
        rotate_to_seam: !cli.no_seam,
    })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let metadata = match racesplice_io::load_map_metadata(&cli.map_yaml) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let image_path = cli
        .map_image
        .clone()
        .unwrap_or_else(|| metadata.image_path(&cli.map_yaml));
    let map = match racesplice_io::load_map_image(&image_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let frame = metadata.frame(map.height());
    tracing::info!(
        image = %image_path.display(),
        width = map.width(),
        height = map.height(),
        resolution = frame.resolution,
        "loaded map"
    );

    let parsed = match racesplice_io::read_trajectory_file(&cli.input_csv) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        points = parsed.trajectory.len(),
        skipped = parsed.skipped,
        "loaded trajectory"
    );

    let result = match racesplice_pipeline::process(&map, &frame, parsed.trajectory, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = racesplice_io::write_trajectory_file(&cli.output_csv, &result.trajectory) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    eprintln!(
        "{} splice(s) applied, {} points written to {}, {} unresolved attribute(s)",
        result.splices.len(),
        result.trajectory.len(),
        cli.output_csv.display(),
        result.backfill.unresolved,
    );

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            ["racesplice", "map.yaml", "in.csv", "out.csv"]
                .iter()
                .chain(args),
        )
        .unwrap()
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let config = config_from_cli(&parse(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn flags_build_config() {
        let config = config_from_cli(&parse(&[
            "--mode",
            "single",
            "--search",
            "dfs",
            "--step",
            "5",
            "--threshold",
            "2.5",
            "--no-seam",
        ]))
        .unwrap();
        assert_eq!(config.mode, LandmarkMode::Single);
        assert_eq!(config.search, SearchKind::DepthFirst);
        assert_eq!(config.discretization_step, 5);
        assert!((config.distance_threshold - 2.5).abs() < f64::EPSILON);
        assert!(!config.rotate_to_seam);
    }

    #[test]
    fn color_flags_override_palette() {
        let config = config_from_cli(&parse(&["--path-color", "#FFFFFF", "--seam-color", "000001"]))
            .unwrap();
        assert_eq!(config.palette.path, Rgb([255, 255, 255]));
        assert_eq!(config.palette.seam, Rgb([0, 0, 1]));
        assert_eq!(config.palette.start, MarkerPalette::default().start);
    }

    #[test]
    fn malformed_color_is_rejected() {
        let result = Cli::try_parse_from(["racesplice", "a", "b", "c", "--end-color", "#12345"]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_step_is_rejected() {
        let result = Cli::try_parse_from(["racesplice", "a", "b", "c", "--step", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "--step",
            "9",
            "--config-json",
            r#"{"mode": "Single", "discretization_step": 3}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.mode, LandmarkMode::Single);
        assert_eq!(config.discretization_step, 3);
        assert!(config.rotate_to_seam);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["--config-json", "{not json"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.starts_with("Error parsing --config-json"));
    }
}
