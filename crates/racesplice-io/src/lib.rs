//! racesplice-io: File formats around the racesplice pipeline.
//!
//! - map metadata documents (ROS map YAML)
//! - raster map decoding
//! - trajectory delimited text (`x, y[, attribute]`, no header)
//!
//! Everything algorithmic lives in `racesplice-pipeline`; this crate only
//! moves bytes in and out of its types.

use std::path::PathBuf;

pub mod metadata;
pub mod raster;
pub mod trajectory;

pub use metadata::{MapMetadata, load_map_metadata, parse_map_metadata};
pub use raster::{decode_map_image, load_map_image};
pub use trajectory::{
    DEFAULT_ATTRIBUTE, ParsedTrajectory, parse_trajectory, read_trajectory_file, write_trajectory,
    write_trajectory_file,
};

/// Errors that can occur while loading or persisting pipeline data.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// A file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The map metadata document is not valid YAML of the expected shape.
    #[error("failed to parse map metadata: {0}")]
    MetadataParse(#[from] serde_yaml::Error),

    /// The map metadata parsed but holds unusable values.
    #[error("invalid map metadata: {0}")]
    InvalidMetadata(String),

    /// The raster map could not be decoded.
    #[error("failed to decode map image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The raster map bytes were empty.
    #[error("map image data is empty")]
    EmptyImage,

    /// The trajectory text could not be read or written.
    #[error("trajectory format error: {0}")]
    Csv(#[from] csv::Error),

    /// Every trajectory row was malformed or the file was empty.
    #[error("no usable trajectory points in {}", path.display())]
    NoUsablePoints {
        /// File that held no points.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_file() {
        let err = IoError::Read {
            path: PathBuf::from("maps/track.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to read maps/track.yaml: not found");

        let err = IoError::NoUsablePoints {
            path: PathBuf::from("line.csv"),
        };
        assert_eq!(err.to_string(), "no usable trajectory points in line.csv");
    }

    #[test]
    fn error_display_empty_image() {
        assert_eq!(IoError::EmptyImage.to_string(), "map image data is empty");
    }
}
