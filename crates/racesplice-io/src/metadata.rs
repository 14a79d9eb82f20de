//! Map metadata documents.
//!
//! The document is a ROS `map_server` YAML file:
//!
//! ```yaml
//! image: track.png
//! resolution: 0.05
//! origin: [-10.0, -5.0, 0.0]
//! negate: 0
//! occupied_thresh: 0.65
//! free_thresh: 0.196
//! ```
//!
//! Only `image`, `resolution` and `origin` are used; other keys are
//! ignored.

use std::path::{Path, PathBuf};

use racesplice_pipeline::{MapFrame, Origin};
use serde::{Deserialize, Serialize};

use crate::IoError;

/// Parsed and validated map metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
    /// Raster path, relative to the metadata document unless absolute.
    pub image: PathBuf,
    /// World units per pixel.
    pub resolution: f64,
    /// `[x, y, theta]` of the lower-left pixel.
    pub origin: Vec<f64>,
}

impl MapMetadata {
    /// Resolve [`image`](Self::image) against the directory holding the
    /// metadata document at `metadata_path`.
    #[must_use]
    pub fn image_path(&self, metadata_path: &Path) -> PathBuf {
        metadata_path
            .parent()
            .map_or_else(|| self.image.clone(), |dir| dir.join(&self.image))
    }

    /// Build the coordinate frame for a raster `height` pixels tall.
    #[must_use]
    pub fn frame(&self, height: u32) -> MapFrame {
        let component = |i: usize| self.origin.get(i).copied().unwrap_or(0.0);
        MapFrame {
            resolution: self.resolution,
            origin: Origin {
                x: component(0),
                y: component(1),
                theta: component(2),
            },
            height,
        }
    }

    fn validate(self) -> Result<Self, IoError> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(IoError::InvalidMetadata(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.origin.len() != 3 {
            return Err(IoError::InvalidMetadata(format!(
                "origin must have 3 elements [x, y, theta], got {}",
                self.origin.len()
            )));
        }
        if self.origin.iter().any(|v| !v.is_finite()) {
            return Err(IoError::InvalidMetadata(
                "origin elements must be finite".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Parse a metadata document from text.
///
/// # Errors
///
/// Returns [`IoError::MetadataParse`] if a required key is missing or
/// has the wrong type.
/// Returns [`IoError::InvalidMetadata`] for a non-positive resolution or an
/// origin that is not three finite numbers.
pub fn parse_map_metadata(text: &str) -> Result<MapMetadata, IoError> {
    let metadata: MapMetadata = serde_yaml::from_str(text)?;
    metadata.validate()
}

/// Read and parse the metadata document at `path`.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read, otherwise the
/// errors of [`parse_map_metadata`].
pub fn load_map_metadata(path: &Path) -> Result<MapMetadata, IoError> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_map_metadata(&text)
}
