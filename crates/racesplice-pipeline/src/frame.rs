//! Conversion between world coordinates and map grid cells.
//!
//! Image row 0 is the top of the raster while world Y grows upward, so the
//! vertical axis is flipped around the raster height. Results are not
//! bounds-checked.

use crate::types::{GridCell, MapFrame, Point};

/// Project a world position onto the grid.
///
/// `gx = floor((x - origin.x) / resolution)`,
/// `gy = height - floor((y - origin.y) / resolution)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn world_to_grid(point: Point, frame: &MapFrame) -> GridCell {
    let gx = ((point.x - frame.origin.x) / frame.resolution).floor() as i64;
    let gy = ((point.y - frame.origin.y) / frame.resolution).floor() as i64;
    GridCell::new(gx, i64::from(frame.height) - gy)
}

/// Inverse of [`world_to_grid`], up to pixel quantization.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grid_to_world(cell: GridCell, frame: &MapFrame) -> Point {
    let x = (cell.x as f64).mul_add(frame.resolution, frame.origin.x);
    let y = ((i64::from(frame.height) - cell.y) as f64).mul_add(frame.resolution, frame.origin.y);
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn frame() -> MapFrame {
        MapFrame {
            resolution: 0.05,
            origin: Origin {
                x: -10.0,
                y: -5.0,
                theta: 0.0,
            },
            height: 200,
        }
    }

    #[test]
    fn origin_maps_to_bottom_row() {
        let cell = world_to_grid(Point::new(-10.0, -5.0), &frame());
        assert_eq!(cell, GridCell::new(0, 200));
    }

    #[test]
    fn y_axis_is_flipped() {
        let f = frame();
        let low = world_to_grid(Point::new(0.0, 0.0), &f);
        let high = world_to_grid(Point::new(0.0, 1.0), &f);
        assert!(high.y < low.y, "higher world Y must map to a smaller row");
        assert_eq!(low.x, high.x);
    }

    #[test]
    fn grid_to_world_is_exact_on_cell_corners() {
        let f = MapFrame {
            resolution: 0.25,
            ..frame()
        };
        let p = grid_to_world(GridCell::new(40, 100), &f);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 20.0).abs() < 1e-9);
        assert_eq!(world_to_grid(p, &f), GridCell::new(40, 100));
    }

    #[test]
    fn round_trip_within_one_cell() {
        let f = frame();
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(-9.987, -4.913),
            Point::new(3.14159, 2.71828),
            Point::new(-0.026, 4.999),
        ];
        for p in samples {
            let back = grid_to_world(world_to_grid(p, &f), &f);
            assert!(
                (back.x - p.x).abs() <= f.resolution + 1e-9,
                "x drifted: {p:?} -> {back:?}"
            );
            assert!(
                (back.y - p.y).abs() <= f.resolution + 1e-9,
                "y drifted: {p:?} -> {back:?}"
            );
        }
    }

    #[test]
    fn points_outside_the_map_are_representable() {
        let cell = world_to_grid(Point::new(-11.0, 6.0), &frame());
        assert!(cell.x < 0);
        assert!(cell.y < 0);
    }
}
