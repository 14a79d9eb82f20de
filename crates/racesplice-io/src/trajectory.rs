//! Trajectory delimited text.
//!
//! One point per line, comma-separated `x, y[, attribute]` in world
//! coordinates, no header row. The attribute column is optional on read
//! and always written. Unknown attributes are stored as
//! [`UNKNOWN_SENTINEL`](racesplice_pipeline::UNKNOWN_SENTINEL).
//!
//! Malformed rows are skipped with a warning instead of failing the read.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use racesplice_pipeline::{Attribute, Point, Trajectory, TrajectoryPoint};

use crate::IoError;

/// Attribute assigned to rows that only carry `x, y`.
pub const DEFAULT_ATTRIBUTE: f64 = 1.0;

/// A parsed trajectory and the number of rows that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrajectory {
    /// Points from every usable row, in file order.
    pub trajectory: Trajectory,
    /// Rows with fewer than two numeric columns.
    pub skipped: usize,
}

/// Parse trajectory text from `reader`.
///
/// # Errors
///
/// Returns [`IoError::Csv`] if the underlying reader fails or a row is
/// not valid UTF-8. Malformed numeric rows are skipped, not errors.
pub fn parse_trajectory<R: io::Read>(reader: R) -> Result<ParsedTrajectory, IoError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    let mut skipped = 0;

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.iter().all(str::is_empty) {
            continue;
        }

        let coordinate = |i: usize| {
            record
                .get(i)
                .and_then(|field| field.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let (Some(x), Some(y)) = (coordinate(0), coordinate(1)) else {
            tracing::warn!(line, row = ?record, "skipping malformed trajectory row");
            skipped += 1;
            continue;
        };

        let attribute = match record.get(2).filter(|field| !field.is_empty()) {
            None => Attribute::Known(DEFAULT_ATTRIBUTE),
            Some(field) => match field.parse::<f64>() {
                Ok(value) if value.is_finite() => Attribute::from_raw(value),
                _ => {
                    tracing::warn!(line, field, "unparseable attribute, using default");
                    Attribute::Known(DEFAULT_ATTRIBUTE)
                }
            },
        };

        points.push(TrajectoryPoint {
            position: Point::new(x, y),
            attribute,
        });
    }

    Ok(ParsedTrajectory {
        trajectory: Trajectory::new(points),
        skipped,
    })
}

/// Write `trajectory` as `x,y,attribute` rows with seven fractional
/// digits.
///
/// # Errors
///
/// Returns [`IoError::Csv`] if writing to `writer` fails.
pub fn write_trajectory<W: io::Write>(trajectory: &Trajectory, writer: W) -> Result<(), IoError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for point in trajectory.points() {
        csv_writer.write_record([
            format!("{:.7}", point.position.x),
            format!("{:.7}", point.position.y),
            format!("{:.7}", point.attribute.to_raw()),
        ])?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read and parse the trajectory file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be opened,
/// [`IoError::NoUsablePoints`] if no row yields a point, otherwise the
/// errors of [`parse_trajectory`].
pub fn read_trajectory_file(path: &Path) -> Result<ParsedTrajectory, IoError> {
    let file = File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_trajectory(file)?;
    if parsed.trajectory.is_empty() {
        return Err(IoError::NoUsablePoints {
            path: path.to_path_buf(),
        });
    }
    if parsed.skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped = parsed.skipped,
            "some trajectory rows were skipped"
        );
    }
    Ok(parsed)
}

/// Write `trajectory` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`IoError::Write`] if the file cannot be created, otherwise the
/// errors of [`write_trajectory`].
pub fn write_trajectory_file(path: &Path, trajectory: &Trajectory) -> Result<(), IoError> {
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_trajectory(trajectory, BufWriter::new(file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use racesplice_pipeline::UNKNOWN_SENTINEL;

    use super::*;

    fn parse(text: &str) -> ParsedTrajectory {
        parse_trajectory(text.as_bytes()).unwrap()
    }

    #[test]
    fn parses_three_columns() {
        let parsed = parse("1.5,2.5,3.0\n-1,-2,0.5\n");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.trajectory.points(),
            &[
                TrajectoryPoint::new(1.5, 2.5, 3.0),
                TrajectoryPoint::new(-1.0, -2.0, 0.5)
            ]
        );
    }

    #[test]
    fn two_columns_use_default_attribute() {
        let parsed = parse("1,2\n");
        assert_eq!(
            parsed.trajectory.points()[0].attribute,
            Attribute::Known(DEFAULT_ATTRIBUTE)
        );
    }

    #[test]
    fn sentinel_is_read_as_unknown() {
        let parsed = parse("1,2,-999\n");
        assert_eq!(parsed.trajectory.points()[0].attribute, Attribute::Unknown);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let parsed = parse("1,2,3\n7\nx,y,z\n4,five,6\n8,9\n");
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.trajectory.len(), 2);
        assert_eq!(parsed.trajectory.points()[1].position, Point::new(8.0, 9.0));
    }

    #[test]
    fn blank_lines_and_whitespace_are_ignored() {
        let parsed = parse("\n 1 , 2 , 3 \n\n4,5,6\n");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.trajectory.len(), 2);
        assert_eq!(parsed.trajectory.points()[0], TrajectoryPoint::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn bad_attribute_falls_back_to_default() {
        let parsed = parse("1,2,fast\n");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.trajectory.points()[0].attribute,
            Attribute::Known(DEFAULT_ATTRIBUTE)
        );
    }

    #[test]
    fn writes_seven_decimals_without_header() {
        let t = Trajectory::new(vec![
            TrajectoryPoint::new(1.0, -2.5, 3.25),
            TrajectoryPoint::unknown(0.1, 0.2),
        ]);
        let mut out = Vec::new();
        write_trajectory(&t, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "1.0000000,-2.5000000,3.2500000\n0.1000000,0.2000000,-999.0000000\n"
        );
    }

    #[test]
    fn written_output_reads_back() {
        let t = Trajectory::new(vec![
            TrajectoryPoint::new(12.5, -3.0, 4.0),
            TrajectoryPoint::unknown(13.0, -3.5),
        ]);
        let mut out = Vec::new();
        write_trajectory(&t, &mut out).unwrap();
        let parsed = parse_trajectory(out.as_slice()).unwrap();
        assert_eq!(parsed.trajectory, t);
        assert!((UNKNOWN_SENTINEL - -999.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = read_trajectory_file(Path::new("/nonexistent/racesplice/line.csv"));
        assert!(matches!(result, Err(IoError::Read { .. })));
    }
}
