//! Coordinate transformations and catalog cleaning.
//!
//! Every function here is pure: tables come in by reference and new values
//! come out. Stages must run in order, `clean` then `locate`; `locate` assumes
//! its input already passed `clean` under the same parallax policy.

use log::debug;
use thiserror::Error;

use super::loaders::{StarRow, StarTable};

/// Milliarcseconds of parallax per parsec of inverse distance.
pub const MAS_PER_ARCSEC: f64 = 1000.0;

/// Errors raised by the transform stages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A required column is absent from the table schema (not merely blank).
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Row counts from a `clean` pass, grouped by the reason a row was dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub input_rows: usize,
    /// Rows with a blank `l`, `b` or `parallax`.
    pub missing_values: usize,
    /// Rows with an infinite `l` or `b`.
    pub invalid_position: usize,
    /// Rows whose parallax gives no distance under the active policy.
    pub undefined_distance: usize,
    pub retained: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.input_rows - self.retained
    }
}

/// A cleaned star with its derived position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedStar {
    /// Galactic longitude in degrees.
    pub l: f64,
    /// Galactic latitude in degrees.
    pub b: f64,
    /// Parallax in milliarcseconds.
    pub parallax: f64,
    /// Distance in parsecs. Negative when a negative parallax was allowed.
    pub distance_pc: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Euclidean norm of `(x, y, z)`, parsecs from the Sun.
    pub radius: f64,
    /// Pass-through cells from the source row.
    pub extra: Vec<String>,
}

/// Convert a parallax in milliarcseconds to a distance in parsecs.
///
/// With `allow_negative` false, anything `<= 0` has no distance. With it true
/// only an exact zero is undefined; negative parallaxes give negative
/// distances and tiny magnitudes give huge ones, unclamped. Non-finite input,
/// and a magnitude so small the quotient overflows, is always undefined.
#[inline]
pub fn distance_pc(parallax_mas: f64, allow_negative: bool) -> Option<f64> {
    if !parallax_mas.is_finite() || parallax_mas == 0.0 {
        return None;
    }
    if parallax_mas < 0.0 && !allow_negative {
        return None;
    }
    let distance = MAS_PER_ARCSEC / parallax_mas;
    distance.is_finite().then_some(distance)
}

/// Convert galactic spherical coordinates to heliocentric Cartesian.
///
/// `x` points at the galactic center (l = 0, b = 0), `y` toward l = 90 and
/// `z` toward the north galactic pole. Units follow `distance`.
#[inline]
pub fn to_cartesian(l_deg: f64, b_deg: f64, distance: f64) -> (f64, f64, f64) {
    let l = l_deg.to_radians();
    let b = b_deg.to_radians();
    let cos_b = b.cos();

    (
        distance * cos_b * l.cos(),
        distance * cos_b * l.sin(),
        distance * b.sin(),
    )
}

/// Inverse of [`to_cartesian`]: returns `(l_deg, b_deg, distance)` with
/// `l` in `[0, 360)` and a non-negative distance. The origin maps to zeros.
pub fn from_cartesian(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let distance = radius(x, y, z);
    if distance == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let b_deg = (z / distance).clamp(-1.0, 1.0).asin().to_degrees();
    let mut l_deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    if l_deg >= 360.0 {
        l_deg -= 360.0;
    }

    (l_deg, b_deg, distance)
}

/// Distance from the origin. Finite for any finite coordinates.
#[inline]
pub fn radius(x: f64, y: f64, z: f64) -> f64 {
    x.hypot(y).hypot(z)
}

/// Drop rows the pipeline cannot place.
///
/// # Errors
///
/// Returns [`TransformError::MissingColumn`] for the first of `l`, `b`,
/// `parallax` absent from the schema, before any row is looked at.
pub fn clean(table: &StarTable, allow_negative_parallax: bool) -> Result<StarTable> {
    clean_with_stats(table, allow_negative_parallax).map(|(table, _)| table)
}

/// [`clean`], also returning how many rows were dropped and why.
pub fn clean_with_stats(
    table: &StarTable,
    allow_negative_parallax: bool,
) -> Result<(StarTable, CleanStats)> {
    if let Some(column) = table.missing_required_columns().first() {
        return Err(TransformError::MissingColumn((*column).to_string()));
    }

    let mut stats = CleanStats {
        input_rows: table.len(),
        ..CleanStats::default()
    };
    let mut out = table.empty_like();
    out.rows.reserve(table.len());

    for row in &table.rows {
        let (l, b, parallax) = match (row.l, row.b, row.parallax) {
            (Some(l), Some(b), Some(p)) => (l, b, p),
            _ => {
                stats.missing_values += 1;
                continue;
            }
        };

        if !l.is_finite() || !b.is_finite() {
            stats.invalid_position += 1;
            continue;
        }

        if distance_pc(parallax, allow_negative_parallax).is_none() {
            stats.undefined_distance += 1;
            continue;
        }

        out.push(row.clone());
    }

    stats.retained = out.len();
    debug!(
        "clean: kept {}/{} rows (missing {}, bad position {}, undefined distance {})",
        stats.retained,
        stats.input_rows,
        stats.missing_values,
        stats.invalid_position,
        stats.undefined_distance
    );

    Ok((out, stats))
}

/// Compute distance, Cartesian position and radius for every clean row.
///
/// Rows at or beyond `max_distance_pc`, when a cap is given, are dropped.
/// Rows that would not survive [`clean`] are skipped as well.
pub fn locate(
    table: &StarTable,
    allow_negative_parallax: bool,
    max_distance_pc: Option<f64>,
) -> Vec<PlacedStar> {
    let placed: Vec<PlacedStar> = table
        .rows
        .iter()
        .filter_map(|row| place_row(row, allow_negative_parallax))
        .filter(|star| max_distance_pc.map_or(true, |cap| star.radius < cap))
        .collect();

    debug!("locate: placed {}/{} rows", placed.len(), table.len());
    placed
}

fn place_row(row: &StarRow, allow_negative_parallax: bool) -> Option<PlacedStar> {
    let (l, b, parallax) = (row.l?, row.b?, row.parallax?);
    if !l.is_finite() || !b.is_finite() {
        return None;
    }

    let distance = distance_pc(parallax, allow_negative_parallax)?;
    let (x, y, z) = to_cartesian(l, b, distance);

    Some(PlacedStar {
        l,
        b,
        parallax,
        distance_pc: distance,
        x,
        y,
        z,
        radius: radius(x, y, z),
        extra: row.extra.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    fn table_of(rows: Vec<StarRow>) -> StarTable {
        StarTable::from_rows(["l", "b", "parallax"], rows)
    }

    #[test]
    fn test_distance_positive_parallax() {
        for &p in &[0.001, 0.5, 1.0, 3.7, 10.0, 768.5] {
            let d = distance_pc(p, false).unwrap();
            assert!(rel_close(d, 1000.0 / p, 1e-9));
            assert_eq!(distance_pc(p, true), Some(d));
        }
    }

    #[test]
    fn test_distance_non_positive_parallax() {
        assert_eq!(distance_pc(0.0, false), None);
        assert_eq!(distance_pc(-2.0, false), None);
        assert_eq!(distance_pc(0.0, true), None);
        assert_eq!(distance_pc(-2.0, true), Some(-500.0));
        assert_eq!(distance_pc(f64::NAN, true), None);
        assert_eq!(distance_pc(f64::INFINITY, false), None);
    }

    #[test]
    fn test_distance_tiny_parallax_is_not_clamped() {
        let d = distance_pc(1e-6, true).unwrap();
        assert!(rel_close(d, 1e9, 1e-9));
        let d = distance_pc(-1e-6, true).unwrap();
        assert!(rel_close(d, -1e9, 1e-9));
    }

    #[test]
    fn test_distance_overflow_is_undefined() {
        assert_eq!(distance_pc(1e-310, false), None);
        assert_eq!(distance_pc(-1e-310, true), None);

        let table = table_of(vec![
            StarRow::complete(10.0, 5.0, 1e-310),
            StarRow::complete(10.0, 5.0, 2.0),
        ]);
        let (cleaned, stats) = clean_with_stats(&table, false).unwrap();
        assert_eq!(stats.undefined_distance, 1);
        assert_eq!(stats.retained, 1);
        assert_eq!(locate(&cleaned, false, None).len(), 1);
    }

    #[test]
    fn test_huge_distance_keeps_finite_radius() {
        let table = table_of(vec![StarRow::complete(40.0, -20.0, 1e-160)]);
        let placed = locate(&clean(&table, true).unwrap(), true, None);

        assert_eq!(placed.len(), 1);
        assert!(placed[0].radius.is_finite());
        assert!(rel_close(placed[0].radius, 1e163, 1e-9));
        assert!(rel_close(radius(3e200, 4e200, 0.0), 5e200, 1e-12));
    }

    #[test]
    fn test_to_cartesian_axes() {
        let (x, y, z) = to_cartesian(0.0, 0.0, 100.0);
        assert!((x - 100.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!(z.abs() < 1e-9);

        let (x, y, z) = to_cartesian(90.0, 0.0, 200.0);
        assert!(x.abs() < 1e-9);
        assert!((y - 200.0).abs() < 1e-9);
        assert!(z.abs() < 1e-9);

        let (x, y, z) = to_cartesian(123.0, 90.0, 10.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!((z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cartesian_round_trip() {
        let longitudes = [0.0, 15.0, 90.0, 179.5, 180.0, 271.3, 359.9];
        let latitudes = [-89.5, -45.0, -1.0, 0.0, 12.5, 60.0, 89.9];
        let distances = [0.01, 1.0, 42.0, 1234.5, 1e6];

        for &l in &longitudes {
            for &b in &latitudes {
                for &d in &distances {
                    let (x, y, z) = to_cartesian(l, b, d);
                    let (l2, b2, d2) = from_cartesian(x, y, z);
                    let (x2, y2, z2) = to_cartesian(l2, b2, d2);

                    let tol = 1e-9 * d.max(1.0);
                    assert!((x - x2).abs() < tol, "x mismatch at l={l} b={b} d={d}");
                    assert!((y - y2).abs() < tol, "y mismatch at l={l} b={b} d={d}");
                    assert!((z - z2).abs() < tol, "z mismatch at l={l} b={b} d={d}");
                    assert!(rel_close(d2, d, 1e-9));
                }
            }
        }
    }

    #[test]
    fn test_from_cartesian_longitude_range() {
        let (l, b, d) = from_cartesian(0.0, -5.0, 0.0);
        assert!((l - 270.0).abs() < 1e-9);
        assert!(b.abs() < 1e-9);
        assert!((d - 5.0).abs() < 1e-9);

        assert_eq!(from_cartesian(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_clean_scenario_a_and_b() {
        let table = table_of(vec![
            StarRow::complete(0.0, 0.0, 10.0),
            StarRow::complete(90.0, 0.0, 5.0),
        ]);

        let cleaned = clean(&table, false).unwrap();
        let placed = locate(&cleaned, false, None);
        assert_eq!(placed.len(), 2);

        let a = &placed[0];
        assert!((a.distance_pc - 100.0).abs() < 1e-9);
        assert!((a.x - 100.0).abs() < 1e-9);
        assert!(a.y.abs() < 1e-9);
        assert!(a.z.abs() < 1e-9);
        assert!((a.radius - 100.0).abs() < 1e-9);

        let b = &placed[1];
        assert!((b.distance_pc - 200.0).abs() < 1e-9);
        assert!(b.x.abs() < 1e-9);
        assert!((b.y - 200.0).abs() < 1e-9);
        assert!(b.z.abs() < 1e-9);
    }

    #[test]
    fn test_clean_missing_value_drops_row() {
        let table = table_of(vec![StarRow::new(Some(10.0), Some(5.0), None)]);

        let (cleaned, stats) = clean_with_stats(&table, false).unwrap();
        assert!(cleaned.is_empty());
        assert_eq!(stats.missing_values, 1);
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn test_clean_missing_column_fails() {
        let table = StarTable::from_rows(
            ["l", "parallax"],
            vec![StarRow::new(Some(10.0), None, Some(2.0))],
        );

        let err = clean(&table, false).unwrap_err();
        assert_eq!(err, TransformError::MissingColumn("b".to_string()));
        assert_eq!(err.to_string(), "Missing column: b");
    }

    #[test]
    fn test_clean_parallax_policy() {
        let table = table_of(vec![
            StarRow::complete(10.0, 5.0, 2.0),
            StarRow::complete(10.0, 5.0, -2.0),
            StarRow::complete(10.0, 5.0, 0.0),
        ]);

        let (strict, stats) = clean_with_stats(&table, false).unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(stats.undefined_distance, 2);

        let (lenient, stats) = clean_with_stats(&table, true).unwrap();
        assert_eq!(lenient.len(), 2);
        assert_eq!(stats.undefined_distance, 1);

        let placed = locate(&lenient, true, None);
        assert!((placed[1].distance_pc + 500.0).abs() < 1e-9);
        assert!((placed[1].radius - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let table = table_of(vec![
            StarRow::complete(10.0, 5.0, 2.0),
            StarRow::new(None, Some(5.0), Some(1.0)),
            StarRow::complete(f64::INFINITY, 5.0, 1.0),
            StarRow::complete(200.0, -30.0, -0.5),
            StarRow::complete(300.0, 45.0, 0.25),
        ]);

        for allow in [false, true] {
            let (once, stats) = clean_with_stats(&table, allow).unwrap();
            assert_eq!(stats.missing_values, 1);
            assert_eq!(stats.invalid_position, 1);
            assert_eq!(stats.undefined_distance, if allow { 0 } else { 1 });

            let twice = clean(&once, allow).unwrap();
            assert_eq!(once, twice);
            assert!(once.len() <= table.len());
        }
    }

    #[test]
    fn test_radius_matches_norm() {
        let table = table_of(
            (0..50)
                .map(|i| StarRow::complete(i as f64 * 7.3, (i as f64 * 3.1) % 180.0 - 90.0, 0.1 + i as f64))
                .collect(),
        );

        for star in locate(&clean(&table, false).unwrap(), false, None) {
            let norm = (star.x.powi(2) + star.y.powi(2) + star.z.powi(2)).sqrt();
            assert!(rel_close(star.radius, norm, 1e-12));
            assert!(rel_close(star.radius, star.distance_pc.abs(), 1e-9));
        }
    }

    #[test]
    fn test_locate_distance_cap() {
        let table = table_of(vec![
            StarRow::complete(0.0, 0.0, 1.0),  // 1000 pc
            StarRow::complete(0.0, 0.0, 0.1),  // 10000 pc
            StarRow::complete(0.0, 0.0, 0.2),  // 5000 pc, on the cap
        ]);

        let placed = locate(&clean(&table, false).unwrap(), false, Some(5000.0));
        assert_eq!(placed.len(), 1);
        assert!((placed[0].radius - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_locate_keeps_passthrough_cells() {
        let table = StarTable::from_rows(
            ["source_id", "l", "b", "parallax"],
            vec![StarRow::complete(0.0, 0.0, 10.0).with_extra(vec!["42".to_string()])],
        );

        let placed = locate(&clean(&table, false).unwrap(), false, None);
        assert_eq!(placed[0].extra, vec!["42".to_string()]);
    }
}
