//! Coordinate normalization.
//!
//! Upstream sources mix two encodings for the same field: plain decimal
//! degrees (`25.4460`) and packed degrees-minutes (`2526.7599`, meaning
//! 25 degrees 26.7599 minutes). Both latitude and longitude go through the
//! same routine; the decimal bound is the longitude bound so that either
//! axis passes the first check. Range checks per axis belong to the
//! validator.

use super::error::RowError;

/// Largest magnitude accepted as already being decimal degrees.
const DECIMAL_DEGREE_LIMIT: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }

    /// Inclusive valid range in decimal degrees.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Self::Latitude => (-90.0, 90.0),
            Self::Longitude => (-180.0, 180.0),
        }
    }
}

/// Converts a coordinate token to decimal degrees.
///
/// Returns `Ok(None)` for an empty token; presence is enforced later by
/// the validator so that its message is the one the operator sees.
pub fn normalize_coordinate(token: &str, axis: Axis) -> Result<Option<f64>, RowError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let value = token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(RowError::Coordinate {
            field: axis.field_name(),
        })?;

    if value.abs() <= DECIMAL_DEGREE_LIMIT {
        return Ok(Some(value));
    }

    Ok(Some(from_packed_degrees_minutes(value)))
}

/// `DDMM.MMMM` to decimal degrees. The sign of the input carries through
/// both the degree and minute parts.
fn from_packed_degrees_minutes(value: f64) -> f64 {
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    degrees + minutes / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decimal_token_passes_through() {
        let v = normalize_coordinate("25.4460", Axis::Latitude).unwrap().unwrap();
        assert!(approx(v, 25.4460));
    }

    #[test]
    fn test_packed_token_is_converted() {
        let v = normalize_coordinate("2526.7599", Axis::Latitude)
            .unwrap()
            .unwrap();
        assert!(approx(v, 25.0 + 26.7599 / 60.0));
        assert!((v - 25.446).abs() < 1e-3);
    }

    #[test]
    fn test_packed_longitude_above_hundred_degrees() {
        let v = normalize_coordinate("10230.0000", Axis::Longitude)
            .unwrap()
            .unwrap();
        assert!(approx(v, 102.5));
    }

    #[test]
    fn test_negative_packed_token_keeps_sign() {
        let v = normalize_coordinate("-3345.0", Axis::Latitude).unwrap().unwrap();
        assert!(approx(v, -33.75));
    }

    #[test]
    fn test_boundary_value_is_decimal() {
        let v = normalize_coordinate("-180", Axis::Longitude).unwrap().unwrap();
        assert!(approx(v, -180.0));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let v = normalize_coordinate("  81.85 ", Axis::Longitude)
            .unwrap()
            .unwrap();
        assert!(approx(v, 81.85));
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert_eq!(normalize_coordinate("", Axis::Latitude).unwrap(), None);
        assert_eq!(normalize_coordinate("   ", Axis::Longitude).unwrap(), None);
    }

    #[test]
    fn test_garbage_token_names_field() {
        let err = normalize_coordinate("25N", Axis::Latitude).unwrap_err();
        assert_eq!(
            err.to_string(),
            "latitude must be decimal degrees or ddmm.mmmm"
        );

        let err = normalize_coordinate("east", Axis::Longitude).unwrap_err();
        assert_eq!(
            err.to_string(),
            "longitude must be decimal degrees or ddmm.mmmm"
        );
    }

    #[test]
    fn test_non_finite_token_is_rejected() {
        assert!(normalize_coordinate("NaN", Axis::Latitude).is_err());
        assert!(normalize_coordinate("inf", Axis::Longitude).is_err());
    }
}
