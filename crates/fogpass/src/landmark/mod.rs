//! Landmark records and the per-row checks applied before persistence.
//!
//! A parser yields a [`RawLandmark`] with coordinates still in their source
//! text form. [`prepare`] runs the coordinate normalizer and then the row
//! validator, producing a [`Landmark`] ready for the batch persister.

pub mod coordinates;
pub mod error;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use coordinates::{normalize_coordinate, Axis};
pub use error::RowError;
pub use validation::validate;

/// Row fields as read from the source, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLandmark {
    pub sequence_order: Option<i64>,
    pub location_code: String,
    pub landmark_type: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub prewarning_distance: Option<i64>,
    pub direction: String,
}

/// A row with coordinates converted to decimal degrees but not yet checked.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLandmark {
    pub sequence_order: Option<i64>,
    pub location_code: String,
    pub landmark_type: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub prewarning_distance: Option<i64>,
    pub direction: String,
}

/// A validated landmark, ready to be written against a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub sequence_order: i64,
    pub location_code: String,
    pub landmark_type: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub prewarning_distance: Option<i64>,
    pub direction: String,
}

/// Converts the coordinate tokens of a raw row to decimal degrees.
pub fn normalize(raw: RawLandmark) -> Result<CandidateLandmark, RowError> {
    let latitude = normalize_coordinate(&raw.latitude, Axis::Latitude)?;
    let longitude = normalize_coordinate(&raw.longitude, Axis::Longitude)?;

    Ok(CandidateLandmark {
        sequence_order: raw.sequence_order,
        location_code: raw.location_code,
        landmark_type: raw.landmark_type,
        name: raw.name,
        latitude,
        longitude,
        prewarning_distance: raw.prewarning_distance,
        direction: raw.direction,
    })
}

/// Normalizes then validates one row.
pub fn prepare(raw: RawLandmark) -> Result<Landmark, RowError> {
    validate(normalize(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lat: &str, lon: &str) -> RawLandmark {
        RawLandmark {
            sequence_order: Some(1),
            location_code: "ALD".to_string(),
            landmark_type: "STATION".to_string(),
            name: "Prayagraj".to_string(),
            latitude: lat.to_string(),
            longitude: lon.to_string(),
            prewarning_distance: Some(400),
            direction: "DN".to_string(),
        }
    }

    #[test]
    fn test_prepare_mixed_encodings() {
        let landmark = prepare(raw("25.4460", "8150.7600")).unwrap();
        assert!((landmark.latitude - 25.446).abs() < 1e-9);
        assert!((landmark.longitude - (81.0 + 50.76 / 60.0)).abs() < 1e-9);
        assert_eq!(landmark.sequence_order, 1);
        assert_eq!(landmark.prewarning_distance, Some(400));
    }

    #[test]
    fn test_prepare_reports_normalizer_failure() {
        let err = prepare(raw("north", "81.0")).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_prepare_reports_validator_failure() {
        let err = prepare(raw("25.0", "")).unwrap_err();
        assert_eq!(err.to_string(), "longitude is required");
    }
}
