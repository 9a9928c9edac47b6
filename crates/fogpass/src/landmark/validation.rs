use super::coordinates::Axis;
use super::error::RowError;
use super::{CandidateLandmark, Landmark};

/// Applies presence and range rules to a normalized row.
pub fn validate(candidate: CandidateLandmark) -> Result<Landmark, RowError> {
    let latitude = check_coordinate(candidate.latitude, Axis::Latitude)?;
    let longitude = check_coordinate(candidate.longitude, Axis::Longitude)?;

    let sequence_order = candidate.sequence_order.ok_or(RowError::Missing {
        field: "sequence order",
    })?;
    if sequence_order < 0 {
        return Err(RowError::Negative {
            field: "sequence order",
            value: sequence_order,
        });
    }

    if let Some(distance) = candidate.prewarning_distance {
        if distance < 0 {
            return Err(RowError::Negative {
                field: "prewarning distance",
                value: distance,
            });
        }
    }

    Ok(Landmark {
        sequence_order,
        location_code: candidate.location_code,
        landmark_type: candidate.landmark_type,
        name: candidate.name,
        latitude,
        longitude,
        prewarning_distance: candidate.prewarning_distance,
        direction: candidate.direction,
    })
}

fn check_coordinate(value: Option<f64>, axis: Axis) -> Result<f64, RowError> {
    let value = value.ok_or(RowError::Missing {
        field: axis.field_name(),
    })?;
    let (min, max) = axis.bounds();
    if !(min..=max).contains(&value) {
        return Err(RowError::OutOfRange {
            field: axis.field_name(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}
