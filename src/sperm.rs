//! Composite 0–100 sperm health score.
//!
//! Each metric maps to a sub-score. Below its WHO lower reference limit it rises
//! linearly from 0 toward 50. At the limit it jumps to 60, then rises linearly to 100 at
//! an optimal cap and stays flat above. The composite is the weighted sum, rounded:
//!
//! score = count × 0.30 + motility × 0.30 + morphology × 0.25 + volume × 0.15
//!
//! A result meeting every lower limit exactly scores 60, the bottom of the normal band.

use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{ScoredSpermTest, SpermHealthBand, SpermMeasurements, SpermTestRecord};

/// Sub-score awarded to a value sitting exactly on its lower reference limit.
const THRESHOLD_SUBSCORE: f64 = 60.0;
/// Sub-score approached from below the limit. The gap to `THRESHOLD_SUBSCORE` keeps any
/// shortfall visible after rounding.
const BELOW_THRESHOLD_CEILING: f64 = 50.0;

struct MetricScale {
    field: &'static str,
    low: f64,
    optimal: f64,
    weight: f64,
}

const COUNT: MetricScale = MetricScale {
    field: "count",
    low: 15.0,
    optimal: 40.0,
    weight: 0.30,
};
const MOTILITY: MetricScale = MetricScale {
    field: "motility",
    low: 40.0,
    optimal: 60.0,
    weight: 0.30,
};
const MORPHOLOGY: MetricScale = MetricScale {
    field: "morphology",
    low: 4.0,
    optimal: 14.0,
    weight: 0.25,
};
const VOLUME: MetricScale = MetricScale {
    field: "volume",
    low: 1.5,
    optimal: 3.0,
    weight: 0.15,
};

impl MetricScale {
    fn subscore(&self, value: f64) -> f64 {
        if value < self.low {
            BELOW_THRESHOLD_CEILING * value / self.low
        } else if value < self.optimal {
            THRESHOLD_SUBSCORE
                + (100.0 - THRESHOLD_SUBSCORE) * (value - self.low) / (self.optimal - self.low)
        } else {
            100.0
        }
    }

    fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidMeasurement {
                record_id: None,
                field: self.field,
                value,
            });
        }
        Ok(value)
    }
}

pub fn score(test: &SpermMeasurements) -> Result<u8, ValidationError> {
    let parts = [
        (&COUNT, test.count),
        (&MOTILITY, test.motility),
        (&MORPHOLOGY, test.morphology),
        (&VOLUME, test.volume),
    ];

    let mut total = 0.0;
    for (scale, value) in parts {
        total += scale.weight * scale.subscore(scale.check(value)?);
    }

    Ok(total.round().clamp(0.0, 100.0) as u8)
}

pub fn band(score: u8) -> SpermHealthBand {
    match score {
        0..=39 => SpermHealthBand::Poor,
        40..=59 => SpermHealthBand::Fair,
        60..=79 => SpermHealthBand::Normal,
        _ => SpermHealthBand::Excellent,
    }
}

/// [`score`], with any validation failure tagged with `record_id`.
pub fn score_for_record(
    record_id: Uuid,
    test: &SpermMeasurements,
) -> Result<u8, ValidationError> {
    score(test).map_err(|e| match e {
        ValidationError::InvalidMeasurement { field, value, .. } => {
            ValidationError::InvalidMeasurement {
                record_id: Some(record_id),
                field,
                value,
            }
        }
        other => other,
    })
}

pub fn score_record(record: SpermTestRecord) -> Result<ScoredSpermTest, ValidationError> {
    let score = score_for_record(record.id, &record.measurements)?;

    Ok(ScoredSpermTest {
        test: record,
        score,
        band: band(score),
    })
}

/// Scores the most recent test. `Ok(None)` when there are none.
pub fn latest_score(tests: &[SpermTestRecord]) -> Result<Option<ScoredSpermTest>, ValidationError> {
    tests
        .iter()
        .max_by_key(|t| t.date)
        .cloned()
        .map(score_record)
        .transpose()
}
