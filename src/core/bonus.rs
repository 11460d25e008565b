use crate::core::{mortality::annual_mortality, survival::expected_remaining_years};
use crate::models::{BiomarkerDefinition, BiomarkerImpact, Measurement, ScoringParams};
use std::sync::Arc;
use thiserror::Error;

/// A measured value that cannot be scored
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasurementError {
    #[error("{name}: value {value} is not a finite number")]
    NonFinite { name: String, value: f64 },

    #[error("{name}: negative value {value} is not physically possible")]
    Negative { name: String, value: f64 },

    #[error("{name}: value {value} is outside the plausible range {range}")]
    OutOfRange { name: String, value: f64, range: String },
}

/// Reject values that cannot describe a real measurement of this biomarker
pub fn validate_measurement(measurement: &Measurement, definition: &BiomarkerDefinition) -> Result<(), MeasurementError> {
    let value = measurement.value;
    let name = || definition.canonical_name.clone();

    if !value.is_finite() {
        return Err(MeasurementError::NonFinite { name: name(), value });
    }

    if value < 0.0 && !definition.allows_negative {
        return Err(MeasurementError::Negative { name: name(), value });
    }

    if let Some(range) = definition.plausible_range {
        if !range.contains(value) {
            return Err(MeasurementError::OutOfRange {
                name: name(),
                value,
                range: range.describe(&definition.unit),
            });
        }
    }

    Ok(())
}

/// Map bonus years back onto 0-100, where 100 means nothing left to gain
#[inline]
pub fn score_from_bonus(bonus_years: f64, max_bonus_years: f64) -> u8 {
    if max_bonus_years <= 0.0 {
        return 100;
    }
    let score = 100.0 * (1.0 - bonus_years / max_bonus_years);
    score.round().clamp(0.0, 100.0) as u8
}

/// Project the years gained by moving one measurement into its optimal range
///
/// Holding age fixed, compares expected remaining years at the optimal
/// mortality rate against the as-measured rate. The gain is capped at
/// `max_bonus_years` per biomarker and is exactly 0 inside the range.
pub fn compute_impact(
    measurement: &Measurement,
    definition: &Arc<BiomarkerDefinition>,
    age: u32,
    params: &ScoringParams,
) -> Result<BiomarkerImpact, MeasurementError> {
    validate_measurement(measurement, definition)?;

    let value = measurement.value;
    let rates = annual_mortality(definition, params);
    let is_optimal = definition.optimal_range.contains(value);

    let years_optimal = expected_remaining_years(rates.optimal_rate, age, params.max_age);
    let (measured_rate, years_measured) = if is_optimal {
        (rates.optimal_rate, years_optimal)
    } else {
        (
            rates.worst_case_rate,
            expected_remaining_years(rates.worst_case_rate, age, params.max_age),
        )
    };

    let bonus_years = (years_optimal - years_measured).clamp(0.0, params.max_bonus_years.max(0.0));

    Ok(BiomarkerImpact {
        biomarker: Arc::clone(definition),
        raw_name: measurement.raw_name.clone(),
        measured_value: value,
        unit: measurement.unit.clone(),
        source: measurement.source.clone(),
        distance_from_optimal: definition.optimal_range.distance(value),
        is_optimal,
        optimal_rate: rates.optimal_rate,
        measured_rate,
        per_biomarker_score: score_from_bonus(bonus_years, params.max_bonus_years),
        bonus_years,
    })
}
