use crate::core::{
    aggregate::Aggregator,
    bonus::compute_impact,
    catalog::Catalog,
    name_match::{resolve, MatchError},
    phenoage::{years_gained, PhenoAgeError, PhenoAgePanel, PhenoAgeReport},
};
use crate::models::{
    BiomarkerImpact, GradeThresholds, Measurement, Omission, OmissionKind, OverallScoreReport, ScoringParams,
    ScoringRequest,
};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

/// Request-level failures; the whole request is rejected
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Age {age} is outside the supported range 0..{max_age}")]
    InvalidAge { age: u32, max_age: u32 },

    #[error("Invalid scoring request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Biological age unavailable: {0}")]
    BiologicalAge(#[from] PhenoAgeError),
}

/// Main scoring orchestrator
///
/// # Pipeline Stages
/// 1. Name matching against the catalog
/// 2. Measurement validation
/// 3. Mortality model and survival projection (per biomarker, in parallel)
/// 4. Correlation-aware aggregation
#[derive(Debug, Clone)]
pub struct LongevityScorer {
    catalog: Arc<Catalog>,
    params: ScoringParams,
    aggregator: Aggregator,
}

impl LongevityScorer {
    pub fn new(catalog: Arc<Catalog>, params: ScoringParams, grades: GradeThresholds) -> Self {
        Self {
            catalog,
            params,
            aggregator: Aggregator::new(params, grades),
        }
    }

    pub fn with_defaults(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, ScoringParams::default(), GradeThresholds::default())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Validate a request document, then score it
    pub fn score_request(&self, request: &ScoringRequest) -> Result<OverallScoreReport, ScoringError> {
        self.check_age(request.age)?;
        request.validate()?;
        self.score(&request.measurements, request.age)
    }

    /// Score a measurement list for a subject of the given age
    ///
    /// # Arguments
    /// * `measurements` - Values in caller order; breakdown keeps this order
    /// * `age` - Subject age, must be below the configured `max_age`
    ///
    /// # Returns
    /// The overall report. Measurements that cannot be matched or are not
    /// plausible are listed in `omissions` and do not affect the rest.
    pub fn score(&self, measurements: &[Measurement], age: u32) -> Result<OverallScoreReport, ScoringError> {
        self.check_age(age)?;

        let outcomes: Vec<Result<BiomarkerImpact, Omission>> = measurements
            .par_iter()
            .map(|measurement| self.evaluate(measurement, age))
            .collect();

        let mut impacts = Vec::with_capacity(outcomes.len());
        let mut omissions = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(impact) => impacts.push(impact),
                Err(omission) => {
                    tracing::debug!("Skipping measurement '{}': {}", omission.raw_name, omission.reason);
                    omissions.push(omission);
                }
            }
        }

        let mut report = self.aggregator.aggregate(impacts);
        report.subject_age = age;
        report.omissions = omissions;

        tracing::info!(
            "Scored {} of {} measurements for age {}: score {} ({}), +{:.1} bonus years",
            report.per_biomarker_breakdown.len(),
            measurements.len(),
            age,
            report.overall_score,
            report.grade,
            report.total_bonus_years
        );

        Ok(report)
    }

    /// Phenotypic age and the years each measured marker could take off it
    ///
    /// Returns `None` when none of the model's markers was measured.
    pub fn biological_age(&self, measurements: &[Measurement], age: u32) -> Result<Option<PhenoAgeReport>, ScoringError> {
        self.check_age(age)?;

        let panel = PhenoAgePanel::from_measurements(&self.catalog, measurements, age as f64);
        if panel.is_empty() {
            return Ok(None);
        }

        let report = years_gained(&panel)?;
        tracing::info!(
            "Phenotypic age {:.1} at age {} (-{:.1} years at target)",
            report.biological_age_now,
            age,
            report.years_gained
        );
        Ok(Some(report))
    }

    /// Match, validate and project a single measurement
    fn evaluate(&self, measurement: &Measurement, age: u32) -> Result<BiomarkerImpact, Omission> {
        let definition = resolve(&self.catalog, &measurement.raw_name).map_err(|err| {
            let kind = match err {
                MatchError::NotFound(_) => OmissionKind::NotFound,
                MatchError::Ambiguous { .. } => OmissionKind::AmbiguousMatch,
            };
            Omission {
                raw_name: measurement.raw_name.clone(),
                kind,
                reason: err.to_string(),
            }
        })?;

        let impact = compute_impact(measurement, &definition, age, &self.params).map_err(|err| Omission {
            raw_name: measurement.raw_name.clone(),
            kind: OmissionKind::InvalidMeasurement,
            reason: err.to_string(),
        })?;

        tracing::debug!(
            "{} = {} -> {} (+{:.2} years, score {})",
            measurement.raw_name,
            measurement.value,
            impact.name(),
            impact.bonus_years,
            impact.per_biomarker_score
        );

        Ok(impact)
    }

    fn check_age(&self, age: u32) -> Result<(), ScoringError> {
        if age >= self.params.max_age {
            return Err(ScoringError::InvalidAge {
                age,
                max_age: self.params.max_age,
            });
        }
        Ok(())
    }
}
