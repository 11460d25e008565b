//! Longevity Score - biomarker bonus-years engine
//!
//! Estimates how many expected years of life could be gained by moving each
//! measured biomarker into its optimal range, using hazard ratios and
//! mortality counts from published cohort studies, and rolls the estimates
//! into a 0-100 score without double counting correlated markers.

pub mod config;
pub mod core;
pub mod models;

// Re-export commonly used types
pub use core::{Catalog, DatasetError, LongevityScorer, ScoringError};
pub use models::{
    BiomarkerImpact, Grade, GradeThresholds, Measurement, OverallScoreReport, ScoreResponse, ScoringParams,
    ScoringRequest,
};
