// Core algorithm exports
pub mod aggregate;
pub mod bonus;
pub mod catalog;
pub mod mortality;
pub mod name_match;
pub mod phenoage;
pub mod scorer;
pub mod survival;

pub use aggregate::Aggregator;
pub use bonus::{compute_impact, score_from_bonus, validate_measurement, MeasurementError};
pub use catalog::{Catalog, DatasetError};
pub use mortality::{annual_mortality, risk_multiplier, AnnualMortality};
pub use name_match::{resolve, tokenize, MatchError};
pub use phenoage::{
    phenotypic_age, years_gained, MarkerContribution, PhenoAgeError, PhenoAgeMarker, PhenoAgePanel, PhenoAgeReport,
};
pub use scorer::{LongevityScorer, ScoringError};
pub use survival::expected_remaining_years;
