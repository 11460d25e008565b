// Model exports
pub mod dataset;
pub mod domain;
pub mod requests;
pub mod responses;

pub use dataset::{BiomarkerRecord, CatalogDocument, CatalogMetadata, RangeRecord, StudyRecord};
pub use domain::{
    BiomarkerDefinition, BiomarkerImpact, CorrelationGroup, Grade, GradeThresholds, GroupBonus, Measurement,
    Omission, OmissionKind, OverallScoreReport, ScoringParams, StudyEvidence, ValueRange,
};
pub use requests::ScoringRequest;
pub use responses::{
    BiologicalAgeResponse, BiomarkerBreakdown, ErrorResponse, MarkerGain, OmissionEntry, ScoreResponse, TopOpportunity,
};
