use serde::{Deserialize, Serialize};
use crate::core::phenoage::{MarkerContribution, PhenoAgeReport};
use crate::models::domain::{BiomarkerImpact, CorrelationGroup, Grade, OmissionKind, OverallScoreReport};

/// Scoring response document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub overall_score: u8,
    pub grade: Grade,
    pub total_bonus_years: f64,
    pub top_opportunity: Option<TopOpportunity>,
    pub optimized_count: usize,
    pub opportunities_count: usize,
    pub subject_age: u32,
    pub priorities: Vec<String>,
    pub breakdown: Vec<BiomarkerBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omissions: Vec<OmissionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biological_age: Option<BiologicalAgeResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOpportunity {
    pub biomarker: String,
    pub bonus_years: f64,
    pub current_score: u8,
    pub your_value: f64,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerBreakdown {
    pub name: String,
    pub input_name: String,
    pub measured_value: f64,
    pub unit: String,
    pub source: String,
    pub target_range: String,
    pub correlation_group: CorrelationGroup,
    pub is_optimal: bool,
    pub score: u8,
    pub bonus_years: f64,
}

/// Phenotypic age section; ages reported to two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiologicalAgeResponse {
    pub biological_age_now: f64,
    pub biological_age_target: f64,
    pub years_biological_gained: f64,
    pub contributions: Vec<MarkerGain>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerGain {
    pub biomarker: String,
    pub years_gained_if_optimized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmissionEntry {
    pub name: String,
    pub kind: OmissionKind,
    pub reason: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Year figures are reported to one decimal place
#[inline]
fn round_years(years: f64) -> f64 {
    (years * 10.0).round() / 10.0
}

#[inline]
fn round_hundredths(years: f64) -> f64 {
    (years * 100.0).round() / 100.0
}

impl From<&MarkerContribution> for MarkerGain {
    fn from(contribution: &MarkerContribution) -> Self {
        Self {
            biomarker: contribution.marker.catalog_name().to_string(),
            years_gained_if_optimized: round_hundredths(contribution.years_gained),
        }
    }
}

impl From<&PhenoAgeReport> for BiologicalAgeResponse {
    fn from(report: &PhenoAgeReport) -> Self {
        Self {
            biological_age_now: round_hundredths(report.biological_age_now),
            biological_age_target: round_hundredths(report.biological_age_target),
            years_biological_gained: round_hundredths(report.years_gained),
            contributions: report.contributions.iter().map(MarkerGain::from).collect(),
        }
    }
}

impl ScoreResponse {
    pub fn with_biological_age(mut self, report: Option<&PhenoAgeReport>) -> Self {
        self.biological_age = report.map(BiologicalAgeResponse::from);
        self
    }
}

impl From<&BiomarkerImpact> for TopOpportunity {
    fn from(impact: &BiomarkerImpact) -> Self {
        Self {
            biomarker: impact.name().to_string(),
            bonus_years: round_years(impact.bonus_years),
            current_score: impact.per_biomarker_score,
            your_value: impact.measured_value,
            target: impact.biomarker.optimal_range.describe(&impact.biomarker.unit),
        }
    }
}

impl From<&BiomarkerImpact> for BiomarkerBreakdown {
    fn from(impact: &BiomarkerImpact) -> Self {
        Self {
            name: impact.name().to_string(),
            input_name: impact.raw_name.clone(),
            measured_value: impact.measured_value,
            unit: impact.unit.clone(),
            source: impact.source.clone(),
            target_range: impact.biomarker.optimal_range.describe(&impact.biomarker.unit),
            correlation_group: impact.group(),
            is_optimal: impact.is_optimal,
            score: impact.per_biomarker_score,
            bonus_years: round_years(impact.bonus_years),
        }
    }
}

impl From<&OverallScoreReport> for ScoreResponse {
    fn from(report: &OverallScoreReport) -> Self {
        Self {
            overall_score: report.overall_score,
            grade: report.grade,
            total_bonus_years: round_years(report.total_bonus_years),
            top_opportunity: report.top_opportunity.as_ref().map(TopOpportunity::from),
            optimized_count: report.optimized_count,
            opportunities_count: report.opportunities_count,
            subject_age: report.subject_age,
            priorities: report
                .priority_impacts()
                .map(|impact| impact.name().to_string())
                .collect(),
            breakdown: report
                .per_biomarker_breakdown
                .iter()
                .map(BiomarkerBreakdown::from)
                .collect(),
            omissions: report
                .omissions
                .iter()
                .map(|omission| OmissionEntry {
                    name: omission.raw_name.clone(),
                    kind: omission.kind,
                    reason: omission.reason.clone(),
                })
                .collect(),
            biological_age: None,
        }
    }
}
