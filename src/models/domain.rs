use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

/// Physiological systems whose biomarkers share underlying risk.
///
/// Members of one group are aggregated by maximum rather than sum.
/// `Independent` biomarkers each form a group of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationGroup {
    Lipids,
    BodyComposition,
    GlucoseMetabolism,
    Inflammation,
    BloodCells,
    Cardiovascular,
    Kidney,
    Liver,
    Fitness,
    Hormones,
    Independent,
}

impl CorrelationGroup {
    pub const ALL: [CorrelationGroup; 11] = [
        CorrelationGroup::Lipids,
        CorrelationGroup::BodyComposition,
        CorrelationGroup::GlucoseMetabolism,
        CorrelationGroup::Inflammation,
        CorrelationGroup::BloodCells,
        CorrelationGroup::Cardiovascular,
        CorrelationGroup::Kidney,
        CorrelationGroup::Liver,
        CorrelationGroup::Fitness,
        CorrelationGroup::Hormones,
        CorrelationGroup::Independent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationGroup::Lipids => "lipids",
            CorrelationGroup::BodyComposition => "body_composition",
            CorrelationGroup::GlucoseMetabolism => "glucose_metabolism",
            CorrelationGroup::Inflammation => "inflammation",
            CorrelationGroup::BloodCells => "blood_cells",
            CorrelationGroup::Cardiovascular => "cardiovascular",
            CorrelationGroup::Kidney => "kidney",
            CorrelationGroup::Liver => "liver",
            CorrelationGroup::Fitness => "fitness",
            CorrelationGroup::Hormones => "hormones",
            CorrelationGroup::Independent => "independent",
        }
    }
}

impl fmt::Display for CorrelationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CorrelationGroup::ALL
            .iter()
            .copied()
            .find(|group| group.as_str() == wanted)
            .ok_or_else(|| format!("unknown correlation group '{}'", s))
    }
}

/// Closed numeric interval; a missing bound is stored as an infinity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Range with only a lower bound (higher is better)
    pub fn at_least(low: f64) -> Self {
        Self { low, high: f64::INFINITY }
    }

    /// Range with only an upper bound (lower is better)
    pub fn at_most(high: f64) -> Self {
        Self { low: f64::NEG_INFINITY, high }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Distance from the value to the nearest bound, 0 inside the range
    #[inline]
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.low {
            self.low - value
        } else if value > self.high {
            value - self.high
        } else {
            0.0
        }
    }

    /// Human readable target, e.g. `50-100 mg/dL`, `>8 METs`, `<1 mg/L`
    pub fn describe(&self, unit: &str) -> String {
        let text = match (self.low.is_finite(), self.high.is_finite()) {
            (true, true) => format!("{}-{}", self.low, self.high),
            (true, false) => format!(">{}", self.low),
            (false, true) => format!("<{}", self.high),
            (false, false) => "any".to_string(),
        };

        if unit.is_empty() {
            text
        } else {
            format!("{} {}", text, unit)
        }
    }
}

/// The study a catalog entry's statistics were taken from
#[derive(Debug, Clone, PartialEq)]
pub struct StudyEvidence {
    pub label: String,
    pub pmid: Option<u64>,
    pub cohort: Option<String>,
    /// Hazard ratio as published, before clamping
    pub source_hazard_ratio: f64,
}

/// One known biomarker, immutable once the catalog is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct BiomarkerDefinition {
    pub canonical_name: String,
    /// One token set per name or synonym
    pub match_tokens: Vec<BTreeSet<String>>,
    pub unit: String,
    pub category: String,
    pub optimal_range: ValueRange,
    pub plausible_range: Option<ValueRange>,
    pub allows_negative: bool,
    /// Clamped into the configured band at load time
    pub hazard_ratio: f64,
    pub n_deaths: u64,
    pub n_subjects: u64,
    pub follow_up_years: f64,
    pub correlation_group: CorrelationGroup,
    pub evidence: StudyEvidence,
    /// Position in the source dataset, used for deterministic tie-breaks
    pub catalog_index: usize,
}

impl BiomarkerDefinition {
    /// Size of the most specific alias fully present in `tokens`
    pub fn specificity_for(&self, tokens: &BTreeSet<String>) -> Option<usize> {
        self.match_tokens
            .iter()
            .filter(|alias| !alias.is_empty() && alias.is_subset(tokens))
            .map(|alias| alias.len())
            .max()
    }
}

/// A single caller-supplied value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Measurement {
    #[validate(length(min = 1))]
    #[serde(alias = "name", rename = "raw_name")]
    pub raw_name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source: String,
}

impl Measurement {
    pub fn new(raw_name: impl Into<String>, value: f64, unit: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            value,
            unit: unit.into(),
            source: source.into(),
        }
    }
}

/// Projected effect of one matched measurement
#[derive(Debug, Clone, PartialEq)]
pub struct BiomarkerImpact {
    pub biomarker: Arc<BiomarkerDefinition>,
    pub raw_name: String,
    pub measured_value: f64,
    pub unit: String,
    pub source: String,
    pub distance_from_optimal: f64,
    pub is_optimal: bool,
    pub optimal_rate: f64,
    pub measured_rate: f64,
    pub per_biomarker_score: u8,
    pub bonus_years: f64,
}

impl BiomarkerImpact {
    pub fn name(&self) -> &str {
        &self.biomarker.canonical_name
    }

    pub fn group(&self) -> CorrelationGroup {
        self.biomarker.correlation_group
    }
}

/// Gamified tier, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    Rookie,
    Bronze,
    Silver,
    Gold,
    Diamond,
    Legendary,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::Rookie => "Rookie",
            Grade::Bronze => "Bronze",
            Grade::Silver => "Silver",
            Grade::Gold => "Gold",
            Grade::Diamond => "Diamond",
            Grade::Legendary => "Legendary",
        };
        f.write_str(label)
    }
}

/// Minimum overall score for each grade; anything below `bronze` is Rookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeThresholds {
    pub legendary: u8,
    pub diamond: u8,
    pub gold: u8,
    pub silver: u8,
    pub bronze: u8,
}

impl GradeThresholds {
    pub fn grade_for(&self, score: u8) -> Grade {
        if score >= self.legendary {
            Grade::Legendary
        } else if score >= self.diamond {
            Grade::Diamond
        } else if score >= self.gold {
            Grade::Gold
        } else if score >= self.silver {
            Grade::Silver
        } else if score >= self.bronze {
            Grade::Bronze
        } else {
            Grade::Rookie
        }
    }
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            legendary: 90,
            diamond: 80,
            gold: 70,
            silver: 60,
            bronze: 50,
        }
    }
}

/// Numeric knobs of the scoring model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub max_age: u32,
    pub max_bonus_years: f64,
    pub min_annual_rate: f64,
    pub max_optimal_rate: f64,
    pub max_measured_rate: f64,
    pub hazard_ratio_min: f64,
    pub hazard_ratio_max: f64,
    /// Share of the overall score driven by the optimized-marker fraction
    pub optimized_weight: f64,
}

impl ScoringParams {
    #[inline]
    pub fn clamp_hazard_ratio(&self, hazard_ratio: f64) -> f64 {
        hazard_ratio.clamp(self.hazard_ratio_min, self.hazard_ratio_max)
    }

    #[inline]
    pub fn hazard_ratio_in_band(&self, hazard_ratio: f64) -> bool {
        hazard_ratio >= self.hazard_ratio_min && hazard_ratio <= self.hazard_ratio_max
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            max_age: 85,
            max_bonus_years: 10.0,
            min_annual_rate: 1e-6,
            max_optimal_rate: 0.10,
            max_measured_rate: 0.20,
            hazard_ratio_min: 0.3,
            hazard_ratio_max: 3.0,
            optimized_weight: 0.5,
        }
    }
}

/// Why a measurement was left out of scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmissionKind {
    NotFound,
    AmbiguousMatch,
    InvalidMeasurement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Omission {
    pub raw_name: String,
    pub kind: OmissionKind,
    pub reason: String,
}

/// Largest bonus within one aggregation group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBonus {
    pub group: CorrelationGroup,
    pub biomarker: String,
    pub bonus_years: f64,
    pub members: usize,
}

/// Result of one scoring request
#[derive(Debug, Clone, PartialEq)]
pub struct OverallScoreReport {
    pub subject_age: u32,
    pub overall_score: u8,
    pub grade: Grade,
    pub total_bonus_years: f64,
    pub top_opportunity: Option<BiomarkerImpact>,
    pub optimized_count: usize,
    pub opportunities_count: usize,
    pub group_bonuses: Vec<GroupBonus>,
    /// Indices into `per_biomarker_breakdown`, biggest opportunity first
    pub priorities: Vec<usize>,
    pub per_biomarker_breakdown: Vec<BiomarkerImpact>,
    pub omissions: Vec<Omission>,
}

impl OverallScoreReport {
    /// Non-optimal impacts ranked by bonus years
    pub fn priority_impacts(&self) -> impl Iterator<Item = &BiomarkerImpact> {
        self.priorities
            .iter()
            .filter_map(|&idx| self.per_biomarker_breakdown.get(idx))
    }
}
