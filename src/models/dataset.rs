use serde::{Deserialize, Serialize};

/// On-disk biomarker reference dataset
///
/// Produced by the offline study-ingestion job. Records keep their file order,
/// which becomes the catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub metadata: Option<CatalogMetadata>,
    #[serde(default)]
    pub biomarkers: Vec<BiomarkerRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub version: Option<String>,
    pub source: Option<String>,
    pub total_biomarkers: Option<usize>,
}

/// One biomarker as stored in the dataset
///
/// Required fields are optional here so that a missing one is reported by
/// name instead of as a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiomarkerRecord {
    pub name: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub correlation_group: Option<String>,
    pub optimal_range: Option<RangeRecord>,
    #[serde(default)]
    pub plausible_range: Option<RangeRecord>,
    #[serde(default)]
    pub allows_negative: bool,
    #[serde(default)]
    pub studies: Vec<StudyRecord>,
}

/// Either bound may be omitted for threshold-style targets
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RangeRecord {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// A single mortality study reporting on the biomarker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyRecord {
    #[serde(default)]
    pub label: Option<String>,
    pub hazard_ratio: Option<f64>,
    pub n_subjects: Option<i64>,
    pub n_deaths: Option<i64>,
    pub follow_up_years: Option<f64>,
    #[serde(default)]
    pub pmid: Option<u64>,
    #[serde(default)]
    pub cohort: Option<String>,
}
