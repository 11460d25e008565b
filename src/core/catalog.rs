use crate::core::name_match::tokenize;
use crate::models::{
    BiomarkerDefinition, BiomarkerRecord, CatalogDocument, CorrelationGroup, RangeRecord, ScoringParams,
    StudyEvidence, StudyRecord, ValueRange,
};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading the biomarker reference dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML dataset: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset contains no biomarkers")]
    Empty,

    #[error("Biomarker #{index} ({biomarker}) is missing required field '{field}'")]
    MissingField {
        index: usize,
        biomarker: String,
        field: &'static str,
    },

    #[error("Biomarker '{biomarker}' has invalid {field}: {reason}")]
    InvalidField {
        biomarker: String,
        field: &'static str,
        reason: String,
    },

    #[error("Duplicate biomarker name: {0}")]
    DuplicateName(String),

    #[error("Biomarker '{0}' has no usable study")]
    NoUsableStudy(String),
}

/// Immutable biomarker reference table
///
/// Built once at startup and shared read-only (`Arc<Catalog>`) between
/// scoring calls.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Arc<BiomarkerDefinition>>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a parsed dataset document
    pub fn load(document: CatalogDocument, params: &ScoringParams) -> Result<Self, DatasetError> {
        if document.biomarkers.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut entries = Vec::with_capacity(document.biomarkers.len());
        let mut by_name = HashMap::with_capacity(document.biomarkers.len());

        for (index, record) in document.biomarkers.into_iter().enumerate() {
            let definition = build_definition(index, record, params)?;
            let key = definition.canonical_name.to_lowercase();
            if by_name.insert(key, index).is_some() {
                return Err(DatasetError::DuplicateName(definition.canonical_name));
            }
            entries.push(Arc::new(definition));
        }

        let version = document
            .metadata
            .and_then(|meta| meta.version)
            .unwrap_or_else(|| "unversioned".to_string());
        tracing::info!("Loaded {} biomarkers (dataset {})", entries.len(), version);

        Ok(Self { entries, by_name })
    }

    pub fn from_json_str(json: &str, params: &ScoringParams) -> Result<Self, DatasetError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::load(document, params)
    }

    pub fn from_toml_str(text: &str, params: &ScoringParams) -> Result<Self, DatasetError> {
        let document: CatalogDocument = toml::from_str(text)?;
        Self::load(document, params)
    }

    /// Load a `.json` or `.toml` dataset file
    pub fn load_from_path<P: AsRef<Path>>(path: P, params: &ScoringParams) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text, params),
            Some("toml") => Self::from_toml_str(&text, params),
            other => Err(DatasetError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact (case-insensitive) lookup by canonical name
    pub fn get(&self, name: &str) -> Option<&Arc<BiomarkerDefinition>> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .and_then(|&idx| self.entries.get(idx))
    }

    pub fn entries(&self) -> &[Arc<BiomarkerDefinition>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BiomarkerDefinition>> {
        self.entries.iter()
    }
}

/// A study that passed validation
#[derive(Debug, Clone)]
struct ValidStudy {
    label: String,
    hazard_ratio: f64,
    n_subjects: u64,
    n_deaths: u64,
    follow_up_years: f64,
    pmid: Option<u64>,
    cohort: Option<String>,
}

impl ValidStudy {
    /// |ln HR|, the size of the effect regardless of direction
    #[inline]
    fn effect_magnitude(&self) -> f64 {
        self.hazard_ratio.ln().abs()
    }

    /// Study labels naming several biomarkers describe confounded composites
    fn is_composite(&self) -> bool {
        let label = self.label.to_lowercase();
        label.contains(',')
            || label.contains('+')
            || label.split_whitespace().any(|word| word == "and")
    }
}

fn build_definition(
    index: usize,
    record: BiomarkerRecord,
    params: &ScoringParams,
) -> Result<BiomarkerDefinition, DatasetError> {
    let canonical_name = match record.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(DatasetError::MissingField {
                index,
                biomarker: "<unnamed>".to_string(),
                field: "name",
            })
        }
    };

    let missing = |field: &'static str| DatasetError::MissingField {
        index,
        biomarker: canonical_name.clone(),
        field,
    };

    let unit = record.unit.clone().ok_or_else(|| missing("unit"))?;
    let group_tag = record
        .correlation_group
        .as_deref()
        .ok_or_else(|| missing("correlation_group"))?;
    let correlation_group: CorrelationGroup =
        group_tag.parse().map_err(|reason| DatasetError::InvalidField {
            biomarker: canonical_name.clone(),
            field: "correlation_group",
            reason,
        })?;

    let optimal_record = record.optimal_range.ok_or_else(|| missing("optimal_range"))?;
    let optimal_range = parse_range(&canonical_name, "optimal_range", optimal_record)?;
    let plausible_range = record
        .plausible_range
        .map(|range| parse_range(&canonical_name, "plausible_range", range))
        .transpose()?;

    if record.studies.is_empty() {
        return Err(missing("studies"));
    }

    let studies = record
        .studies
        .iter()
        .map(|study| validate_study(&canonical_name, study))
        .collect::<Result<Vec<_>, _>>()?;

    let selected = select_representative_study(&studies, params)
        .ok_or_else(|| DatasetError::NoUsableStudy(canonical_name.clone()))?;

    let hazard_ratio = params.clamp_hazard_ratio(selected.hazard_ratio);
    if hazard_ratio != selected.hazard_ratio {
        tracing::warn!(
            "Clamped hazard ratio for {} from {} to {}",
            canonical_name,
            selected.hazard_ratio,
            hazard_ratio
        );
    }

    let match_tokens: Vec<BTreeSet<String>> = std::iter::once(canonical_name.as_str())
        .chain(record.synonyms.iter().map(String::as_str))
        .map(tokenize)
        .filter(|tokens| !tokens.is_empty())
        .collect();

    Ok(BiomarkerDefinition {
        canonical_name,
        match_tokens,
        unit,
        category: record.category.unwrap_or_default(),
        optimal_range,
        plausible_range,
        allows_negative: record.allows_negative,
        hazard_ratio,
        n_deaths: selected.n_deaths,
        n_subjects: selected.n_subjects,
        follow_up_years: selected.follow_up_years,
        correlation_group,
        evidence: StudyEvidence {
            label: selected.label.clone(),
            pmid: selected.pmid,
            cohort: selected.cohort.clone(),
            source_hazard_ratio: selected.hazard_ratio,
        },
        catalog_index: index,
    })
}

fn parse_range(biomarker: &str, field: &'static str, record: RangeRecord) -> Result<ValueRange, DatasetError> {
    let invalid = |reason: &str| DatasetError::InvalidField {
        biomarker: biomarker.to_string(),
        field,
        reason: reason.to_string(),
    };

    let range = match (record.low, record.high) {
        (Some(low), Some(high)) => ValueRange::new(low, high),
        (Some(low), None) => ValueRange::at_least(low),
        (None, Some(high)) => ValueRange::at_most(high),
        (None, None) => return Err(invalid("at least one bound is required")),
    };

    if range.low.is_nan() || range.high.is_nan() {
        return Err(invalid("bounds must be numbers"));
    }
    if range.low > range.high {
        return Err(invalid("low bound exceeds high bound"));
    }

    Ok(range)
}

fn validate_study(biomarker: &str, study: &StudyRecord) -> Result<ValidStudy, DatasetError> {
    let missing = |field: &'static str| DatasetError::InvalidField {
        biomarker: biomarker.to_string(),
        field,
        reason: "missing from study".to_string(),
    };
    let invalid = |field: &'static str, reason: String| DatasetError::InvalidField {
        biomarker: biomarker.to_string(),
        field,
        reason,
    };

    let hazard_ratio = study.hazard_ratio.ok_or_else(|| missing("hazard_ratio"))?;
    if !hazard_ratio.is_finite() || hazard_ratio <= 0.0 {
        return Err(invalid("hazard_ratio", format!("{} is not a positive number", hazard_ratio)));
    }

    let n_subjects = study.n_subjects.ok_or_else(|| missing("n_subjects"))?;
    if n_subjects <= 0 {
        return Err(invalid("n_subjects", format!("{} must be positive", n_subjects)));
    }

    let n_deaths = study.n_deaths.ok_or_else(|| missing("n_deaths"))?;
    if n_deaths < 0 || n_deaths > n_subjects {
        return Err(invalid(
            "n_deaths",
            format!("{} is outside 0..={}", n_deaths, n_subjects),
        ));
    }

    let follow_up_years = study.follow_up_years.ok_or_else(|| missing("follow_up_years"))?;
    if !follow_up_years.is_finite() || follow_up_years <= 0.0 {
        return Err(invalid(
            "follow_up_years",
            format!("{} is not a positive duration", follow_up_years),
        ));
    }

    Ok(ValidStudy {
        label: study.label.clone().unwrap_or_else(|| biomarker.to_string()),
        hazard_ratio,
        n_subjects: n_subjects as u64,
        n_deaths: n_deaths as u64,
        follow_up_years,
        pmid: study.pmid,
        cohort: study.cohort.clone(),
    })
}

/// Pick one study to represent the biomarker
///
/// 1. Composite studies are dropped unless nothing else exists.
/// 2. Studies with an in-band hazard ratio are kept; failing that, the single
///    least extreme study.
/// 3. The median of the pool ordered by effect magnitude wins.
fn select_representative_study<'a>(studies: &'a [ValidStudy], params: &ScoringParams) -> Option<&'a ValidStudy> {
    let single: Vec<&ValidStudy> = studies.iter().filter(|s| !s.is_composite()).collect();
    let candidates: Vec<&ValidStudy> = if single.is_empty() {
        studies.iter().collect()
    } else {
        if single.len() < studies.len() {
            tracing::warn!(
                "Ignoring {} composite studies for {}",
                studies.len() - single.len(),
                single[0].label
            );
        }
        single
    };

    let mut pool: Vec<&ValidStudy> = candidates
        .iter()
        .copied()
        .filter(|s| params.hazard_ratio_in_band(s.hazard_ratio))
        .collect();

    if pool.is_empty() {
        let least_extreme = candidates.iter().copied().fold(None, |best: Option<&ValidStudy>, study| {
            match best {
                Some(current) if current.effect_magnitude() <= study.effect_magnitude() => Some(current),
                _ => Some(study),
            }
        })?;
        tracing::warn!(
            "No in-band study for {}, falling back to least extreme (HR {})",
            least_extreme.label,
            least_extreme.hazard_ratio
        );
        pool.push(least_extreme);
    }

    pool.sort_by(|a, b| {
        a.effect_magnitude()
            .partial_cmp(&b.effect_magnitude())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    pool.get(pool.len() / 2).copied()
}
