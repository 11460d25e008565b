//! Phenotypic age (Levine 2018) from nine routine blood markers
//!
//! Markers that were not measured are assumed to sit at their optimal
//! target, so a partial panel never fails. Chronological age is required.

use crate::core::{bonus::validate_measurement, catalog::Catalog, name_match::resolve};
use crate::models::Measurement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const INTERCEPT: f64 = -19.9067;
const AGE_COEFFICIENT: f64 = 0.0804;

// Gompertz mortality score parameters
const GAMMA: f64 = -1.51714;
const LAMBDA: f64 = 0.0076927;
const ALPHA: f64 = 141.50225;
const BETA: f64 = -0.00553;
const AGE_SCALE: f64 = 0.09165;

const MORTALITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhenoAgeError {
    #[error("Age {0} is not a valid chronological age")]
    InvalidAge(f64),

    #[error("{marker} value {value} cannot enter the phenotypic age model")]
    InvalidValue { marker: &'static str, value: f64 },
}

/// Inputs of the phenotypic age model, in its coefficient order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhenoAgeMarker {
    Albumin,
    Creatinine,
    Glucose,
    CReactiveProtein,
    LymphocytePercent,
    MeanCellVolume,
    RedCellDistributionWidth,
    AlkalinePhosphatase,
    WhiteBloodCells,
}

impl PhenoAgeMarker {
    pub const ALL: [PhenoAgeMarker; 9] = [
        PhenoAgeMarker::Albumin,
        PhenoAgeMarker::Creatinine,
        PhenoAgeMarker::Glucose,
        PhenoAgeMarker::CReactiveProtein,
        PhenoAgeMarker::LymphocytePercent,
        PhenoAgeMarker::MeanCellVolume,
        PhenoAgeMarker::RedCellDistributionWidth,
        PhenoAgeMarker::AlkalinePhosphatase,
        PhenoAgeMarker::WhiteBloodCells,
    ];

    /// Canonical catalog entry carrying this marker
    pub fn catalog_name(self) -> &'static str {
        match self {
            PhenoAgeMarker::Albumin => "Albumin",
            PhenoAgeMarker::Creatinine => "Creatinine",
            PhenoAgeMarker::Glucose => "Fasting glucose",
            PhenoAgeMarker::CReactiveProtein => "C-reactive protein",
            PhenoAgeMarker::LymphocytePercent => "Lymphocyte percentage",
            PhenoAgeMarker::MeanCellVolume => "Mean corpuscular volume",
            PhenoAgeMarker::RedCellDistributionWidth => "Red cell distribution width",
            PhenoAgeMarker::AlkalinePhosphatase => "Alkaline phosphatase",
            PhenoAgeMarker::WhiteBloodCells => "White blood cell count",
        }
    }

    pub fn from_catalog_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|marker| marker.catalog_name().eq_ignore_ascii_case(name))
    }

    /// Value assumed when the marker is missing, and the optimization target
    pub fn optimal_target(self) -> f64 {
        match self {
            PhenoAgeMarker::Albumin => 4.7,
            PhenoAgeMarker::Creatinine => 0.8,
            PhenoAgeMarker::Glucose => 85.0,
            PhenoAgeMarker::CReactiveProtein => 0.3,
            PhenoAgeMarker::LymphocytePercent => 35.0,
            PhenoAgeMarker::MeanCellVolume => 90.0,
            PhenoAgeMarker::RedCellDistributionWidth => 12.5,
            PhenoAgeMarker::AlkalinePhosphatase => 60.0,
            PhenoAgeMarker::WhiteBloodCells => 5.5,
        }
    }

    pub fn coefficient(self) -> f64 {
        match self {
            PhenoAgeMarker::Albumin => -0.0336,
            PhenoAgeMarker::Creatinine => 0.0095,
            PhenoAgeMarker::Glucose => 0.1953,
            PhenoAgeMarker::CReactiveProtein => 0.0954,
            PhenoAgeMarker::LymphocytePercent => -0.0120,
            PhenoAgeMarker::MeanCellVolume => 0.0268,
            PhenoAgeMarker::RedCellDistributionWidth => 0.3306,
            PhenoAgeMarker::AlkalinePhosphatase => 0.00188,
            PhenoAgeMarker::WhiteBloodCells => 0.0554,
        }
    }

    /// Convert from catalog units (g/dL, mg/dL, mg/L) to the units the
    /// coefficients were fitted in (g/L, umol/L, mmol/L, ln mg/dL)
    fn model_input(self, value: f64) -> f64 {
        match self {
            PhenoAgeMarker::Albumin => value * 10.0,
            PhenoAgeMarker::Creatinine => value * 88.401,
            PhenoAgeMarker::Glucose => value * 0.0555,
            PhenoAgeMarker::CReactiveProtein => (value * 0.1).ln(),
            _ => value,
        }
    }

    fn check(self, value: f64) -> Result<(), PhenoAgeError> {
        let usable = value.is_finite()
            && value >= 0.0
            && (self != PhenoAgeMarker::CReactiveProtein || value > 0.0);
        if usable {
            Ok(())
        } else {
            Err(PhenoAgeError::InvalidValue {
                marker: self.catalog_name(),
                value,
            })
        }
    }
}

/// Chronological age plus whichever markers were measured
#[derive(Debug, Clone, PartialEq)]
pub struct PhenoAgePanel {
    pub age: f64,
    values: BTreeMap<PhenoAgeMarker, f64>,
}

impl PhenoAgePanel {
    pub fn new(age: f64) -> Self {
        Self {
            age,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, marker: PhenoAgeMarker, value: f64) -> Self {
        self.set(marker, value);
        self
    }

    pub fn set(&mut self, marker: PhenoAgeMarker, value: f64) {
        self.values.insert(marker, value);
    }

    /// Measured value, if any
    pub fn get(&self, marker: PhenoAgeMarker) -> Option<f64> {
        self.values.get(&marker).copied()
    }

    /// Measured value, or the optimal target when missing
    pub fn value_or_target(&self, marker: PhenoAgeMarker) -> f64 {
        self.get(marker).unwrap_or_else(|| marker.optimal_target())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn measured(&self) -> impl Iterator<Item = (PhenoAgeMarker, f64)> + '_ {
        self.values.iter().map(|(marker, value)| (*marker, *value))
    }

    /// Build a panel from free-text measurements
    ///
    /// Labels go through the same catalog resolution as scoring. Unmatched,
    /// ambiguous or implausible measurements are left out; the first usable
    /// value for a marker wins.
    pub fn from_measurements(catalog: &Catalog, measurements: &[Measurement], age: f64) -> Self {
        let mut panel = Self::new(age);

        for measurement in measurements {
            let Ok(definition) = resolve(catalog, &measurement.raw_name) else {
                continue;
            };
            let Some(marker) = PhenoAgeMarker::from_catalog_name(&definition.canonical_name) else {
                continue;
            };
            if panel.values.contains_key(&marker) {
                continue;
            }
            if let Err(err) = validate_measurement(measurement, &definition) {
                tracing::debug!("Leaving '{}' out of the phenotypic age: {}", measurement.raw_name, err);
                continue;
            }
            panel.set(marker, measurement.value);
        }

        panel
    }

    fn at_targets(&self) -> Self {
        Self::new(self.age)
    }
}

/// Years one marker would take off the phenotypic age on its own
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerContribution {
    pub marker: PhenoAgeMarker,
    pub years_gained: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhenoAgeReport {
    pub chronological_age: f64,
    pub biological_age_now: f64,
    pub biological_age_target: f64,
    pub years_gained: f64,
    /// Measured markers away from target with a positive gain, largest first
    pub contributions: Vec<MarkerContribution>,
}

/// Phenotypic age in years
pub fn phenotypic_age(panel: &PhenoAgePanel) -> Result<f64, PhenoAgeError> {
    if !panel.age.is_finite() || panel.age < 0.0 {
        return Err(PhenoAgeError::InvalidAge(panel.age));
    }

    let mut linear_predictor = INTERCEPT;
    for marker in PhenoAgeMarker::ALL {
        let value = panel.value_or_target(marker);
        marker.check(value)?;
        linear_predictor += marker.coefficient() * marker.model_input(value);
    }
    linear_predictor += AGE_COEFFICIENT * panel.age;

    let mortality_score = 1.0 - (GAMMA * linear_predictor.exp() / LAMBDA).exp();
    let mortality_score = mortality_score.clamp(MORTALITY_EPSILON, 1.0 - MORTALITY_EPSILON);

    Ok(ALPHA + (BETA * (1.0 - mortality_score).ln()).ln() / AGE_SCALE)
}

/// Phenotypic age now, with every marker at target, and per-marker gains
pub fn years_gained(panel: &PhenoAgePanel) -> Result<PhenoAgeReport, PhenoAgeError> {
    let now = phenotypic_age(panel)?;
    let target = phenotypic_age(&panel.at_targets())?;

    let mut contributions = Vec::new();
    for (marker, value) in panel.measured() {
        if value == marker.optimal_target() {
            continue;
        }
        let single = panel.clone().with(marker, marker.optimal_target());
        let gained = (now - phenotypic_age(&single)?).max(0.0);
        if gained > 0.0 {
            contributions.push(MarkerContribution {
                marker,
                years_gained: gained,
            });
        }
    }
    // Stable, so equal gains keep coefficient order
    contributions.sort_by(|a, b| b.years_gained.total_cmp(&a.years_gained));

    Ok(PhenoAgeReport {
        chronological_age: panel.age,
        biological_age_now: now,
        biological_age_target: target,
        years_gained: (now - target).max(0.0),
        contributions,
    })
}
