use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{GradeThresholds, ScoringParams};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub grades: GradeSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { path: default_catalog_path() }
    }
}

fn default_catalog_path() -> String { "data/biomarkers.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_max_age")]
    pub max_age: u32,
    #[serde(default = "default_max_bonus_years")]
    pub max_bonus_years: f64,
    #[serde(default = "default_min_annual_rate")]
    pub min_annual_rate: f64,
    #[serde(default = "default_max_optimal_rate")]
    pub max_optimal_rate: f64,
    #[serde(default = "default_max_measured_rate")]
    pub max_measured_rate: f64,
    #[serde(default = "default_hazard_ratio_min")]
    pub hazard_ratio_min: f64,
    #[serde(default = "default_hazard_ratio_max")]
    pub hazard_ratio_max: f64,
    #[serde(default = "default_optimized_weight")]
    pub optimized_weight: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
            max_bonus_years: default_max_bonus_years(),
            min_annual_rate: default_min_annual_rate(),
            max_optimal_rate: default_max_optimal_rate(),
            max_measured_rate: default_max_measured_rate(),
            hazard_ratio_min: default_hazard_ratio_min(),
            hazard_ratio_max: default_hazard_ratio_max(),
            optimized_weight: default_optimized_weight(),
        }
    }
}

fn default_max_age() -> u32 { 85 }
fn default_max_bonus_years() -> f64 { 10.0 }
fn default_min_annual_rate() -> f64 { 1e-6 }
fn default_max_optimal_rate() -> f64 { 0.10 }
fn default_max_measured_rate() -> f64 { 0.20 }
fn default_hazard_ratio_min() -> f64 { 0.3 }
fn default_hazard_ratio_max() -> f64 { 3.0 }
fn default_optimized_weight() -> f64 { 0.5 }

impl ScoringSettings {
    pub fn params(&self) -> ScoringParams {
        ScoringParams {
            max_age: self.max_age,
            max_bonus_years: self.max_bonus_years,
            min_annual_rate: self.min_annual_rate,
            max_optimal_rate: self.max_optimal_rate,
            max_measured_rate: self.max_measured_rate,
            hazard_ratio_min: self.hazard_ratio_min,
            hazard_ratio_max: self.hazard_ratio_max,
            optimized_weight: self.optimized_weight,
        }
    }
}

/// Minimum overall score per grade
#[derive(Debug, Clone, Deserialize)]
pub struct GradeSettings {
    #[serde(default = "default_legendary")]
    pub legendary: u8,
    #[serde(default = "default_diamond")]
    pub diamond: u8,
    #[serde(default = "default_gold")]
    pub gold: u8,
    #[serde(default = "default_silver")]
    pub silver: u8,
    #[serde(default = "default_bronze")]
    pub bronze: u8,
}

impl Default for GradeSettings {
    fn default() -> Self {
        Self {
            legendary: default_legendary(),
            diamond: default_diamond(),
            gold: default_gold(),
            silver: default_silver(),
            bronze: default_bronze(),
        }
    }
}

fn default_legendary() -> u8 { 90 }
fn default_diamond() -> u8 { 80 }
fn default_gold() -> u8 { 70 }
fn default_silver() -> u8 { 60 }
fn default_bronze() -> u8 { 50 }

impl GradeSettings {
    pub fn thresholds(&self) -> GradeThresholds {
        GradeThresholds {
            legendary: self.legendary,
            diamond: self.diamond,
            gold: self.gold,
            silver: self.silver,
            bronze: self.bronze,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl LoggingSettings {
    /// `LOG_LEVEL` / `LOG_FORMAT` win over the configured values when set
    pub fn with_overrides(&self, level: Option<String>, format: Option<String>) -> LoggingSettings {
        LoggingSettings {
            level: level.filter(|l| !l.is_empty()).unwrap_or_else(|| self.level.clone()),
            format: format.filter(|f| !f.is_empty()).unwrap_or_else(|| self.format.clone()),
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LONGEVITY__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LONGEVITY__SCORING__MAX_AGE -> scoring.max_age
            .add_source(
                Environment::with_prefix("LONGEVITY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_catalog_override(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LONGEVITY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn params(&self) -> ScoringParams {
        self.scoring.params()
    }

    pub fn thresholds(&self) -> GradeThresholds {
        self.grades.thresholds()
    }
}

/// `BIOMARKER_CATALOG` points at a dataset outside the config files
fn apply_catalog_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("BIOMARKER_CATALOG") {
        Ok(path) if !path.is_empty() => Config::builder()
            .add_source(settings)
            .set_override("catalog.path", path)?
            .build(),
        _ => Ok(settings),
    }
}
