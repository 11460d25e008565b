use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Measurement;

/// Request to score a set of measurements
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoringRequest {
    #[validate(range(max = 120))]
    #[serde(alias = "user_age", alias = "subject_age")]
    pub age: u32,
    #[validate(nested)]
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

impl ScoringRequest {
    pub fn new(age: u32, measurements: Vec<Measurement>) -> Self {
        Self { age, measurements }
    }
}
