use crate::models::{BiomarkerDefinition, ScoringParams};

/// Comparable annual mortality for the optimal and the as-measured state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualMortality {
    pub optimal_rate: f64,
    pub worst_case_rate: f64,
}

/// Multiplier applied to the baseline hazard outside the optimal range
///
/// Equals the hazard ratio for harmful effects. A protective study
/// (HR < 1) reports the benefit of being in range rather than the harm of
/// being outside it, so taking `HR` literally would make an out-of-range
/// value look safer than an optimal one. Such ratios contribute the same
/// excess `|HR - 1|` instead: `0.5` scores like `1.5`, and the bonus stays
/// positive and grows with effect size on both sides of 1.
#[inline]
pub fn risk_multiplier(hazard_ratio: f64) -> f64 {
    1.0 + (hazard_ratio - 1.0).abs()
}

/// Annual mortality rates derived from the study behind a catalog entry
///
/// The study population's crude rate `deaths / subjects / years` stands in
/// for the optimal-range subgroup. This is an approximation: it understates
/// the benefit when the optimal subgroup is small.
pub fn annual_mortality(definition: &BiomarkerDefinition, params: &ScoringParams) -> AnnualMortality {
    let crude = definition.n_deaths as f64 / definition.n_subjects as f64 / definition.follow_up_years;
    let optimal_rate = bound_rate(crude, params.min_annual_rate, params.max_optimal_rate);

    let worst_case = optimal_rate * risk_multiplier(definition.hazard_ratio);
    let worst_case_rate = bound_rate(worst_case, params.min_annual_rate, params.max_measured_rate);

    AnnualMortality {
        optimal_rate,
        worst_case_rate,
    }
}

#[inline]
fn bound_rate(rate: f64, floor: f64, cap: f64) -> f64 {
    if rate.is_nan() {
        return floor;
    }
    rate.max(floor).min(cap.max(floor))
}
