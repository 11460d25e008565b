/// Expected remaining years under a constant annual mortality rate
///
/// Discrete-time geometric survival: the sum over `k = 1..=max_age - age` of
/// the probability `(1 - rate)^k` of surviving to year `k`.
///
/// # Arguments
/// * `annual_rate` - Probability of dying in any one year, in (0, 1)
/// * `current_age` - Age in whole years
/// * `max_age` - Projection horizon
///
/// # Returns
/// Expected years lived before `max_age`; 0 when `current_age >= max_age`
pub fn expected_remaining_years(annual_rate: f64, current_age: u32, max_age: u32) -> f64 {
    if current_age >= max_age {
        return 0.0;
    }

    let yearly_survival = (1.0 - annual_rate).clamp(0.0, 1.0);
    let horizon = max_age - current_age;

    let mut survival = 1.0;
    let mut expected = 0.0;
    for _ in 0..horizon {
        survival *= yearly_survival;
        expected += survival;
    }

    expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_mortality_lives_full_horizon() {
        assert_eq!(expected_remaining_years(0.0, 50, 85), 35.0);
    }

    #[test]
    fn test_past_horizon() {
        assert_eq!(expected_remaining_years(0.02, 85, 85), 0.0);
        assert_eq!(expected_remaining_years(0.02, 90, 85), 0.0);
    }

    #[test]
    fn test_matches_closed_form() {
        let rate: f64 = 0.02;
        let q = 1.0 - rate;
        let closed = q * (1.0 - q.powi(35)) / rate;

        let years = expected_remaining_years(rate, 50, 85);
        assert!((years - closed).abs() < 1e-9, "got {}, expected {}", years, closed);
    }

    #[test]
    fn test_higher_mortality_fewer_years() {
        let low = expected_remaining_years(0.01, 40, 85);
        let high = expected_remaining_years(0.05, 40, 85);
        assert!(low > high);
    }

    #[test]
    fn test_certain_death() {
        assert_eq!(expected_remaining_years(1.0, 30, 85), 0.0);
    }
}
