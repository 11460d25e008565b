// Property tests for the scoring pipeline

use longevity_score::core::{Catalog, LongevityScorer};
use longevity_score::models::{
    BiomarkerRecord, CatalogDocument, Measurement, RangeRecord, ScoreResponse, ScoringParams, StudyRecord,
};
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};

fn single_marker_scorer(hazard_ratio: f64, n_deaths: i64, n_subjects: i64, follow_up_years: f64) -> LongevityScorer {
    let document = CatalogDocument {
        metadata: None,
        biomarkers: vec![BiomarkerRecord {
            name: Some("Test marker".to_string()),
            unit: Some("u".to_string()),
            correlation_group: Some("lipids".to_string()),
            optimal_range: Some(RangeRecord { low: Some(50.0), high: Some(100.0) }),
            studies: vec![StudyRecord {
                hazard_ratio: Some(hazard_ratio),
                n_subjects: Some(n_subjects),
                n_deaths: Some(n_deaths),
                follow_up_years: Some(follow_up_years),
                ..StudyRecord::default()
            }],
            ..BiomarkerRecord::default()
        }],
    };
    let catalog = Catalog::load(document, &ScoringParams::default()).unwrap();
    LongevityScorer::with_defaults(Arc::new(catalog))
}

fn single_bonus(scorer: &LongevityScorer, value: f64, age: u32) -> f64 {
    let report = scorer
        .score(&[Measurement::new("Test marker", value, "u", "lab")], age)
        .unwrap();
    report.per_biomarker_breakdown[0].bonus_years
}

fn reference_scorer() -> &'static LongevityScorer {
    static SCORER: OnceLock<LongevityScorer> = OnceLock::new();
    SCORER.get_or_init(|| {
        let path = format!("{}/data/biomarkers.json", env!("CARGO_MANIFEST_DIR"));
        let catalog = Catalog::load_from_path(path, &ScoringParams::default()).unwrap();
        LongevityScorer::with_defaults(Arc::new(catalog))
    })
}

fn lipid_and_body_panel(values: [f64; 7]) -> Vec<Measurement> {
    let names = [
        "LDL cholesterol",
        "Triglycerides",
        "HDL cholesterol",
        "C-reactive protein",
        "White blood cell count",
        "Waist circumference",
        "Body mass index",
    ];
    names
        .iter()
        .zip(values)
        .map(|(name, value)| Measurement::new(*name, value, "", "lab"))
        .collect()
}

fn panel_values() -> impl Strategy<Value = [f64; 7]> {
    (
        0.0..600.0,
        0.0..5000.0,
        0.0..250.0,
        0.0..500.0,
        0.0..200.0,
        30.0..250.0,
        8.0..100.0,
    )
        .prop_map(|(a, b, c, d, e, f, g)| [a, b, c, d, e, f, g])
}

proptest! {
    #[test]
    fn bonus_stays_within_cap(
        value in 0.0..1000.0f64,
        hazard_ratio in 0.05..10.0f64,
        n_subjects in 1_000i64..50_000,
        death_share in 0.0..1.0f64,
        follow_up_years in 0.5..30.0f64,
        age in 0u32..85,
    ) {
        let n_deaths = (n_subjects as f64 * death_share) as i64;
        let scorer = single_marker_scorer(hazard_ratio, n_deaths, n_subjects, follow_up_years);
        let report = scorer
            .score(&[Measurement::new("Test marker", value, "u", "lab")], age)
            .unwrap();
        let impact = &report.per_biomarker_breakdown[0];

        prop_assert!(impact.bonus_years >= 0.0);
        prop_assert!(impact.bonus_years <= 10.0);
        prop_assert!(impact.per_biomarker_score <= 100);
        prop_assert!(report.overall_score <= 100);
    }

    #[test]
    fn optimal_value_has_no_bonus(
        value in 50.0..=100.0f64,
        hazard_ratio in 0.3..3.0f64,
        age in 0u32..85,
    ) {
        let scorer = single_marker_scorer(hazard_ratio, 1500, 10_000, 10.0);
        let report = scorer
            .score(&[Measurement::new("Test marker", value, "u", "lab")], age)
            .unwrap();
        let impact = &report.per_biomarker_breakdown[0];

        prop_assert!(impact.is_optimal);
        prop_assert_eq!(impact.bonus_years, 0.0);
        prop_assert_eq!(impact.per_biomarker_score, 100);
        prop_assert!(report.top_opportunity.is_none());
    }

    #[test]
    fn bonus_grows_with_effect_size(
        effect in 0.0..2.0f64,
        extra in 0.0..2.0f64,
        age in 0u32..85,
    ) {
        let weaker = single_marker_scorer(1.0 + effect, 1500, 10_000, 10.0);
        let stronger = single_marker_scorer(1.0 + effect + extra, 1500, 10_000, 10.0);

        prop_assert!(single_bonus(&stronger, 150.0, age) >= single_bonus(&weaker, 150.0, age));
    }

    #[test]
    fn protective_and_harmful_effects_match(effect in 0.0..0.7f64, age in 0u32..85) {
        let harmful = single_marker_scorer(1.0 + effect, 1500, 10_000, 10.0);
        let protective = single_marker_scorer(1.0 - effect, 1500, 10_000, 10.0);

        let difference = single_bonus(&harmful, 150.0, age) - single_bonus(&protective, 150.0, age);
        prop_assert!(difference.abs() < 1e-6);
    }

    #[test]
    fn extreme_ratios_score_like_the_band_edge(
        high in 3.0..50.0f64,
        low in 0.001..0.3f64,
        age in 0u32..85,
    ) {
        let measurements = [Measurement::new("Test marker", 150.0, "u", "lab")];
        let score = |hazard_ratio: f64| {
            let scorer = single_marker_scorer(hazard_ratio, 1500, 10_000, 10.0);
            ScoreResponse::from(&scorer.score(&measurements, age).unwrap())
        };

        prop_assert_eq!(score(high), score(3.0));
        prop_assert_eq!(score(low), score(0.3));
    }

    #[test]
    fn total_never_exceeds_individual_sum(values in panel_values(), age in 0u32..85) {
        let report = reference_scorer().score(&lipid_and_body_panel(values), age).unwrap();

        let individual_sum: f64 = report.per_biomarker_breakdown.iter().map(|i| i.bonus_years).sum();
        prop_assert!(report.total_bonus_years <= individual_sum + 1e-9);
        prop_assert!(report.total_bonus_years <= 10.0 * report.group_bonuses.len() as f64);
    }

    #[test]
    fn scoring_is_deterministic(values in panel_values(), age in 0u32..85) {
        let measurements = lipid_and_body_panel(values);
        let first = reference_scorer().score(&measurements, age).unwrap();
        let second = reference_scorer().score(&measurements, age).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn unknown_labels_do_not_affect_scores(
        values in panel_values(),
        label in "[q-z]{3,8}",
        age in 0u32..85,
    ) {
        let known = lipid_and_body_panel(values);
        let mut with_unknown = known.clone();
        with_unknown.insert(0, Measurement::new(format!("{} marker", label), 1.0, "", "lab"));

        let baseline = reference_scorer().score(&known, age).unwrap();
        let extended = reference_scorer().score(&with_unknown, age).unwrap();

        prop_assert_eq!(&baseline.per_biomarker_breakdown, &extended.per_biomarker_breakdown);
        prop_assert_eq!(baseline.overall_score, extended.overall_score);
        prop_assert_eq!(baseline.total_bonus_years, extended.total_bonus_years);
        prop_assert_eq!(extended.omissions.len(), 1);
    }
}
