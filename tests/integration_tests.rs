// Integration tests for Longevity Score

use longevity_score::config::Settings;
use longevity_score::core::{Catalog, LongevityScorer, PhenoAgeMarker};
use longevity_score::models::{
    Grade, Measurement, OmissionKind, OverallScoreReport, ScoreResponse, ScoringParams, ScoringRequest,
};
use std::sync::Arc;

fn manifest_path(relative: &str) -> String {
    format!("{}/{}", env!("CARGO_MANIFEST_DIR"), relative)
}

fn create_scorer() -> LongevityScorer {
    let params = ScoringParams::default();
    let catalog = Catalog::load_from_path(manifest_path("data/biomarkers.json"), &params)
        .expect("reference catalog should load");
    LongevityScorer::with_defaults(Arc::new(catalog))
}

fn sample_request() -> ScoringRequest {
    let text = std::fs::read_to_string(manifest_path("demos/sample_request.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn impact_bonus(report: &OverallScoreReport, name: &str) -> f64 {
    report
        .per_biomarker_breakdown
        .iter()
        .find(|impact| impact.name() == name)
        .map(|impact| impact.bonus_years)
        .unwrap_or_else(|| panic!("{} missing from breakdown", name))
}

#[test]
fn test_integration_reference_scenario() {
    let scorer = create_scorer();
    let report = scorer.score_request(&sample_request()).unwrap();

    assert_eq!(report.overall_score, 69);
    assert_eq!(report.grade, Grade::Silver);
    assert!(
        (report.total_bonus_years - 24.4).abs() < 0.05,
        "total bonus was {}",
        report.total_bonus_years
    );

    let top = report.top_opportunity.as_ref().expect("scenario has a top opportunity");
    assert_eq!(top.name(), "Peak expiratory flow");
    assert!((top.bonus_years - 7.2).abs() < 0.05, "top bonus was {}", top.bonus_years);

    assert!((impact_bonus(&report, "LDL cholesterol") - 3.9).abs() < 0.05);
    assert!((impact_bonus(&report, "C-reactive protein") - 2.7).abs() < 0.05);

    assert_eq!(report.optimized_count, 13);
    assert_eq!(report.opportunities_count, 7);
    assert_eq!(report.subject_age, 50);
}

#[test]
fn test_integration_unknown_marker_reported_as_omission() {
    let scorer = create_scorer();
    let report = scorer.score_request(&sample_request()).unwrap();

    assert_eq!(report.per_biomarker_breakdown.len(), 20);
    assert_eq!(report.omissions.len(), 1);
    assert_eq!(report.omissions[0].raw_name, "Mystery marker");
    assert_eq!(report.omissions[0].kind, OmissionKind::NotFound);
}

#[test]
fn test_integration_unknown_marker_changes_nothing() {
    let scorer = create_scorer();
    let request = sample_request();
    let known: Vec<Measurement> = request
        .measurements
        .iter()
        .filter(|m| m.raw_name != "Mystery marker")
        .cloned()
        .collect();

    let with_unknown = scorer.score(&request.measurements, request.age).unwrap();
    let without_unknown = scorer.score(&known, request.age).unwrap();

    assert_eq!(with_unknown.per_biomarker_breakdown, without_unknown.per_biomarker_breakdown);
    assert_eq!(with_unknown.overall_score, without_unknown.overall_score);
    assert_eq!(with_unknown.total_bonus_years, without_unknown.total_bonus_years);
}

#[test]
fn test_integration_ambiguous_label_reported_as_omission() {
    let scorer = create_scorer();
    let measurements = vec![
        Measurement::new("LDL/HDL", 3.5, "", "blood_test"),
        Measurement::new("C-reactive protein", 3.5, "mg/L", "blood_test"),
    ];

    let report = scorer.score(&measurements, 50).unwrap();

    assert_eq!(report.per_biomarker_breakdown.len(), 1);
    assert_eq!(report.omissions.len(), 1);
    assert_eq!(report.omissions[0].raw_name, "LDL/HDL");
    assert_eq!(report.omissions[0].kind, OmissionKind::AmbiguousMatch);
    assert!(report.omissions[0].reason.contains("LDL cholesterol"));
    assert!(report.omissions[0].reason.contains("HDL cholesterol"));
}

#[test]
fn test_integration_diastolic_reading_not_scored_as_systolic() {
    let scorer = create_scorer();
    let measurements = vec![
        Measurement::new("Diastolic blood pressure", 80.0, "mmHg", "wearable"),
        Measurement::new("Glucose tolerance test", 160.0, "mg/dL", "blood_test"),
        Measurement::new("Non-HDL cholesterol", 150.0, "mg/dL", "blood_test"),
    ];

    let report = scorer.score(&measurements, 50).unwrap();

    assert!(report.per_biomarker_breakdown.is_empty());
    assert_eq!(report.total_bonus_years, 0.0);
    assert_eq!(report.omissions.len(), 3);
    assert!(report.omissions.iter().all(|o| o.kind == OmissionKind::NotFound));
}

#[test]
fn test_integration_correlation_dedup_active() {
    let scorer = create_scorer();
    let report = scorer.score_request(&sample_request()).unwrap();

    let individual_sum: f64 = report.per_biomarker_breakdown.iter().map(|i| i.bonus_years).sum();
    assert!(report.total_bonus_years < individual_sum);

    let lipids = report
        .group_bonuses
        .iter()
        .find(|g| g.group.as_str() == "lipids")
        .unwrap();
    assert_eq!(lipids.biomarker, "LDL cholesterol");
    assert_eq!(lipids.members, 3);
}

#[test]
fn test_integration_priorities_ranked() {
    let scorer = create_scorer();
    let report = scorer.score_request(&sample_request()).unwrap();

    let ranked: Vec<f64> = report.priority_impacts().map(|i| i.bonus_years).collect();
    assert_eq!(ranked.len(), 7);
    assert!(ranked.windows(2).all(|pair| pair[0] >= pair[1]));

    let names: Vec<&str> = report.priority_impacts().map(|i| i.name()).collect();
    assert_eq!(names[0], "Peak expiratory flow");
    assert_eq!(names[1], "Waist circumference");
}

#[test]
fn test_integration_idempotent() {
    let scorer = create_scorer();
    let request = sample_request();

    let first = scorer.score_request(&request).unwrap();
    let second = scorer.score_request(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_bonus_years.to_bits(), second.total_bonus_years.to_bits());
}

#[test]
fn test_integration_response_document() {
    let scorer = create_scorer();
    let report = scorer.score_request(&sample_request()).unwrap();
    let response = ScoreResponse::from(&report);

    assert_eq!(response.total_bonus_years, 24.4);
    let top = response.top_opportunity.as_ref().unwrap();
    assert_eq!(top.biomarker, "Peak expiratory flow");
    assert_eq!(top.bonus_years, 7.2);
    assert_eq!(top.target, "450-700 L/min");

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["overall_score"], 69);
    assert_eq!(json["grade"], "Silver");
    assert_eq!(json["breakdown"].as_array().unwrap().len(), 20);
    assert_eq!(json["breakdown"][0]["name"], "LDL cholesterol");
    assert_eq!(json["breakdown"][0]["target_range"], "50-100 mg/dL");
    assert_eq!(json["omissions"][0]["kind"], "not_found");
}

#[test]
fn test_integration_biological_age() {
    let scorer = create_scorer();
    let request = sample_request();

    let report = scorer
        .biological_age(&request.measurements, request.age)
        .unwrap()
        .expect("scenario measures phenotypic age markers");

    assert!((report.biological_age_now - 41.42092148007096).abs() < 1e-6);
    assert!((report.biological_age_target - 36.990440926583176).abs() < 1e-6);

    // Glucose and MCV already sit at target
    let order: Vec<PhenoAgeMarker> = report.contributions.iter().map(|c| c.marker).collect();
    assert_eq!(
        order,
        vec![
            PhenoAgeMarker::CReactiveProtein,
            PhenoAgeMarker::Creatinine,
            PhenoAgeMarker::LymphocytePercent,
            PhenoAgeMarker::WhiteBloodCells,
        ]
    );

    let response = ScoreResponse::from(&scorer.score_request(&request).unwrap())
        .with_biological_age(Some(&report));
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["biological_age"]["biological_age_now"], 41.42);
    assert_eq!(json["biological_age"]["years_biological_gained"], 4.43);
    assert_eq!(json["biological_age"]["contributions"][0]["biomarker"], "C-reactive protein");
    assert_eq!(json["biological_age"]["contributions"][0]["years_gained_if_optimized"], 2.56);
}

#[test]
fn test_integration_empty_measurements() {
    let scorer = create_scorer();
    let report = scorer.score(&[], 40).unwrap();

    assert_eq!(report.overall_score, 0);
    assert_eq!(report.total_bonus_years, 0.0);
    assert!(report.top_opportunity.is_none());
}

#[test]
fn test_integration_rejects_bad_age() {
    let scorer = create_scorer();
    let mut request = sample_request();
    request.age = 130;

    assert!(scorer.score_request(&request).is_err());
}

#[test]
fn test_integration_rejects_unknown_fields() {
    let text = r#"{"age": 50, "measurements": [{"raw_name": "LDL", "value": 120, "colour": "red"}]}"#;
    assert!(serde_json::from_str::<ScoringRequest>(text).is_err());
}

#[test]
fn test_integration_default_config_matches_defaults() {
    let settings = Settings::load_from(manifest_path("config/default.toml")).unwrap();

    assert_eq!(settings.params(), ScoringParams::default());
    assert_eq!(settings.thresholds().grade_for(69), Grade::Silver);
    assert_eq!(settings.catalog.path, "data/biomarkers.json");
}
