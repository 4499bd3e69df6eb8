use std::path::PathBuf;

use arn_questionnaire::questionnaire::{
    snapshot_from_path, CheckLimits, FieldName, FormKind, ValidationEngine,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn csv_export_reports_missing_2g_volume() {
    let parsed = snapshot_from_path(
        FormKind::OriginatedTraffic,
        fixture("originated_traffic.csv"),
    )
    .expect("fixture parses");
    assert_eq!(parsed.ignored, vec!["observacoes"]);

    let engine = ValidationEngine::for_form(FormKind::OriginatedTraffic, CheckLimits::default());
    let report = engine.validate_submission(&parsed.snapshot);

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.first_failing_field(), Some(FieldName::Data2gMegabytes));

    let totals = engine.aggregate(&parsed.snapshot);
    let sms = totals.total("total-sms").expect("sms total");
    assert_eq!(sms.formatted, "16.000");
    let average = totals.total("avg-call-duration").expect("average shown");
    assert_eq!(average.formatted, "3,0 min");
}

#[test]
fn json_export_passes_and_highlights_large_totals() {
    let parsed = snapshot_from_path(FormKind::MobileStations, fixture("mobile_stations.json"))
        .expect("fixture parses");
    assert!(parsed.ignored.is_empty());

    let engine = ValidationEngine::for_form(FormKind::MobileStations, CheckLimits::default());
    let report = engine.validate_submission(&parsed.snapshot);
    assert!(!report.blocks_submission(), "{}", report.summary());

    let totals = engine.aggregate(&parsed.snapshot);
    let stations = totals.total("total-estacoes").expect("stations total");
    assert_eq!(stations.value, 1_200_800);
    assert!(stations.highlighted);

    let money = totals.total("total-mobile-money").expect("mobile money total");
    assert_eq!(money.formatted, "120.000");
    assert!(money.highlighted);
}
