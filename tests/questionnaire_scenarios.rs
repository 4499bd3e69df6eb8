use arn_questionnaire::questionnaire::{
    CheckLimits, CheckStatus, FieldName, FieldSnapshot, FormKind, ValidationEngine,
};

fn mobile_stations() -> ValidationEngine {
    ValidationEngine::for_form(FormKind::MobileStations, CheckLimits::default())
}

fn originated_traffic() -> ValidationEngine {
    ValidationEngine::for_form(FormKind::OriginatedTraffic, CheckLimits::default())
}

fn reporting_period() -> FieldSnapshot {
    FieldSnapshot::new()
        .with(FieldName::Year, "2025")
        .with(FieldName::Month, "9")
        .with(FieldName::Operator, "Africell")
}

fn status_of(engine: &ValidationEngine, snapshot: &FieldSnapshot, rule: &str) -> CheckStatus {
    engine
        .validate(snapshot)
        .results
        .iter()
        .find(|result| result.rule == rule)
        .map(|result| result.status)
        .expect("rule evaluated")
}

#[test]
fn gender_split_above_total_fails_on_male_field() {
    let engine = mobile_stations();
    let snapshot = reporting_period()
        .with(FieldName::MobileMoneyUsers, "100")
        .with(FieldName::MobileMoneyUsersFemale, "60")
        .with(FieldName::MobileMoneyUsersMale, "50");

    let report = engine.validate_submission(&snapshot);

    assert!(report.blocks_submission());
    assert_eq!(report.failure_count(), 1);
    assert_eq!(
        report.first_failing_field(),
        Some(FieldName::MobileMoneyUsersMale)
    );
    assert_eq!(
        report.error_for(FieldName::MobileMoneyUsersMale),
        Some("Users by gender (110) exceed total Mobile Money users (100)")
    );
}

#[test]
fn device_subcategories_are_bounded_by_access_users() {
    let engine = mobile_stations();
    let within = FieldSnapshot::new()
        .with(FieldName::Internet3gUsers, "100")
        .with(FieldName::Box3gUsers, "40")
        .with(FieldName::Usb3gUsers, "50");
    assert_eq!(
        status_of(&engine, &within, "broadband_3g_devices"),
        CheckStatus::Passed
    );

    let over = within.with(FieldName::Box3gUsers, "60");
    assert_eq!(
        status_of(&engine, &over, "broadband_3g_devices"),
        CheckStatus::Failed
    );
}

#[test]
fn active_postpaid_stations_cannot_exceed_plans() {
    let engine = mobile_stations();
    let snapshot = FieldSnapshot::new()
        .with(FieldName::PostpaidPlanStations, "1000")
        .with(FieldName::PostpaidActiveStations, "1200");

    let report = engine.validate(&snapshot);

    assert!(report.blocks_submission());
    assert_eq!(
        report.first_failing_field(),
        Some(FieldName::PostpaidActiveStations)
    );
}

#[test]
fn calls_without_minutes_warns_without_blocking() {
    let engine = originated_traffic();
    let snapshot = reporting_period().with(FieldName::CallsOnNet, "50");

    let completed = engine.complete(&snapshot);
    let report = engine.validate_submission(&completed);

    assert!(!report.blocks_submission());
    let warnings: Vec<_> = report.warnings().map(|result| result.rule.as_str()).collect();
    assert_eq!(warnings, vec!["calls_without_minutes"]);
    assert_eq!(report.summary(), "all checks passed with 1 warning(s)");
}

#[test]
fn empty_access_category_skips_device_bound() {
    let engine = mobile_stations();
    let snapshot = FieldSnapshot::new()
        .with(FieldName::Internet3gUsers, "0")
        .with(FieldName::Box3gUsers, "5")
        .with(FieldName::Usb3gUsers, "3");

    assert_eq!(
        status_of(&engine, &snapshot, "broadband_3g_devices"),
        CheckStatus::Skipped
    );
    assert!(!engine.validate(&snapshot).blocks_submission());
}

#[test]
fn fractional_gender_split_tolerates_one_cent() {
    let engine = mobile_stations();
    let snapshot = FieldSnapshot::new()
        .with(FieldName::TopUpsTotal, "1.000,00")
        .with(FieldName::TopUpsFemale, "400,00")
        .with(FieldName::TopUpsMale, "599,99");
    assert_eq!(
        status_of(&engine, &snapshot, "mobile_money_top_ups_by_gender"),
        CheckStatus::Passed
    );

    let off = snapshot.with(FieldName::TopUpsMale, "590");
    assert_eq!(
        status_of(&engine, &off, "mobile_money_top_ups_by_gender"),
        CheckStatus::Failed
    );
}

#[test]
fn validation_is_idempotent() {
    let engine = originated_traffic();
    let snapshot = reporting_period()
        .with(FieldName::SmsOnNet, "1.200")
        .with(FieldName::SmsTotal, "900")
        .with(FieldName::Data2gSessions, "40");

    let first = engine.validate_submission(&snapshot);
    let second = engine.validate_submission(&snapshot);

    assert_eq!(first, second);
    assert_eq!(
        status_of(&engine, &snapshot, "sms_total_matches_parts"),
        CheckStatus::Warning
    );
    assert_eq!(first.first_failing_field(), Some(FieldName::Data2gMegabytes));
}

#[test]
fn missing_period_blocks_submission() {
    let engine = originated_traffic();
    let report = engine.validate_submission(&FieldSnapshot::new());

    assert!(report.blocks_submission());
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.first_failing_field(), Some(FieldName::Year));
    assert_eq!(report.error_for(FieldName::Operator), None);
    assert_eq!(report.summary(), "There are 2 error(s) in the form");
}

#[test]
fn traffic_totals_are_written_back_and_formatted() {
    let engine = originated_traffic();
    let snapshot = FieldSnapshot::new()
        .with(FieldName::VoiceOnNetMinutes, "2.000")
        .with(FieldName::VoicePalopMinutes, "1.000")
        .with(FieldName::CallsOnNet, "900")
        .with(FieldName::CallsPalop, "100");

    let outcome = engine.aggregate(&snapshot);

    assert_eq!(
        outcome.snapshot.numeric(FieldName::VoiceInternationalTotalMinutes),
        1_000
    );
    assert_eq!(outcome.snapshot.numeric(FieldName::VoiceTotalMinutes), 3_000);
    assert_eq!(outcome.snapshot.numeric(FieldName::CallsTotal), 1_000);

    let minutes = outcome.total("total-minutos").expect("minutes total");
    assert_eq!(minutes.formatted, "3.000");
    assert!(outcome.total("avg-call-duration").is_some());
}
