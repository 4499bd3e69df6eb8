use super::aggregation::{AggregationRule, Combination, DerivedOutput, TotalFormat};
use super::checks::{CheckKind, CrossFieldCheck};
use super::fields::{FieldKind, FieldName, FieldName::*, FormKind};
use serde::Serialize;

const STATIONS_HIGHLIGHT: u64 = 1_000_000;
const MOBILE_MONEY_HIGHLIGHT: u64 = 100_000;

/// Rejected catalogue definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    #[error("rule '{rule}' references '{field}', which is not part of the {form} form")]
    ForeignField {
        rule: String,
        field: FieldName,
        form: FormKind,
    },
    #[error("rule '{rule}' combines '{field}' with fields of a different numeric kind")]
    MixedKinds { rule: String, field: FieldName },
    #[error("rule '{rule}' uses text field '{field}' as a number")]
    TextOperand { rule: String, field: FieldName },
}

/// Aggregation and validation rules for one questionnaire form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCatalogue {
    form: FormKind,
    required: Vec<FieldName>,
    aggregations: Vec<AggregationRule>,
    checks: Vec<CrossFieldCheck>,
}

impl RuleCatalogue {
    pub fn new(
        form: FormKind,
        required: Vec<FieldName>,
        aggregations: Vec<AggregationRule>,
        checks: Vec<CrossFieldCheck>,
    ) -> Result<Self, CatalogueError> {
        for field in &required {
            ensure_owned(form, field.as_str(), *field)?;
        }

        for rule in &aggregations {
            let name = rule.output.name().to_string();
            let mut operands = rule.combination.inputs();
            if let DerivedOutput::Field(field) = rule.output {
                operands.push(field);
            }
            ensure_numeric_operands(form, &name, &operands, !is_ratio(&rule.combination))?;
        }

        for check in &checks {
            ensure_numeric_operands(form, &check.rule, &check.kind.operands(), true)?;
        }

        Ok(Self {
            form,
            required,
            aggregations,
            checks,
        })
    }

    pub fn for_form(form: FormKind) -> Self {
        match form {
            FormKind::MobileStations => Self::mobile_stations(),
            FormKind::OriginatedTraffic => Self::originated_traffic(),
        }
    }

    pub fn form(&self) -> FormKind {
        self.form
    }

    pub fn required(&self) -> &[FieldName] {
        &self.required
    }

    pub fn aggregations(&self) -> &[AggregationRule] {
        &self.aggregations
    }

    pub fn checks(&self) -> &[CrossFieldCheck] {
        &self.checks
    }

    /// Catalogue for the mobile-stations questionnaire.
    pub fn mobile_stations() -> Self {
        let aggregations = vec![
            AggregationRule::display(
                "total-estacoes",
                Combination::Sum(vec![
                    PostpaidPlanStations,
                    PrepaidPlanStations,
                    SpecificSituationStations,
                    ResidualStations,
                ]),
                TotalFormat::Count,
            )
            .highlight_above(STATIONS_HIGHLIGHT),
            AggregationRule::display(
                "total-banda-larga",
                Combination::MaxOfSums(
                    vec![Service3gUpgradeUsers, Service4gUsers],
                    vec![Internet3gUsers, Internet4gUsers],
                ),
                TotalFormat::Count,
            ),
            AggregationRule::display(
                "total-mobile-money",
                Combination::Sum(vec![MobileMoneyUsers]),
                TotalFormat::Count,
            )
            .highlight_above(MOBILE_MONEY_HIGHLIGHT),
            AggregationRule::display(
                "total-linhas",
                Combination::Sum(vec![
                    LeasedLines64k,
                    LeasedLines128k,
                    LeasedLines256k,
                    LeasedLines512k,
                    LeasedLines1m,
                    LeasedLinesAbove2m,
                ]),
                TotalFormat::Count,
            ),
        ];

        let checks = vec![
            CrossFieldCheck::new(
                "mobile_money_users_by_gender",
                CheckKind::GenderSum {
                    total: MobileMoneyUsers,
                    female: MobileMoneyUsersFemale,
                    male: MobileMoneyUsersMale,
                },
                "Users by gender ({sum}) exceed total Mobile Money users ({limit})",
            ),
            CrossFieldCheck::new(
                "mobile_money_top_ups_by_gender",
                CheckKind::FractionalGenderSum {
                    total: TopUpsTotal,
                    female: TopUpsFemale,
                    male: TopUpsMale,
                },
                "Top-ups by gender ({sum}) do not match total top-ups ({limit})",
            ),
            CrossFieldCheck::new(
                "mobile_money_withdrawals_by_gender",
                CheckKind::FractionalGenderSum {
                    total: WithdrawalsTotal,
                    female: WithdrawalsFemale,
                    male: WithdrawalsMale,
                },
                "Withdrawals by gender ({sum}) do not match total withdrawals ({limit})",
            ),
            CrossFieldCheck::new(
                "mobile_money_transfers_by_gender",
                CheckKind::FractionalGenderSum {
                    total: TransfersTotal,
                    female: TransfersFemale,
                    male: TransfersMale,
                },
                "Transfers by gender ({sum}) do not match total transfers ({limit})",
            ),
            CrossFieldCheck::new(
                "broadband_3g_devices",
                CheckKind::SubCategoryBound {
                    whole: Internet3gUsers,
                    part_a: Box3gUsers,
                    part_b: Usb3gUsers,
                },
                "3G box and USB devices ({sum}) exceed 3G internet users ({limit})",
            ),
            CrossFieldCheck::new(
                "broadband_4g_devices",
                CheckKind::SubCategoryBound {
                    whole: Internet4gUsers,
                    part_a: Box4gUsers,
                    part_b: Usb4gUsers,
                },
                "4G box and USB devices ({sum}) exceed 4G internet users ({limit})",
            ),
            CrossFieldCheck::new(
                "postpaid_usage_within_plans",
                CheckKind::UsageWithinPlan {
                    plan: PostpaidPlanStations,
                    usage: PostpaidActiveStations,
                },
                "Active post-paid stations ({sum}) cannot exceed post-paid plans ({limit})",
            ),
            CrossFieldCheck::new(
                "prepaid_usage_within_plans",
                CheckKind::UsageWithinPlan {
                    plan: PrepaidPlanStations,
                    usage: PrepaidActiveStations,
                },
                "Active pre-paid stations ({sum}) cannot exceed pre-paid plans ({limit})",
            ),
        ];

        Self::trusted(FormKind::MobileStations, aggregations, checks)
    }

    /// Catalogue for the originated-traffic questionnaire.
    pub fn originated_traffic() -> Self {
        let sms_national = [SmsOnNet, SmsOffNetNational];
        let sms_international = [SmsEcowas, SmsPalop, SmsCplp, SmsRestOfAfrica, SmsRestOfWorld];
        let voice_national = [
            VoiceOnNetMinutes,
            VoiceOffNetNationalMinutes,
            VoiceFixedNetworkMinutes,
            VoiceOtherMobileMinutes,
        ];
        let voice_international = [
            VoiceEcowasMinutes,
            VoicePalopMinutes,
            VoiceCplpMinutes,
            VoiceRestOfAfricaMinutes,
            VoiceRestOfWorldMinutes,
        ];
        let calls_national = [
            CallsOnNet,
            CallsOffNetNational,
            CallsFixedNetwork,
            CallsOtherMobile,
        ];
        let calls_international = [
            CallsEcowas,
            CallsPalop,
            CallsCplp,
            CallsRestOfAfrica,
            CallsRestOfWorld,
        ];

        let aggregations = vec![
            AggregationRule::field(
                SmsInternationalTotal,
                Combination::Sum(sms_international.to_vec()),
            ),
            AggregationRule::field(
                SmsTotal,
                Combination::Sum(with_total(&sms_national, SmsInternationalTotal)),
            )
            .shown_as("total-sms"),
            AggregationRule::field(
                VoiceInternationalTotalMinutes,
                Combination::Sum(voice_international.to_vec()),
            ),
            AggregationRule::field(
                VoiceTotalMinutes,
                Combination::Sum(with_total(&voice_national, VoiceInternationalTotalMinutes)),
            )
            .shown_as("total-minutos"),
            AggregationRule::field(
                CallsInternationalTotal,
                Combination::Sum(calls_international.to_vec()),
            ),
            AggregationRule::field(
                CallsTotal,
                Combination::Sum(with_total(&calls_national, CallsInternationalTotal)),
            )
            .shown_as("total-chamadas"),
            AggregationRule::display(
                "total-dados-gb",
                Combination::Sum(vec![
                    Data2gMegabytes,
                    Data3gUpgradeMegabytes,
                    Internet3gMegabytes,
                    Internet3gModemMegabytes,
                    Internet3gUsbMegabytes,
                    Data4gMegabytes,
                    Internet4gMegabytes,
                    Internet4gModemMegabytes,
                    Internet4gUsbMegabytes,
                ]),
                TotalFormat::Gigabytes,
            ),
            AggregationRule::display(
                "avg-call-duration",
                Combination::Ratio {
                    numerator: VoiceTotalMinutes,
                    denominator: CallsTotal,
                },
                TotalFormat::MinutesPerCall,
            ),
        ];

        let checks = vec![
            CrossFieldCheck::new(
                "data_2g_sessions_need_volume",
                CheckKind::ActivityRequiresVolume {
                    activity: Data2gSessions,
                    volume: Data2gMegabytes,
                },
                "2G sessions recorded but no data volume",
            ),
            CrossFieldCheck::new(
                "sms_total_matches_parts",
                CheckKind::TotalMatchesParts {
                    parts: with_total(&sms_national, SmsInternationalTotal),
                    total: SmsTotal,
                },
                "SMS total ({limit}) does not match the sum of its parts ({sum})",
            ),
            CrossFieldCheck::new(
                "voice_total_matches_parts",
                CheckKind::TotalMatchesParts {
                    parts: with_total(&voice_national, VoiceInternationalTotalMinutes),
                    total: VoiceTotalMinutes,
                },
                "Voice total ({limit}) does not match the sum of its parts ({sum})",
            ),
            CrossFieldCheck::new(
                "calls_total_matches_parts",
                CheckKind::TotalMatchesParts {
                    parts: with_total(&calls_national, CallsInternationalTotal),
                    total: CallsTotal,
                },
                "Calls total ({limit}) does not match the sum of its parts ({sum})",
            ),
            CrossFieldCheck::new(
                "calls_without_minutes",
                CheckKind::CallsWithoutMinutes {
                    calls: CallsTotal,
                    minutes: VoiceTotalMinutes,
                },
                "Calls recorded but no minutes",
            ),
            CrossFieldCheck::new(
                "average_call_duration",
                CheckKind::AverageDurationCeiling {
                    calls: CallsTotal,
                    minutes: VoiceTotalMinutes,
                },
                "Average call duration is very high ({average} min/call)",
            ),
        ];

        Self::trusted(FormKind::OriginatedTraffic, aggregations, checks)
    }

    fn trusted(
        form: FormKind,
        aggregations: Vec<AggregationRule>,
        checks: Vec<CrossFieldCheck>,
    ) -> Self {
        Self {
            form,
            required: vec![Year, Month],
            aggregations,
            checks,
        }
    }
}

fn with_total(parts: &[FieldName], total: FieldName) -> Vec<FieldName> {
    parts.iter().copied().chain(std::iter::once(total)).collect()
}

fn is_ratio(combination: &Combination) -> bool {
    matches!(combination, Combination::Ratio { .. })
}

fn ensure_owned(form: FormKind, rule: &str, field: FieldName) -> Result<(), CatalogueError> {
    if field.belongs_to(form) {
        Ok(())
    } else {
        Err(CatalogueError::ForeignField {
            rule: rule.to_string(),
            field,
            form,
        })
    }
}

fn ensure_numeric_operands(
    form: FormKind,
    rule: &str,
    operands: &[FieldName],
    same_kind: bool,
) -> Result<(), CatalogueError> {
    let mut expected: Option<FieldKind> = None;

    for field in operands {
        ensure_owned(form, rule, *field)?;

        let kind = field.kind();
        if !kind.is_numeric() {
            return Err(CatalogueError::TextOperand {
                rule: rule.to_string(),
                field: *field,
            });
        }

        match expected {
            Some(existing) if same_kind && existing != kind => {
                return Err(CatalogueError::MixedKinds {
                    rule: rule.to_string(),
                    field: *field,
                });
            }
            Some(_) => {}
            None => expected = Some(kind),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_catalogues_pass_validation() {
        for form in FormKind::ordered() {
            let catalogue = RuleCatalogue::for_form(form);
            let rebuilt = RuleCatalogue::new(
                form,
                catalogue.required().to_vec(),
                catalogue.aggregations().to_vec(),
                catalogue.checks().to_vec(),
            )
            .expect("built-in catalogue is consistent");
            assert_eq!(rebuilt, catalogue);
        }
    }

    #[test]
    fn rejects_fields_from_another_form() {
        let error = RuleCatalogue::new(
            FormKind::MobileStations,
            Vec::new(),
            vec![AggregationRule::display(
                "total-sms",
                Combination::Sum(vec![SmsOnNet]),
                TotalFormat::Count,
            )],
            Vec::new(),
        )
        .expect_err("sms fields belong to originated traffic");

        assert!(matches!(
            error,
            CatalogueError::ForeignField { field: SmsOnNet, .. }
        ));
    }

    #[test]
    fn rejects_mixed_numeric_kinds() {
        let error = RuleCatalogue::new(
            FormKind::MobileStations,
            Vec::new(),
            Vec::new(),
            vec![CrossFieldCheck::new(
                "mixed",
                CheckKind::UsageWithinPlan {
                    plan: TopUpsTotal,
                    usage: MobileMoneyUsers,
                },
                "mixed",
            )],
        )
        .expect_err("cents and counts do not compare");

        assert_eq!(
            error,
            CatalogueError::MixedKinds {
                rule: "mixed".to_string(),
                field: MobileMoneyUsers,
            }
        );
    }

    #[test]
    fn rejects_text_operands() {
        let error = RuleCatalogue::new(
            FormKind::OriginatedTraffic,
            Vec::new(),
            Vec::new(),
            vec![CrossFieldCheck::new(
                "text",
                CheckKind::CallsWithoutMinutes {
                    calls: Operator,
                    minutes: VoiceTotalMinutes,
                },
                "text",
            )],
        )
        .expect_err("operator is free text");

        assert!(matches!(error, CatalogueError::TextOperand { .. }));
    }
}
