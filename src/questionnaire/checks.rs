use super::aggregation::{format_money, format_number, sum};
use super::fields::{FieldGroup, FieldKind, FieldName};
use super::report::{CheckResult, CheckStatus, Severity};
use super::snapshot::FieldSnapshot;
use serde::{Deserialize, Serialize};

const DEFAULT_FRACTION_EPSILON_CENTS: u64 = 1;
const DEFAULT_MAX_AVERAGE_CALL_MINUTES: u64 = 60;

/// Tunable tolerances shared by every check in a catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckLimits {
    /// Allowed gap between a fractional total and its gender split.
    pub fraction_epsilon_cents: u64,
    pub max_average_call_minutes: u64,
}

impl Default for CheckLimits {
    fn default() -> Self {
        Self {
            fraction_epsilon_cents: DEFAULT_FRACTION_EPSILON_CENTS,
            max_average_call_minutes: DEFAULT_MAX_AVERAGE_CALL_MINUTES,
        }
    }
}

/// Comparison performed by a check, with its operands in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckKind {
    /// `female + male <= total`.
    GenderSum {
        total: FieldName,
        female: FieldName,
        male: FieldName,
    },
    /// `|female + male - total| <= epsilon`, on cents.
    FractionalGenderSum {
        total: FieldName,
        female: FieldName,
        male: FieldName,
    },
    /// `part_a + part_b <= whole`, not applicable while `whole` is zero.
    SubCategoryBound {
        whole: FieldName,
        part_a: FieldName,
        part_b: FieldName,
    },
    /// `usage <= plan`.
    UsageWithinPlan { plan: FieldName, usage: FieldName },
    /// Activity without any recorded volume.
    ActivityRequiresVolume {
        activity: FieldName,
        volume: FieldName,
    },
    /// Stored total differs from the sum of its parts.
    TotalMatchesParts {
        parts: Vec<FieldName>,
        total: FieldName,
    },
    CallsWithoutMinutes { calls: FieldName, minutes: FieldName },
    AverageDurationCeiling { calls: FieldName, minutes: FieldName },
}

impl CheckKind {
    pub fn severity(&self) -> Severity {
        match self {
            CheckKind::GenderSum { .. }
            | CheckKind::FractionalGenderSum { .. }
            | CheckKind::SubCategoryBound { .. }
            | CheckKind::UsageWithinPlan { .. }
            | CheckKind::ActivityRequiresVolume { .. } => Severity::Blocking,
            CheckKind::TotalMatchesParts { .. }
            | CheckKind::CallsWithoutMinutes { .. }
            | CheckKind::AverageDurationCeiling { .. } => Severity::Advisory,
        }
    }

    pub fn operands(&self) -> Vec<FieldName> {
        match self {
            CheckKind::GenderSum {
                total,
                female,
                male,
            }
            | CheckKind::FractionalGenderSum {
                total,
                female,
                male,
            } => vec![*total, *female, *male],
            CheckKind::SubCategoryBound {
                whole,
                part_a,
                part_b,
            } => vec![*whole, *part_a, *part_b],
            CheckKind::UsageWithinPlan { plan, usage } => vec![*plan, *usage],
            CheckKind::ActivityRequiresVolume { activity, volume } => vec![*activity, *volume],
            CheckKind::TotalMatchesParts { parts, total } => {
                parts.iter().copied().chain(std::iter::once(*total)).collect()
            }
            CheckKind::CallsWithoutMinutes { calls, minutes }
            | CheckKind::AverageDurationCeiling { calls, minutes } => vec![*calls, *minutes],
        }
    }

    /// Field that carries the error: the last operand of the comparison.
    pub fn attached_field(&self) -> FieldName {
        match self {
            CheckKind::GenderSum { male, .. } | CheckKind::FractionalGenderSum { male, .. } => {
                *male
            }
            CheckKind::SubCategoryBound { part_b, .. } => *part_b,
            CheckKind::UsageWithinPlan { usage, .. } => *usage,
            CheckKind::ActivityRequiresVolume { volume, .. } => *volume,
            CheckKind::TotalMatchesParts { total, .. } => *total,
            CheckKind::CallsWithoutMinutes { minutes, .. }
            | CheckKind::AverageDurationCeiling { minutes, .. } => *minutes,
        }
    }
}

/// Named cross-field invariant with its user-facing message template.
///
/// Templates may reference `{sum}`, `{limit}` and `{average}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFieldCheck {
    pub rule: String,
    pub kind: CheckKind,
    pub message: String,
}

enum Verdict {
    Pass,
    Skip,
    Trip(Vec<(&'static str, String)>),
}

impl CrossFieldCheck {
    pub fn new(rule: &str, kind: CheckKind, message: &str) -> Self {
        Self {
            rule: rule.to_string(),
            kind,
            message: message.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn references(&self, field: FieldName) -> bool {
        self.kind.operands().contains(&field)
    }

    pub fn references_group(&self, group: FieldGroup) -> bool {
        self.kind
            .operands()
            .iter()
            .any(|field| field.group() == group)
    }

    pub fn evaluate(&self, snapshot: &FieldSnapshot, limits: &CheckLimits) -> CheckResult {
        let severity = self.severity();
        let field = Some(self.kind.attached_field());

        let (status, message) = match self.verdict(snapshot, limits) {
            Verdict::Pass => (CheckStatus::Passed, None),
            Verdict::Skip => (CheckStatus::Skipped, None),
            Verdict::Trip(values) => {
                let status = match severity {
                    Severity::Blocking => CheckStatus::Failed,
                    Severity::Advisory => CheckStatus::Warning,
                };
                (status, Some(render(&self.message, &values)))
            }
        };

        CheckResult {
            rule: self.rule.clone(),
            status,
            severity,
            field,
            message,
        }
    }

    fn verdict(&self, snapshot: &FieldSnapshot, limits: &CheckLimits) -> Verdict {
        let value = |field: FieldName| snapshot.numeric(field);

        match &self.kind {
            CheckKind::GenderSum {
                total,
                female,
                male,
            } => {
                let split = value(*female).saturating_add(value(*male));
                let total_value = value(*total);
                if split <= total_value {
                    Verdict::Pass
                } else {
                    Verdict::Trip(amounts(*total, split, total_value))
                }
            }
            CheckKind::FractionalGenderSum {
                total,
                female,
                male,
            } => {
                let split = value(*female).saturating_add(value(*male));
                let total_value = value(*total);
                if split.abs_diff(total_value) <= limits.fraction_epsilon_cents {
                    Verdict::Pass
                } else {
                    Verdict::Trip(amounts(*total, split, total_value))
                }
            }
            CheckKind::SubCategoryBound {
                whole,
                part_a,
                part_b,
            } => {
                let whole_value = value(*whole);
                if whole_value == 0 {
                    return Verdict::Skip;
                }
                let parts = value(*part_a).saturating_add(value(*part_b));
                if parts <= whole_value {
                    Verdict::Pass
                } else {
                    Verdict::Trip(amounts(*whole, parts, whole_value))
                }
            }
            CheckKind::UsageWithinPlan { plan, usage } => {
                let (plan_value, usage_value) = (value(*plan), value(*usage));
                if usage_value <= plan_value {
                    Verdict::Pass
                } else {
                    Verdict::Trip(amounts(*plan, usage_value, plan_value))
                }
            }
            CheckKind::ActivityRequiresVolume { activity, volume } => {
                if value(*activity) > 0 && value(*volume) == 0 {
                    Verdict::Trip(amounts(*volume, value(*activity), 0))
                } else {
                    Verdict::Pass
                }
            }
            CheckKind::TotalMatchesParts { parts, total } => {
                let parts_value = sum(snapshot, parts);
                let total_value = value(*total);
                if parts_value == total_value {
                    Verdict::Pass
                } else {
                    Verdict::Trip(amounts(*total, parts_value, total_value))
                }
            }
            CheckKind::CallsWithoutMinutes { calls, minutes } => {
                if value(*calls) > 0 && value(*minutes) == 0 {
                    Verdict::Trip(amounts(*minutes, 0, value(*calls)))
                } else {
                    Verdict::Pass
                }
            }
            CheckKind::AverageDurationCeiling { calls, minutes } => {
                let (calls_value, minutes_value) = (value(*calls), value(*minutes));
                if calls_value == 0 {
                    return Verdict::Skip;
                }
                let ceiling = u128::from(limits.max_average_call_minutes) * u128::from(calls_value);
                if u128::from(minutes_value) > ceiling {
                    let average = minutes_value as f64 / calls_value as f64;
                    Verdict::Trip(vec![
                        ("average", format!("{average:.1}")),
                        ("limit", limits.max_average_call_minutes.to_string()),
                    ])
                } else {
                    Verdict::Pass
                }
            }
        }
    }
}

fn amounts(reference: FieldName, sum: u64, limit: u64) -> Vec<(&'static str, String)> {
    let format = |value: u64| match reference.kind() {
        FieldKind::Fractional => format_money(value),
        FieldKind::Integer | FieldKind::Text => format_number(value),
    };
    vec![("sum", format(sum)), ("limit", format(limit))]
}

fn render(template: &str, values: &[(&'static str, String)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |message, (key, value)| {
            message.replace(&format!("{{{key}}}"), value)
        })
}
