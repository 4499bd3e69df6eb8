use super::fields::FieldName;
use super::snapshot::FieldSnapshot;
use serde::{Deserialize, Serialize};

/// Sum of the listed fields; absent or unparsable values count as zero.
pub fn sum(snapshot: &FieldSnapshot, fields: &[FieldName]) -> u64 {
    fields
        .iter()
        .fold(0u64, |acc, field| acc.saturating_add(snapshot.numeric(*field)))
}

/// Larger of two group sums, for categories that can be counted two ways.
pub fn max_of_sums(snapshot: &FieldSnapshot, group_a: &[FieldName], group_b: &[FieldName]) -> u64 {
    sum(snapshot, group_a).max(sum(snapshot, group_b))
}

/// How a rule combines its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combination {
    Sum(Vec<FieldName>),
    MaxOfSums(Vec<FieldName>, Vec<FieldName>),
    /// Quotient in hundredths; undefined when the denominator is zero.
    Ratio {
        numerator: FieldName,
        denominator: FieldName,
    },
}

impl Combination {
    pub fn inputs(&self) -> Vec<FieldName> {
        match self {
            Combination::Sum(fields) => fields.clone(),
            Combination::MaxOfSums(group_a, group_b) => {
                group_a.iter().chain(group_b.iter()).copied().collect()
            }
            Combination::Ratio {
                numerator,
                denominator,
            } => vec![*numerator, *denominator],
        }
    }

    fn evaluate(&self, snapshot: &FieldSnapshot) -> Option<u64> {
        match self {
            Combination::Sum(fields) => Some(sum(snapshot, fields)),
            Combination::MaxOfSums(group_a, group_b) => {
                Some(max_of_sums(snapshot, group_a, group_b))
            }
            Combination::Ratio {
                numerator,
                denominator,
            } => {
                let denominator = snapshot.numeric(*denominator);
                if denominator == 0 {
                    return None;
                }
                let numerator = u128::from(snapshot.numeric(*numerator)) * 100;
                let quotient = numerator / u128::from(denominator);
                Some(u64::try_from(quotient).unwrap_or(u64::MAX))
            }
        }
    }
}

/// Where a derived value goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedOutput {
    /// Auto-calculated input, written back so later rules can read it.
    Field(FieldName),
    /// Summary widget shown next to the form.
    Display(String),
}

impl DerivedOutput {
    pub fn name(&self) -> &str {
        match self {
            DerivedOutput::Field(field) => field.as_str(),
            DerivedOutput::Display(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalFormat {
    Count,
    /// Value in cents.
    Money,
    /// Value in megabytes, rendered as gigabytes.
    Gigabytes,
    /// Value in hundredths of a minute.
    MinutesPerCall,
}

impl TotalFormat {
    pub fn render(self, value: u64) -> String {
        match self {
            TotalFormat::Count => format_number(value),
            TotalFormat::Money => format_money(value),
            TotalFormat::Gigabytes => {
                let hundredths = (u128::from(value) * 100 + 512) / 1024;
                format!("{} GB", format_hundredths(hundredths))
            }
            TotalFormat::MinutesPerCall => {
                let tenths = value / 10 + u64::from(value % 10 >= 5);
                format!("{},{} min", format_number(tenths / 10), tenths % 10)
            }
        }
    }
}

/// Declarative derived-total rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRule {
    pub output: DerivedOutput,
    pub combination: Combination,
    pub format: TotalFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_above: Option<u64>,
}

impl AggregationRule {
    pub fn field(output: FieldName, combination: Combination) -> Self {
        Self {
            output: DerivedOutput::Field(output),
            combination,
            format: TotalFormat::Count,
            display: None,
            highlight_above: None,
        }
    }

    pub fn display(id: &str, combination: Combination, format: TotalFormat) -> Self {
        Self {
            output: DerivedOutput::Display(id.to_string()),
            combination,
            format,
            display: None,
            highlight_above: None,
        }
    }

    /// Also surface a written-back field in a summary widget.
    pub fn shown_as(mut self, id: &str) -> Self {
        self.display = Some(id.to_string());
        self
    }

    pub fn highlight_above(mut self, threshold: u64) -> Self {
        self.highlight_above = Some(threshold);
        self
    }

    fn widget(&self) -> Option<&str> {
        match (&self.output, &self.display) {
            (_, Some(id)) => Some(id),
            (DerivedOutput::Display(id), None) => Some(id),
            (DerivedOutput::Field(_), None) => None,
        }
    }
}

/// Named, formatted total consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTotal {
    pub name: String,
    pub value: u64,
    pub formatted: String,
    pub highlighted: bool,
}

/// Snapshot completed with auto-calculated fields, plus the display totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOutcome {
    pub snapshot: FieldSnapshot,
    pub totals: Vec<DerivedTotal>,
}

impl AggregationOutcome {
    pub fn total(&self, name: &str) -> Option<&DerivedTotal> {
        self.totals.iter().find(|total| total.name == name)
    }
}

/// Evaluate rules in order; field outputs are visible to the rules after them.
pub fn aggregate(rules: &[AggregationRule], snapshot: &FieldSnapshot) -> AggregationOutcome {
    let mut working = snapshot.clone();
    let mut totals = Vec::new();

    for rule in rules {
        let value = rule.combination.evaluate(&working);

        if let (DerivedOutput::Field(field), Some(value)) = (&rule.output, value) {
            working.set(*field, value.to_string());
        }

        if let (Some(widget), Some(value)) = (rule.widget(), value) {
            totals.push(DerivedTotal {
                name: widget.to_string(),
                value,
                formatted: rule.format.render(value),
                highlighted: rule
                    .highlight_above
                    .map_or(false, |threshold| value > threshold),
            });
        }
    }

    AggregationOutcome {
        snapshot: working,
        totals,
    }
}

/// Group thousands with `.`, e.g. `1.234.567`.
pub fn format_number(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// pt-BR currency rendering of a cent amount, e.g. `1.234,56`.
pub fn format_money(cents: u64) -> String {
    format_hundredths(u128::from(cents))
}

fn format_hundredths(hundredths: u128) -> String {
    let whole = group_thousands(&(hundredths / 100).to_string());
    format!("{whole},{:02}", hundredths % 100)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::fields::FieldName::*;

    fn snapshot() -> FieldSnapshot {
        FieldSnapshot::new()
            .with(SmsOnNet, "1.000")
            .with(SmsOffNetNational, "250")
            .with(SmsEcowas, "garbage")
            .with(SmsPalop, "40")
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        assert_eq!(sum(&snapshot(), &[]), 0);
    }

    #[test]
    fn sum_is_order_independent() {
        let snapshot = snapshot();
        let forward = sum(&snapshot, &[SmsOnNet, SmsOffNetNational, SmsEcowas, SmsPalop]);
        let backward = sum(&snapshot, &[SmsPalop, SmsEcowas, SmsOffNetNational, SmsOnNet]);
        assert_eq!(forward, 1_290);
        assert_eq!(forward, backward);
        assert_eq!(
            sum(&snapshot, &[SmsOnNet, SmsOffNetNational]) + sum(&snapshot, &[SmsPalop]),
            forward
        );
    }

    #[test]
    fn max_of_sums_picks_larger_group() {
        let snapshot = FieldSnapshot::new()
            .with(Service3gUpgradeUsers, "100")
            .with(Service4gUsers, "50")
            .with(Internet3gUsers, "90")
            .with(Internet4gUsers, "80");
        assert_eq!(
            max_of_sums(
                &snapshot,
                &[Service3gUpgradeUsers, Service4gUsers],
                &[Internet3gUsers, Internet4gUsers]
            ),
            170
        );
    }

    #[test]
    fn field_outputs_feed_later_rules() {
        let rules = vec![
            AggregationRule::field(SmsInternationalTotal, Combination::Sum(vec![SmsEcowas, SmsPalop])),
            AggregationRule::field(
                SmsTotal,
                Combination::Sum(vec![SmsOnNet, SmsOffNetNational, SmsInternationalTotal]),
            )
            .shown_as("total-sms"),
        ];

        let outcome = aggregate(&rules, &snapshot());
        assert_eq!(outcome.snapshot.numeric(SmsInternationalTotal), 40);
        assert_eq!(outcome.snapshot.numeric(SmsTotal), 1_290);
        assert_eq!(outcome.totals.len(), 1);
        let total = outcome.total("total-sms").expect("sms total shown");
        assert_eq!(total.formatted, "1.290");
    }

    #[test]
    fn ratio_is_omitted_without_denominator() {
        let rules = vec![AggregationRule::display(
            "avg-call-duration",
            Combination::Ratio {
                numerator: VoiceTotalMinutes,
                denominator: CallsTotal,
            },
            TotalFormat::MinutesPerCall,
        )];

        let empty = aggregate(&rules, &FieldSnapshot::new().with(VoiceTotalMinutes, "10"));
        assert!(empty.totals.is_empty());

        let filled = aggregate(
            &rules,
            &FieldSnapshot::new()
                .with(VoiceTotalMinutes, "100")
                .with(CallsTotal, "40"),
        );
        assert_eq!(filled.totals[0].value, 250);
        assert_eq!(filled.totals[0].formatted, "2,5 min");
    }

    #[test]
    fn highlight_threshold_is_exclusive() {
        let rule = AggregationRule::display(
            "total-mobile-money",
            Combination::Sum(vec![MobileMoneyUsers]),
            TotalFormat::Count,
        )
        .highlight_above(100_000);

        let at = aggregate(
            std::slice::from_ref(&rule),
            &FieldSnapshot::new().with(MobileMoneyUsers, "100000"),
        );
        let above = aggregate(
            std::slice::from_ref(&rule),
            &FieldSnapshot::new().with(MobileMoneyUsers, "100001"),
        );
        assert!(!at.totals[0].highlighted);
        assert!(above.totals[0].highlighted);
    }

    #[test]
    fn formats_follow_locale_conventions() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_234_567), "1.234.567");
        assert_eq!(format_money(123_456), "1.234,56");
        assert_eq!(format_money(5), "0,05");
        assert_eq!(TotalFormat::Gigabytes.render(2_048), "2,00 GB");
        assert_eq!(TotalFormat::Gigabytes.render(1_536), "1,50 GB");
    }

    #[test]
    fn minutes_per_call_rounds_half_up_without_overflow() {
        assert_eq!(TotalFormat::MinutesPerCall.render(0), "0,0 min");
        assert_eq!(TotalFormat::MinutesPerCall.render(1_234), "12,3 min");
        assert_eq!(TotalFormat::MinutesPerCall.render(1_235), "12,4 min");
        assert_eq!(
            TotalFormat::MinutesPerCall.render(u64::MAX),
            "184.467.440.737.095.516,2 min"
        );
    }

    #[test]
    fn saturated_ratio_still_renders() {
        let rules = vec![AggregationRule::display(
            "avg-call-duration",
            Combination::Ratio {
                numerator: VoiceOnNetMinutes,
                denominator: CallsOnNet,
            },
            TotalFormat::MinutesPerCall,
        )];
        let snapshot = FieldSnapshot::new()
            .with(VoiceOnNetMinutes, "18446744073709551615")
            .with(CallsOnNet, "1");

        let outcome = aggregate(&rules, &snapshot);
        let total = outcome.total("avg-call-duration").expect("ratio shown");
        assert_eq!(total.value, u64::MAX);
        assert!(total.formatted.ends_with(" min"));
    }
}
