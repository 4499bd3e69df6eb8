use super::fields::{FieldKind, FieldName, FormKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Parsed value of a single questionnaire input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldValue {
    Integer(u64),
    /// Amount in cents.
    Fractional(u64),
    Text(String),
}

impl FieldValue {
    /// Minor-unit magnitude used by aggregation; text counts as zero.
    pub fn numeric(&self) -> u64 {
        match self {
            FieldValue::Integer(value) | FieldValue::Fractional(value) => *value,
            FieldValue::Text(_) => 0,
        }
    }
}

/// Strip every non-digit character and parse the remainder.
///
/// Unparsable or overflowing input yields zero.
pub fn parse_integer(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Parse a currency amount into cents, rounding half-up to two decimals.
///
/// Accepts both `1234.56` and the pt-BR rendering `1.234,56`.
pub fn parse_fractional_cents(raw: &str) -> u64 {
    let normalized = normalize_decimal_separator(raw);
    let (whole, fraction) = split_decimal(&normalized);

    let whole = if whole.is_empty() {
        0
    } else {
        match whole.parse::<u64>() {
            Ok(value) => value,
            Err(_) => return 0,
        }
    };

    let mut digits = fraction.chars().filter_map(|c| c.to_digit(10));
    let tenths = digits.next().unwrap_or(0) as u64;
    let hundredths = digits.next().unwrap_or(0) as u64;
    let round_up = digits.next().map_or(false, |next| next >= 5);

    let cents = tenths * 10 + hundredths + u64::from(round_up);
    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(cents))
        .unwrap_or(0)
}

/// Input-time cleanup for currency fields: digits and a single decimal point,
/// truncated to two decimals.
pub fn sanitize_fractional(raw: &str) -> String {
    let normalized = normalize_decimal_separator(raw);
    let kept: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match kept.split_once('.') {
        Some((whole, rest)) => {
            let fraction: String = rest.chars().filter(char::is_ascii_digit).take(2).collect();
            format!("{whole}.{fraction}")
        }
        None => kept,
    }
}

/// True when the raw input denotes a number below zero.
pub fn is_negative_input(raw: &str) -> bool {
    let trimmed = raw.trim_start();
    trimmed.starts_with('-') && trimmed.chars().any(|c| c.is_ascii_digit() && c != '0')
}

fn normalize_decimal_separator(raw: &str) -> String {
    if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    }
}

fn split_decimal(normalized: &str) -> (String, String) {
    let kept: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match kept.split_once('.') {
        Some((whole, rest)) => (whole.to_string(), rest.replace('.', "")),
        None => (kept, String::new()),
    }
}

/// Current raw values of a form, keyed by typed field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSnapshot {
    values: BTreeMap<FieldName, String>,
}

/// Result of reading a wire-level field map into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotParse {
    pub snapshot: FieldSnapshot,
    /// Keys that are unknown or belong to another form.
    pub ignored: Vec<String>,
    /// Numeric fields whose negative input was replaced by `0`.
    pub clamped: Vec<FieldName>,
}

impl FieldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot for `form` from wire names, dropping keys the form does not own.
    pub fn from_wire<I, K, V>(form: FormKind, entries: I) -> SnapshotParse
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut snapshot = FieldSnapshot::new();
        let mut ignored = Vec::new();

        for (key, value) in entries {
            match key.as_ref().parse::<FieldName>() {
                Ok(field) if field.belongs_to(form) => snapshot.set(field, value),
                _ => ignored.push(key.as_ref().to_string()),
            }
        }

        if !ignored.is_empty() {
            debug!(form = %form, ignored = ?ignored, "ignoring fields outside the form");
        }

        let clamped = snapshot.clamp_negatives();
        SnapshotParse {
            snapshot,
            ignored,
            clamped,
        }
    }

    /// Replace negative numeric inputs with `0`, returning the affected fields.
    pub fn clamp_negatives(&mut self) -> Vec<FieldName> {
        let clamped: Vec<FieldName> = self
            .values
            .iter()
            .filter(|(field, raw)| field.kind().is_numeric() && is_negative_input(raw))
            .map(|(field, _)| *field)
            .collect();

        for field in &clamped {
            self.values.insert(*field, "0".to_string());
        }
        if !clamped.is_empty() {
            debug!(clamped = ?clamped, "clamped negative inputs");
        }
        clamped
    }

    pub fn with(mut self, field: FieldName, raw: impl Into<String>) -> Self {
        self.set(field, raw);
        self
    }

    pub fn set(&mut self, field: FieldName, raw: impl Into<String>) {
        self.values.insert(field, raw.into());
    }

    pub fn raw(&self, field: FieldName) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_blank(&self, field: FieldName) -> bool {
        self.raw(field).map_or(true, |raw| raw.trim().is_empty())
    }

    pub fn value(&self, field: FieldName) -> FieldValue {
        let raw = self.raw(field).unwrap_or_default();
        match field.kind() {
            FieldKind::Integer => FieldValue::Integer(parse_integer(raw)),
            FieldKind::Fractional => FieldValue::Fractional(parse_fractional_cents(raw)),
            FieldKind::Text => FieldValue::Text(raw.trim().to_string()),
        }
    }

    /// Integer count or amount in cents; absent and unparsable values are zero.
    pub fn numeric(&self, field: FieldName) -> u64 {
        self.value(field).numeric()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.values.iter().map(|(field, raw)| (*field, raw.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat wire mapping, as persisted by draft stores.
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(field, raw)| (field.as_str().to_string(), raw.clone()))
            .collect()
    }
}
