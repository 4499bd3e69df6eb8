use super::fields::FormKind;
use super::snapshot::{FieldSnapshot, SnapshotParse};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Failures reading a snapshot from an export file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotImportError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse snapshot CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format '{0}' (expected .csv or .json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    field: String,
    #[serde(default)]
    value: String,
}

/// Two-column `field,value` CSV, one row per input.
pub fn snapshot_from_csv<R: Read>(
    form: FormKind,
    reader: R,
) -> Result<SnapshotParse, SnapshotImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for row in csv_reader.deserialize::<SnapshotRow>() {
        let row = row?;
        entries.push((row.field, row.value));
    }

    Ok(FieldSnapshot::from_wire(form, entries))
}

/// Flat JSON object of field name to value; numbers are accepted as well as strings.
pub fn snapshot_from_json<R: Read>(
    form: FormKind,
    reader: R,
) -> Result<SnapshotParse, SnapshotImportError> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_reader(reader)?;
    Ok(FieldSnapshot::from_wire(form, flatten_values(raw)))
}

pub fn snapshot_from_path(
    form: FormKind,
    path: impl AsRef<Path>,
) -> Result<SnapshotParse, SnapshotImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "csv" => snapshot_from_csv(form, File::open(path)?),
        "json" => snapshot_from_json(form, File::open(path)?),
        other => Err(SnapshotImportError::UnsupportedFormat(other.to_string())),
    }
}

/// Render JSON scalars as the raw strings a form input would hold.
pub fn flatten_values(
    raw: BTreeMap<String, serde_json::Value>,
) -> impl Iterator<Item = (String, String)> {
    raw.into_iter().map(|(key, value)| {
        let text = match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        (key, text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::fields::FieldName;
    use std::io::Cursor;

    #[test]
    fn reads_csv_rows() {
        let csv = "field,value\nnumero_utilizadores, 1.200 \nnumero_utilizadores_mulher,700\nunknown,3\n";
        let parsed = snapshot_from_csv(FormKind::MobileStations, Cursor::new(csv)).expect("csv parses");

        assert_eq!(parsed.snapshot.raw(FieldName::MobileMoneyUsers), Some("1.200"));
        assert_eq!(parsed.snapshot.numeric(FieldName::MobileMoneyUsersFemale), 700);
        assert_eq!(parsed.ignored, vec!["unknown"]);
    }

    #[test]
    fn reads_json_scalars() {
        let json = r#"{"sms_on_net": 120, "sms_palop": "1.000", "ano": null, "sms_total": 1.5}"#;
        let parsed =
            snapshot_from_json(FormKind::OriginatedTraffic, Cursor::new(json)).expect("json parses");

        assert_eq!(parsed.snapshot.raw(FieldName::SmsOnNet), Some("120"));
        assert_eq!(parsed.snapshot.numeric(FieldName::SmsPalop), 1_000);
        assert!(parsed.snapshot.is_blank(FieldName::Year));
        assert_eq!(parsed.snapshot.raw(FieldName::SmsTotal), Some("1.5"));
    }

    #[test]
    fn rejects_unknown_extensions() {
        match snapshot_from_path(FormKind::MobileStations, "snapshot.xlsx") {
            Err(SnapshotImportError::UnsupportedFormat(ext)) => assert_eq!(ext, "xlsx"),
            other => panic!("expected unsupported format, got {other:?}"),
        }
    }
}
