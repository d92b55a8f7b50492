use std::io::Read;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::record::{TransactionRecord, non_blank};

#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(default, rename = "Signature")]
    signature: Option<String>,
    #[serde(default, rename = "Timestamp")]
    timestamp: Option<String>,
    #[serde(default, rename = "Type")]
    kind: Option<String>,
    #[serde(default, rename = "Source")]
    source: Option<String>,
    #[serde(default, rename = "Destination")]
    destination: Option<String>,
    #[serde(default, rename = "Amount")]
    amount: Option<String>,
    #[serde(default, rename = "Decimals")]
    decimals: Option<String>,
    #[serde(default, rename = "Token Address")]
    token_address: Option<String>,
}

impl From<CsvRow> for TransactionRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            signature: row.signature.unwrap_or_default(),
            timestamp: row.timestamp.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
            from: non_blank(row.source),
            to: non_blank(row.destination),
            amount: row.amount.as_deref().and_then(parse_float_prefix),
            decimals: row.decimals.as_deref().and_then(parse_int_prefix),
            token_address: row.token_address.unwrap_or_default(),
        }
    }
}

pub(super) fn parse_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().context("failed to read CSV header row")?;
    if !headers.iter().any(|header| header == "Amount") {
        log::warn!("CSV header has no Amount column; every bubble will use the minimum size");
    }

    let mut records = Vec::new();
    for (row_index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let row = row.with_context(|| format!("malformed CSV row at line {}", row_index + 2))?;
        records.push(TransactionRecord::from(row));
    }

    Ok(records)
}

pub(super) fn parse_json(raw: &[u8]) -> Result<Vec<TransactionRecord>> {
    let parsed: Value = serde_json::from_slice(raw).context("invalid JSON transaction list")?;
    let rows = parsed
        .as_array()
        .ok_or_else(|| anyhow!("expected a JSON array of transaction records"))?;

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let object = row
            .as_object()
            .ok_or_else(|| anyhow!("transaction record #{index} is not a JSON object"))?;

        records.push(TransactionRecord {
            signature: json_text(object.get("signature")).unwrap_or_default(),
            timestamp: json_text(object.get("timestamp")).unwrap_or_default(),
            kind: json_text(object.get("type")).unwrap_or_default(),
            from: non_blank(json_text(object.get("from"))),
            to: non_blank(json_text(object.get("to"))),
            amount: match object.get("amount") {
                Some(Value::Number(number)) => number.as_f64(),
                Some(Value::String(text)) => parse_float_prefix(text),
                _ => None,
            },
            decimals: match object.get("decimals") {
                Some(Value::Number(number)) => number
                    .as_u64()
                    .and_then(|value| u32::try_from(value).ok())
                    .or_else(|| number.as_f64().and_then(|value| parse_int_prefix(&value.to_string()))),
                Some(Value::String(text)) => parse_int_prefix(text),
                _ => None,
            },
            token_address: json_text(object.get("tokenAddress")).unwrap_or_default(),
        });
    }

    Ok(records)
}

fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Longest numeric prefix of `text`, the way a lenient float reader treats
/// `"12.5 SOL"` as `12.5`. Returns `None` when no digits lead the text.
pub(super) fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>()
        && value.is_finite()
    {
        return Some(value);
    }

    let bytes = text.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - integer_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        digits += cursor - fraction_start;
        end = cursor;
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && matches!(bytes[cursor], b'+' | b'-') {
            cursor += 1;
        }
        let exponent_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    text[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub(super) fn parse_int_prefix(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text.strip_prefix('+').unwrap_or(text);
    let end = digits
        .bytes()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<u32>().ok()
}
