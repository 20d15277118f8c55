use crate::reader::RawRow;
use crate::schema::FunderFormat;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A report row after field normalization: the canonical grouping key, the
/// display label, and every declared Currency column as an exact decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub entity_key: String,
    pub label: String,
    pub amounts: BTreeMap<String, Decimal>,
}

/// Converts raw currency cell text to an exact decimal.
///
/// Strips currency symbols, thousands separators and stray quote characters,
/// and turns accounting-style `(X)` into `-X`. Empty, missing or unparseable
/// cells normalize to zero: malformed currency cells are data-entry noise,
/// never a batch failure.
pub fn normalize_currency(raw: &str) -> Decimal {
    let cleaned = raw
        .replace('$', "")
        .replace(',', "")
        .replace('"', "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Canonicalizes an identifier to an integer string, stripping formatting
/// artifacts such as a trailing `.0` or thousands separators. Returns `None`
/// when the value is not numeric-coercible; callers exclude such rows from
/// aggregation.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let cleaned = raw
        .replace(',', "")
        .replace('"', "")
        .replace('$', "")
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return None;
    }

    let value = cleaned.parse::<Decimal>().ok()?;
    Some(value.trunc().normalize().to_string())
}

/// Applies the format's type map to a raw row. Returns `None` when the entity
/// key is not numeric-coercible (the row is skipped as noise); every declared
/// Currency column is always present in the result, defaulting to zero.
pub fn normalize_row(row: &RawRow, format: &FunderFormat) -> Option<NormalizedRow> {
    let raw_key = row
        .get(&format.entity_key_column)
        .map(String::as_str)
        .unwrap_or("");
    let entity_key = normalize_identifier(raw_key)?;

    let label = match &format.label_column {
        Some(column) => row
            .get(column)
            .map(|value| value.trim().to_string())
            .unwrap_or_default(),
        None => entity_key.clone(),
    };

    let amounts = format
        .currency_columns()
        .into_iter()
        .map(|column| {
            let raw = row.get(column).map(String::as_str).unwrap_or("");
            (column.to_string(), normalize_currency(raw))
        })
        .collect();

    Some(NormalizedRow {
        entity_key,
        label,
        amounts,
    })
}
