//! Pure transformations between backend rows and widget-facing values.

use serde_json::Value;

use super::entities::{Bar, SymbolRecord};
use super::repositories::RawBarRow;
use super::value_objects::Timestamp;

/// Used when a record carries neither a price floor nor price digits
pub const DEFAULT_PRICE_SCALE: u64 = 100;

const ROW_FIELDS: usize = 6;

/// Why a raw row was dropped during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    TooShort(usize),
    Unparseable(&'static str),
    Inconsistent,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRows {
    pub bars: Vec<Bar>,
    pub rejected: usize,
}

/// Number from a JSON number or a numeric string, finite values only
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

pub fn normalize_row(row: &RawBarRow) -> Result<Bar, RowRejection> {
    let fields = &row.0;
    if fields.len() < ROW_FIELDS {
        return Err(RowRejection::TooShort(fields.len()));
    }

    let field = |idx: usize, name: &'static str| {
        parse_number(&fields[idx]).ok_or(RowRejection::Unparseable(name))
    };

    let time_millis = field(0, "time")?;
    let bar = Bar::new(
        Timestamp::from_millis(time_millis as i64),
        field(1, "open")?,
        field(2, "high")?,
        field(3, "low")?,
        field(4, "close")?,
        field(5, "volume")?,
    );

    if !bar.is_consistent() {
        return Err(RowRejection::Inconsistent);
    }
    Ok(bar)
}

/// Normalizes every row, dropping the ones that cannot become a valid bar
pub fn normalize_rows(rows: &[RawBarRow]) -> NormalizedRows {
    let mut out = NormalizedRows { bars: Vec::with_capacity(rows.len()), rejected: 0 };
    for row in rows {
        match normalize_row(row) {
            Ok(bar) => out.bars.push(bar),
            Err(_) => out.rejected += 1,
        }
    }
    out
}

/// Integer reciprocal of the minimum price increment
pub fn price_scale(record: &SymbolRecord) -> u64 {
    match record.min_price_increment() {
        Some(step) if step > 0.0 => (1.0 / step).round().max(1.0) as u64,
        _ => DEFAULT_PRICE_SCALE,
    }
}
