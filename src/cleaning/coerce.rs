//! Type coercion.
//!
//! Coercion is best-effort and never fails as a whole: a cell that cannot be converted becomes
//! [`Value::Invalid`] carrying its original text, and missing cells stay missing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::rules::TargetType;
use crate::types::{DataType, Value};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Month-first before day-first for ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateFormat {
    Rfc3339,
    // YYYYMMDD
    Compact,
    DateTime(&'static str),
    Date(&'static str),
}

enum Number {
    Int(i64),
    Float(f64),
}

/// Coerce a column to an explicit target type.
///
/// Returns the converted cells and the column's resulting [`DataType`].
pub fn coerce_column(values: Vec<Value>, target: TargetType) -> (Vec<Value>, DataType) {
    match target {
        TargetType::Numeric => to_numeric(values),
        TargetType::Date => (to_date(values), DataType::Date),
        TargetType::Text => (to_text(values), DataType::Utf8),
    }
}

/// Opportunistic numeric detection for columns without an explicit target.
///
/// Only text columns are considered, and only when *every* present cell parses as a number;
/// a partly numeric column is returned untouched.
pub fn auto_detect(values: Vec<Value>, current: DataType) -> (Vec<Value>, DataType) {
    if current != DataType::Utf8 {
        return (values, current);
    }
    let mut present = values.iter().filter(|v| !v.is_missing()).peekable();
    if present.peek().is_none() {
        return (values, current);
    }
    if present.all(|v| parse_number(v).is_some()) {
        to_numeric(values)
    } else {
        (values, current)
    }
}

fn to_numeric(values: Vec<Value>) -> (Vec<Value>, DataType) {
    let cells: Vec<Result<Number, Value>> = values
        .into_iter()
        .map(|v| {
            if v.is_missing() {
                return Err(v);
            }
            parse_number(&v).ok_or_else(|| Value::Invalid(raw_text(&v)))
        })
        .collect();

    let all_int = cells.iter().all(|c| !matches!(c, Ok(Number::Float(_))));

    let out = cells
        .into_iter()
        .map(|c| match c {
            Ok(Number::Int(i)) if all_int => Value::Int64(i),
            Ok(Number::Int(i)) => Value::Float64(i as f64),
            Ok(Number::Float(f)) => Value::Float64(f),
            Err(v) => v,
        })
        .collect();

    let data_type = if all_int { DataType::Int64 } else { DataType::Float64 };
    (out, data_type)
}

fn parse_number(v: &Value) -> Option<Number> {
    match v {
        Value::Int64(i) => Some(Number::Int(*i)),
        Value::Float64(f) => Some(Number::Float(*f)),
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Utf8(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                Some(Number::Int(i))
            } else {
                t.parse::<f64>().ok().filter(|f| !f.is_nan()).map(Number::Float)
            }
        }
        Value::Null | Value::Invalid(_) | Value::Date(_) => None,
    }
}

fn to_date(values: Vec<Value>) -> Vec<Value> {
    let preferred = values.iter().find_map(|v| match v {
        Value::Utf8(s) => detect_date_format(s.trim()),
        _ => None,
    });

    values
        .into_iter()
        .map(|v| match v {
            Value::Null | Value::Invalid(_) | Value::Date(_) => v,
            Value::Utf8(s) => {
                let t = s.trim();
                preferred
                    .and_then(|fmt| parse_with(t, fmt))
                    .or_else(|| detect_date_format(t).and_then(|fmt| parse_with(t, fmt)))
                    .map(Value::Date)
                    .unwrap_or(Value::Invalid(s))
            }
            other => Value::Invalid(other.to_string()),
        })
        .collect()
}

/// Best-effort parse of a single date/datetime string.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let t = input.trim();
    detect_date_format(t).and_then(|fmt| parse_with(t, fmt))
}

fn detect_date_format(s: &str) -> Option<DateFormat> {
    if s.is_empty() {
        return None;
    }
    if DateTime::parse_from_rfc3339(s).is_ok() {
        return Some(DateFormat::Rfc3339);
    }
    DATETIME_FORMATS
        .iter()
        .map(|f| DateFormat::DateTime(*f))
        .chain(DATE_FORMATS.iter().map(|f| DateFormat::Date(*f)))
        .chain(std::iter::once(DateFormat::Compact))
        .find(|fmt| parse_with(s, *fmt).is_some())
}

fn parse_with(s: &str, fmt: DateFormat) -> Option<NaiveDateTime> {
    match fmt {
        DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()),
        DateFormat::DateTime(f) => NaiveDateTime::parse_from_str(s, f).ok(),
        DateFormat::Date(f) => NaiveDate::parse_from_str(s, f)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN)),
        DateFormat::Compact => {
            if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let year = s[..4].parse().ok()?;
            let month = s[4..6].parse().ok()?;
            let day = s[6..].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
        }
    }
}

fn to_text(values: Vec<Value>) -> Vec<Value> {
    values
        .into_iter()
        .map(|v| match v {
            Value::Null | Value::Invalid(_) | Value::Utf8(_) => v,
            other => Value::Utf8(other.to_string()),
        })
        .collect()
}

fn raw_text(v: &Value) -> String {
    match v {
        Value::Utf8(s) | Value::Invalid(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{auto_detect, coerce_column, parse_date};
    use crate::rules::TargetType;
    use crate::types::{DataType, Value};

    fn utf8(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::Utf8((*s).to_string())).collect()
    }

    #[test]
    fn numeric_marks_unparseable_cells_invalid() {
        let (out, dt) = coerce_column(utf8(&["1", "2", "x"]), TargetType::Numeric);
        assert_eq!(dt, DataType::Int64);
        assert_eq!(
            out,
            vec![Value::Int64(1), Value::Int64(2), Value::Invalid("x".to_string())]
        );
    }

    #[test]
    fn numeric_promotes_to_float_when_any_value_is_fractional() {
        let mut input = utf8(&[" 10 ", "2.5"]);
        input.push(Value::Null);
        let (out, dt) = coerce_column(input, TargetType::Numeric);
        assert_eq!(dt, DataType::Float64);
        assert_eq!(out, vec![Value::Float64(10.0), Value::Float64(2.5), Value::Null]);
    }

    #[test]
    fn auto_detect_leaves_mixed_columns_alone() {
        let input = utf8(&["1", "two", "3"]);
        let (out, dt) = auto_detect(input.clone(), DataType::Utf8);
        assert_eq!(dt, DataType::Utf8);
        assert_eq!(out, input);
    }

    #[test]
    fn auto_detect_adopts_fully_numeric_columns() {
        let mut input = utf8(&["1.5", "3"]);
        input.push(Value::Null);
        let (out, dt) = auto_detect(input, DataType::Utf8);
        assert_eq!(dt, DataType::Float64);
        assert_eq!(out, vec![Value::Float64(1.5), Value::Float64(3.0), Value::Null]);
    }

    #[test]
    fn auto_detect_ignores_all_missing_columns() {
        let (out, dt) = auto_detect(vec![Value::Null, Value::Null], DataType::Utf8);
        assert_eq!(dt, DataType::Utf8);
        assert_eq!(out, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn date_parses_mixed_formats_and_marks_failures() {
        let (out, dt) = coerce_column(
            utf8(&["2024-01-05", "01/31/2024", "2024-02-01 08:30:00", "soon"]),
            TargetType::Date,
        );
        assert_eq!(dt, DataType::Date);
        let d = |y, m, day| {
            NaiveDate::from_ymd_opt(y, m, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        assert_eq!(out[0], Value::Date(d(2024, 1, 5)));
        assert_eq!(out[1], Value::Date(d(2024, 1, 31)));
        assert_eq!(
            out[2],
            Value::Date(
                NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap()
            )
        );
        assert_eq!(out[3], Value::Invalid("soon".to_string()));
    }

    #[test]
    fn parse_date_accepts_rfc3339_and_month_names() {
        assert!(parse_date("2024-03-01T12:00:00Z").is_some());
        assert_eq!(
            parse_date("5 Mar 2024").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_date("20240229").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_date("20241301").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn text_stringifies_present_values() {
        let (out, dt) = coerce_column(
            vec![Value::Int64(7), Value::Null, Value::Float64(1.5)],
            TargetType::Text,
        );
        assert_eq!(dt, DataType::Utf8);
        assert_eq!(
            out,
            vec![Value::Utf8("7".to_string()), Value::Null, Value::Utf8("1.5".to_string())]
        );
    }
}
