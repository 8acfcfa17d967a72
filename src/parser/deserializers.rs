use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde_json::Value;

static BR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("BR_DATE: invalid pattern")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ].*)?$").expect("ISO_DATE: invalid pattern")
});

/// Spreadsheet serial → calendar date.
///
/// Serial 1 is 1900-01-01. Spreadsheets count a 29/02/1900 that never
/// existed, so every serial after 59 is shifted back one extra day.
/// The fractional (time of day) part is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let whole = serial.floor() as i64;
    let offset = if whole > 59 { whole - 2 } else { whole - 1 };
    NaiveDate::from_ymd_opt(1900, 1, 1)?.checked_add_signed(Duration::days(offset))
}

/// Parses "DD/MM/YYYY", "YYYY-MM-DD[...]" or a numeric serial written as text.
/// A time part after a space is ignored. Returns None for anything else.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.captures(trimmed) {
        let y = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let d = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    if let Some(caps) = BR_DATE.captures(date_part) {
        let d = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let y = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    // CSV exports lose the numeric cell type: "45352" is still a serial.
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(excel_serial_to_date)
}

/// Tolerant date parsing over a raw cell. Never fails: anything that is not
/// a recognisable date becomes None.
pub fn parse_flexible_date(raw: &Value) -> Option<NaiveDate> {
    match raw {
        Value::Number(n) => n.as_f64().and_then(excel_serial_to_date),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// "12" → Some(12), "3,5" → Some(3), "" → None, "n/a" → None
pub fn parse_opt_i32(s: &str) -> Option<i32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i32>()
        .ok()
        .or_else(|| {
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i32)
        })
}

/// Cell → trimmed text. Numbers keep their shortest representation
/// (an "OS" column is often numeric in the sheet).
pub fn cell_to_string(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn cell_to_opt_i32(raw: &Value) -> Option<i32> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i32)),
        Value::String(s) => parse_opt_i32(s),
        _ => None,
    }
}

/// True when the cell carries nothing (used to tell "empty" from "unparseable").
pub fn cell_is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_excel_serial_before_fake_leap_day() {
        assert_eq!(excel_serial_to_date(1.0), Some(ymd(1900, 1, 1)));
        assert_eq!(excel_serial_to_date(59.0), Some(ymd(1900, 2, 28)));
    }

    #[test]
    fn test_excel_serial_after_fake_leap_day() {
        assert_eq!(excel_serial_to_date(61.0), Some(ymd(1900, 3, 1)));
        assert_eq!(excel_serial_to_date(45352.0), Some(ymd(2024, 3, 1)));
        assert_eq!(excel_serial_to_date(45361.75), Some(ymd(2024, 3, 10)));
    }

    #[test]
    fn test_excel_serial_out_of_range() {
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_parse_br_date() {
        assert_eq!(parse_date_str("05/03/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_str("5/3/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_str(" 05/03/2024 14:30 "), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_date_str("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_str("2024-03-05T10:00:00"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_parse_numeric_string_as_serial() {
        assert_eq!(parse_date_str("45352"), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_parse_invalid_dates_are_none() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("   "), None);
        assert_eq!(parse_date_str("31/02/2024"), None);
        assert_eq!(parse_date_str("ontem"), None);
        assert_eq!(parse_date_str("2024/03/05"), None);
    }

    #[test]
    fn test_parse_flexible_date_cells() {
        assert_eq!(parse_flexible_date(&json!(45352)), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_flexible_date(&json!("01/03/2024")), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_flexible_date(&Value::Null), None);
        assert_eq!(parse_flexible_date(&json!(true)), None);
        assert_eq!(parse_flexible_date(&json!([1, 2])), None);
    }

    #[test]
    fn test_parse_opt_i32() {
        assert_eq!(parse_opt_i32(""), None);
        assert_eq!(parse_opt_i32("12"), Some(12));
        assert_eq!(parse_opt_i32("3,7"), Some(3));
        assert_eq!(parse_opt_i32("n/a"), None);
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!(123456)), "123456");
        assert_eq!(cell_to_string(&json!("  MODEM FIBRA ")), "MODEM FIBRA");
        assert_eq!(cell_to_string(&Value::Null), "");
    }

    #[test]
    fn test_cell_is_blank() {
        assert!(cell_is_blank(&Value::Null));
        assert!(cell_is_blank(&json!("  ")));
        assert!(!cell_is_blank(&json!(0)));
    }
}
