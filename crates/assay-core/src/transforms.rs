//! Small deterministic transforms: weekday counting, JSON array sorting, and
//! `key=value` to JSON conversion

use std::cmp::Ordering;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::{Map, Value};
use tracing::info;

use crate::encoding;
use crate::error::{Error, Result};

/// Number of `weekday`s in `start..=end`
pub fn count_weekdays(weekday: Weekday, start: NaiveDate, end: NaiveDate) -> u64 {
    if end < start {
        return 0;
    }
    let span = (end - start).num_days() as u64 + 1;
    let full_weeks = span / 7;
    let remainder = span % 7;

    // Days left over after whole weeks, starting from `start`'s weekday
    let offset = (7 + weekday.num_days_from_monday() - start.weekday().num_days_from_monday()) % 7;
    full_weeks + u64::from(u64::from(offset) < remainder)
}

/// Sort a JSON array of objects by `primary`, then `secondary`; returns compact JSON
pub fn sort_json_array(array: &str, primary: &str, secondary: Option<&str>) -> Result<String> {
    let value: Value = serde_json::from_str(array)
        .map_err(|e| Error::Parse(format!("Could not parse JSON array: {}", e)))?;
    let Value::Array(mut items) = value else {
        return Err(Error::Parse("Expected a JSON array".into()));
    };
    if let Some(pos) = items.iter().position(|item| !item.is_object()) {
        return Err(Error::Parse(format!(
            "Element {} of the array is not an object",
            pos
        )));
    }

    items.sort_by(|a, b| {
        compare_field(a, b, primary).then_with(|| match secondary {
            Some(key) => compare_field(a, b, key),
            None => Ordering::Equal,
        })
    });

    info!(items = items.len(), primary, secondary, "Sorted JSON array");
    Ok(serde_json::to_string(&Value::Array(items))?)
}

fn compare_field(a: &Value, b: &Value, key: &str) -> Ordering {
    compare_values(a.get(key).unwrap_or(&Value::Null), b.get(key).unwrap_or(&Value::Null))
}

/// Null < booleans < numbers < strings < everything else (by JSON text)
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Read `key=value` lines into one JSON object, preserving file order
///
/// Blank lines are skipped; a later duplicate key overwrites the earlier value.
pub fn key_values_to_json(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path)?;
    let decoded = encoding::decode(&bytes)?;

    let mut object = Map::new();
    for (lineno, line) in decoded.text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::Parse(format!("Line {} is not key=value: {}", lineno + 1, line))
        })?;
        object.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }

    info!(keys = object.len(), "Converted key=value file to JSON");
    Ok(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn brute_force(weekday: Weekday, start: NaiveDate, end: NaiveDate) -> u64 {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| d.weekday() == weekday)
            .count() as u64
    }

    #[test]
    fn test_count_weekdays_single_week() {
        // 2024-01-01 is a Monday
        assert_eq!(count_weekdays(Weekday::Mon, date(2024, 1, 1), date(2024, 1, 7)), 1);
        assert_eq!(count_weekdays(Weekday::Mon, date(2024, 1, 2), date(2024, 1, 7)), 0);
        assert_eq!(count_weekdays(Weekday::Wed, date(2024, 1, 3), date(2024, 1, 3)), 1);
    }

    #[test]
    fn test_count_weekdays_matches_day_by_day_count() {
        let start = date(1981, 3, 3);
        let end = date(2012, 12, 30);
        for weekday in [Weekday::Mon, Weekday::Wed, Weekday::Sun] {
            assert_eq!(
                count_weekdays(weekday, start, end),
                brute_force(weekday, start, end)
            );
        }
    }

    #[test]
    fn test_count_weekdays_reversed_range() {
        assert_eq!(count_weekdays(Weekday::Mon, date(2024, 2, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_sort_json_with_tie_break() {
        let sorted = sort_json_array(
            r#"[{"name":"Zed","age":30},{"name":"Amy","age":30},{"name":"Bob","age":5}]"#,
            "age",
            Some("name"),
        )
        .unwrap();
        assert_eq!(
            sorted,
            r#"[{"name":"Bob","age":5},{"name":"Amy","age":30},{"name":"Zed","age":30}]"#
        );
    }

    #[test]
    fn test_sort_json_is_stable_without_tie_break() {
        let sorted = sort_json_array(r#"[{"k":2,"i":0},{"k":1,"i":1},{"k":2,"i":2}]"#, "k", None)
            .unwrap();
        assert_eq!(sorted, r#"[{"k":1,"i":1},{"k":2,"i":0},{"k":2,"i":2}]"#);
    }

    #[test]
    fn test_sort_json_missing_field_sorts_first() {
        let sorted = sort_json_array(r#"[{"a":1},{"b":2}]"#, "a", None).unwrap();
        assert_eq!(sorted, r#"[{"b":2},{"a":1}]"#);
    }

    #[test]
    fn test_sort_json_rejects_bad_input() {
        assert!(matches!(
            sort_json_array("[{", "a", None).unwrap_err(),
            Error::Parse(_)
        ));
        assert!(matches!(
            sort_json_array("[1, 2]", "a", None).unwrap_err(),
            Error::Parse(_)
        ));
    }

    #[test]
    fn test_key_values_to_json_keeps_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pairs.txt");
        std::fs::write(&path, "zeta=1\nalpha = two\n\nurl=http://x?a=b\n").unwrap();

        let value = key_values_to_json(&path).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"zeta":"1","alpha":"two","url":"http://x?a=b"}"#
        );
    }

    #[test]
    fn test_key_values_rejects_malformed_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pairs.txt");
        std::fs::write(&path, "a=1\nnot a pair\n").unwrap();
        let err = key_values_to_json(&path).unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }
}
