//! Intent classification and parameter extraction
//!
//! Questions are matched against [`RULES`], an ordered list of keyword rules.
//! The first rule whose predicate holds decides the outcome; order matters because several rules share keywords
//! ("statistics" also appears in archive questions, "sum" in encoding ones).
//!
//! An extractor can:
//! - return `Ok(Some(dispatch))`: the rule fires
//! - return `Ok(None)`: the rule declines and the question goes straight to
//!   the fallback; later rules are not consulted
//! - return `Err(..)`: the rule fires but a required parameter is missing
//!
//! No match at all means the question goes to the LLM fallback.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{CurrencySymbol, HttpMethod, Operation, Question};

/// Column names recognized by the statistics rule, in precedence order
pub const STATISTICS_COLUMNS: [&str; 4] = ["sales", "revenue", "profit", "income"];

/// The engine to run and its typed parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum Dispatch {
    /// Read one column of the CSV inside an uploaded ZIP
    ArchiveColumn { column: String },
    /// Sum currency-tagged amounts across mixed-encoding archive members
    EncodedTotal { symbols: BTreeSet<CurrencySymbol> },
    /// Column statistics over a CSV (plain or zipped)
    ColumnStatistics {
        operation: Option<Operation>,
        column: Option<String>,
    },
    /// HTTP request to a URL taken from the question
    ApiRequest { url: String, method: HttpMethod },
    /// Shell command quoted in the question
    ShellCommand { command: String },
    /// Canonical-form SHA-256 of the uploaded file
    FormattedChecksum,
    /// Count one weekday in an inclusive date range
    WeekdayCount {
        weekday: Weekday,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Sort a JSON array of objects embedded in the question
    JsonSort {
        array: String,
        primary: String,
        secondary: Option<String>,
    },
    /// Turn an uploaded `key=value` file into a JSON object
    KeyValueJson,
}

impl Dispatch {
    /// Stable engine name, used in logs and CLI output
    pub fn engine(&self) -> &'static str {
        match self {
            Dispatch::ArchiveColumn { .. } => "archive_column",
            Dispatch::EncodedTotal { .. } => "encoded_total",
            Dispatch::ColumnStatistics { .. } => "column_statistics",
            Dispatch::ApiRequest { .. } => "api_request",
            Dispatch::ShellCommand { .. } => "shell_command",
            Dispatch::FormattedChecksum => "formatted_checksum",
            Dispatch::WeekdayCount { .. } => "weekday_count",
            Dispatch::JsonSort { .. } => "json_sort",
            Dispatch::KeyValueJson => "key_value_json",
        }
    }

    /// Whether the engine reads the uploaded file
    pub fn needs_file(&self) -> bool {
        matches!(
            self,
            Dispatch::ArchiveColumn { .. }
                | Dispatch::EncodedTotal { .. }
                | Dispatch::ColumnStatistics { .. }
                | Dispatch::FormattedChecksum
                | Dispatch::KeyValueJson
        )
    }
}

/// One entry of the ordered rule list
pub struct IntentRule {
    pub name: &'static str,
    pub matches: fn(&Question) -> bool,
    pub extract: fn(&Question) -> Result<Option<Dispatch>>,
}

impl std::fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRule").field("name", &self.name).finish()
    }
}

/// Rules in priority order; first match wins
pub const RULES: &[IntentRule] = &[
    IntentRule {
        name: "csv_in_zip",
        matches: |q| q.mentions("csv") && q.mentions("zip") && q.mentions("answer column"),
        extract: |_| {
            Ok(Some(Dispatch::ArchiveColumn {
                column: "answer".to_string(),
            }))
        },
    },
    IntentRule {
        name: "multi_encoding_sum",
        matches: |q| q.mentions("encodings") && (q.mentions("sum") || q.mentions("total")),
        extract: |q| {
            Ok(Some(Dispatch::EncodedTotal {
                symbols: extract_symbols(q),
            }))
        },
    },
    IntentRule {
        name: "column_statistics",
        matches: |q| q.mentions("statistics") || (q.mentions("calculate") && q.mentions("csv")),
        extract: |q| {
            Ok(Some(Dispatch::ColumnStatistics {
                operation: extract_operation(q),
                column: extract_column(q),
            }))
        },
    },
    IntentRule {
        name: "api_request",
        matches: |q| q.mentions("api request"),
        extract: |q| {
            let url = extract_url(q).ok_or_else(|| {
                Error::ParameterMissing("url (no token starting with http in the question)".into())
            })?;
            let method = if q.mentions("post") {
                HttpMethod::Post
            } else {
                HttpMethod::Get
            };
            Ok(Some(Dispatch::ApiRequest { url, method }))
        },
    },
    IntentRule {
        name: "shell_command",
        matches: |q| q.mentions("command") && q.mentions("execute"),
        extract: |q| Ok(extract_quoted(q)?.map(|command| Dispatch::ShellCommand { command })),
    },
    IntentRule {
        name: "prettier_sha256",
        matches: |q| q.mentions("prettier") && q.mentions("sha256"),
        extract: |_| Ok(Some(Dispatch::FormattedChecksum)),
    },
    IntentRule {
        name: "weekday_count",
        matches: |q| q.mentions("how many") && extract_weekday(q).is_some(),
        extract: extract_weekday_count,
    },
    IntentRule {
        name: "json_sort",
        matches: |q| {
            q.mentions("sort")
                && q.mentions("json")
                && q.raw().find('[').zip(q.raw().rfind(']')).map_or(false, |(a, b)| a < b)
        },
        extract: extract_json_sort,
    },
    IntentRule {
        name: "key_value_json",
        matches: |q| q.mentions("key=value") && q.mentions("json"),
        extract: |_| Ok(Some(Dispatch::KeyValueJson)),
    },
];

/// Classify a question; `Ok(None)` means no rule applies
pub fn classify(question: &Question) -> Result<Option<Dispatch>> {
    for rule in RULES {
        if !(rule.matches)(question) {
            continue;
        }
        match (rule.extract)(question)? {
            Some(dispatch) => {
                debug!(rule = rule.name, dispatch = ?dispatch, "Intent rule matched");
                return Ok(Some(dispatch));
            }
            None => {
                debug!(rule = rule.name, "Intent rule declined, using fallback");
                return Ok(None);
            }
        }
    }
    debug!("No intent rule matched");
    Ok(None)
}

/// Every known currency symbol that appears literally in the raw question
fn extract_symbols(question: &Question) -> BTreeSet<CurrencySymbol> {
    CurrencySymbol::ALL
        .into_iter()
        .filter(|s| question.raw().contains(s.as_char()))
        .collect()
}

fn extract_operation(question: &Question) -> Option<Operation> {
    Operation::PRECEDENCE
        .into_iter()
        .find(|op| question.mentions(op.as_str()))
}

fn extract_column(question: &Question) -> Option<String> {
    STATISTICS_COLUMNS
        .iter()
        .find(|c| question.mentions(c))
        .map(|c| c.to_string())
}

/// First whitespace-delimited token starting with "http", minus trailing
/// sentence punctuation
fn extract_url(question: &Question) -> Option<String> {
    question
        .raw()
        .split_whitespace()
        .find(|word| word.starts_with("http"))
        .map(|word| {
            word.trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | ')' | '\'' | '"' | '>'))
                .to_string()
        })
        .filter(|url| !url.is_empty())
}

/// First segment enclosed in backticks or single/double quotes
fn extract_quoted(question: &Question) -> Result<Option<String>> {
    let re = Regex::new(r#"[`'"]([^`'"]+)[`'"]"#)?;
    Ok(re
        .captures(question.raw())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty()))
}

fn extract_weekday(question: &Question) -> Option<Weekday> {
    const PLURALS: [(&str, Weekday); 7] = [
        ("mondays", Weekday::Mon),
        ("tuesdays", Weekday::Tue),
        ("wednesdays", Weekday::Wed),
        ("thursdays", Weekday::Thu),
        ("fridays", Weekday::Fri),
        ("saturdays", Weekday::Sat),
        ("sundays", Weekday::Sun),
    ];
    PLURALS
        .into_iter()
        .find(|(name, _)| question.mentions(name))
        .map(|(_, day)| day)
}

fn extract_weekday_count(question: &Question) -> Result<Option<Dispatch>> {
    let Some(weekday) = extract_weekday(question) else {
        return Ok(None);
    };

    let re = Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b")?;
    let dates = re
        .captures_iter(question.raw())
        .take(2)
        .map(|c| {
            let text = &c[1];
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|e| Error::Parse(format!("Invalid date '{}': {}", text, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    match dates.as_slice() {
        [a, b] => Ok(Some(Dispatch::WeekdayCount {
            weekday,
            start: *a.min(b),
            end: *a.max(b),
        })),
        _ => Err(Error::ParameterMissing(
            "date range (two YYYY-MM-DD dates)".into(),
        )),
    }
}

fn extract_json_sort(question: &Question) -> Result<Option<Dispatch>> {
    let raw = question.raw();
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return Ok(None);
    };
    let array = raw[start..=end].to_string();

    let primary_re = Regex::new(r"(?i)\bby (?:the value of )?the (\w+) field")?;
    let tie_re = Regex::new(r"(?i)\btie,?\s+sort by (?:the value of )?the (\w+) field")?;

    let primary = primary_re
        .captures(raw)
        .map(|c| c[1].to_string())
        .ok_or_else(|| Error::ParameterMissing("sort field".into()))?;
    let secondary = tie_re
        .captures(raw)
        .map(|c| c[1].to_string())
        .filter(|s| *s != primary);

    Ok(Some(Dispatch::JsonSort {
        array,
        primary,
        secondary,
    }))
}
