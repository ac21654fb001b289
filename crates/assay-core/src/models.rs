//! Data models for Assay

use serde::{Serialize, Serializer};

use crate::error::Error;

/// A question as received, plus its lower-cased form used for keyword matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    raw: String,
    normalized: String,
}

impl Question {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// Original text, used for symbols, URLs, and quoted commands
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased text, used for keyword predicates
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Case-insensitive substring test
    pub fn mentions(&self, keyword: &str) -> bool {
        self.normalized.contains(keyword)
    }
}

/// Currency symbols recognized in questions and data files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurrencySymbol {
    Rupee,
    Dollar,
    Euro,
    Pound,
    Yen,
}

impl CurrencySymbol {
    pub const ALL: [CurrencySymbol; 5] = [
        CurrencySymbol::Rupee,
        CurrencySymbol::Dollar,
        CurrencySymbol::Euro,
        CurrencySymbol::Pound,
        CurrencySymbol::Yen,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Self::Rupee => '₹',
            Self::Dollar => '$',
            Self::Euro => '€',
            Self::Pound => '£',
            Self::Yen => '¥',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_char() == c)
    }

    /// First recognized symbol in a piece of text
    pub fn find_in(text: &str) -> Option<Self> {
        text.chars().find_map(Self::from_char)
    }
}

impl Serialize for CurrencySymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::fmt::Display for CurrencySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Column statistics operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sum,
    Average,
    Median,
    Max,
    Min,
}

impl Operation {
    /// Detection precedence: "sum" is checked before the others
    pub const PRECEDENCE: [Operation; 5] = [
        Operation::Sum,
        Operation::Average,
        Operation::Median,
        Operation::Max,
        Operation::Min,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Median => "median",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" | "total" => Ok(Self::Sum),
            "average" | "mean" | "avg" => Ok(Self::Average),
            "median" => Ok(Self::Median),
            "max" | "maximum" => Ok(Self::Max),
            "min" | "minimum" => Ok(Self::Min),
            _ => Err(Error::Computation(format!("Unknown operation: {}", s))),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP method for the API request engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value returned to the caller as `{"answer": ...}`
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Json(serde_json::Value),
}

impl Answer {
    /// JSON form of the answer; integral numbers become JSON integers
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Answer::Text(s) => serde_json::Value::String(s.clone()),
            Answer::Number(n) => number_to_json(*n),
            Answer::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            Answer::Json(v) => v.clone(),
        }
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Text(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Response body for the answer endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: Answer,
}

fn number_to_json(n: f64) -> serde_json::Value {
    // i64 range check keeps the cast exact
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}
