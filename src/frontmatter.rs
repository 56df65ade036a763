//! Front matter splitting and parsing.
//!
//! A content file starts with a YAML header fenced by `---` lines:
//!
//! ```text
//! ---
//! layout: post
//! title: "EKS Ingress"
//! date: 2024-03-15 10:30:00 +0900
//! tags: [kubernetes, aws]
//! series: EKS Deep Dive
//! series_part: 1.2
//! ---
//! Markdown body…
//! ```
//!
//! The header is read into the fixed [`FrontMatter`] schema. Unknown keys are
//! ignored so older posts with extra keys keep building, but every recognised
//! key must have the right type.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use thiserror::Error;

/// Why a header could not be turned into document metadata.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataProblem {
    #[error("missing front matter header (file must start with '---')")]
    MissingHeader,
    #[error("front matter header is not closed with '---'")]
    UnterminatedHeader,
    #[error("invalid YAML: {0}")]
    InvalidYaml(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value for `{field}`: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Recognised front matter keys.
#[derive(Debug, Default, Deserialize)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub tags: Option<StringList>,
    /// Legacy alternative to `tags`; merged into them.
    pub categories: Option<StringList>,
    pub series: Option<String>,
    pub series_part: Option<f64>,
    pub permalink: Option<String>,
    pub description: Option<String>,
    /// `published: false` keeps a file out of the build.
    pub published: Option<bool>,
}

/// A YAML list of scalars, or a single whitespace-separated scalar.
///
/// Numbers and booleans are kept as written (`tags: [kubernetes, 1.29]`).
#[derive(Debug, Clone, PartialEq)]
pub enum StringList {
    List(Vec<String>),
    Words(String),
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let not_scalar = || D::Error::custom("expected a string, number, or list of them");
        match Value::deserialize(deserializer)? {
            Value::Sequence(items) => items
                .into_iter()
                .map(scalar_to_string)
                .collect::<Option<Vec<_>>>()
                .map(StringList::List)
                .ok_or_else(not_scalar),
            other => scalar_to_string(other)
                .map(StringList::Words)
                .ok_or_else(not_scalar),
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringList::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringList::Words(s) => s.split_whitespace().map(String::from).collect(),
        }
    }
}

/// Split a file into its raw YAML header and the Markdown body.
///
/// The opening fence must be the very first line. The closing fence is the
/// next line that is exactly `---` or `...` (trailing whitespace allowed).
pub fn split(content: &str) -> Result<(&str, &str), MetadataProblem> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return Err(MetadataProblem::MissingHeader),
    }

    let header_start = content.find('\n').map(|i| i + 1).unwrap_or(content.len());
    let mut offset = header_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((header, body));
        }
        offset += line.len();
    }
    Err(MetadataProblem::UnterminatedHeader)
}

/// Parse a raw YAML header into [`FrontMatter`].
///
/// An empty header is valid and yields all-`None` fields; required-field
/// checks happen in the scan stage, which knows about filename fallbacks.
pub fn parse(header: &str) -> Result<FrontMatter, MetadataProblem> {
    if header.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(header).map_err(|e| MetadataProblem::InvalidYaml(e.to_string()))
}

/// Parse a front matter `date` value.
///
/// Accepted forms, values without an offset are taken as UTC:
/// - `2024-03-15`
/// - `2024-03-15 10:30`
/// - `2024-03-15 10:30:00`
/// - `2024-03-15 10:30:00 +0900`
/// - `2024-03-15T10:30:00+09:00` (RFC 3339)
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, MetadataProblem> {
    let value = value.trim();
    let invalid = || MetadataProblem::InvalidField {
        field: "date",
        value: value.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt);
    }
    let utc = FixedOffset::east_opt(0).ok_or_else(invalid)?;
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return naive.and_local_timezone(utc).single().ok_or_else(invalid);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return midnight_utc(date).ok_or_else(invalid);
    }
    Err(invalid())
}

/// Midnight UTC on the given day, used for filename-derived dates.
pub fn midnight_utc(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single()
}
