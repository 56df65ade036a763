//! Shared types used across the pipeline.
//!
//! [`Document`] is produced by the scan stage and read by every emitter.
//! [`SearchIndexEntry`] is the only shape that leaves the build for the
//! browser, so it is also what the search widget deserializes.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One content file after front matter parsing and Markdown rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Source path relative to the content root, without extension.
    pub id: String,
    /// Source path relative to the content root, as written on disk.
    pub source_path: String,
    /// Layout name from front matter, or the directory default.
    pub layout: String,
    pub title: String,
    pub publish_date: DateTime<FixedOffset>,
    /// Deduplicated case-insensitively, original spelling kept.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_part: Option<SeriesPart>,
    /// URL path, always starting with `/`.
    pub permalink: String,
    /// Summary from front matter, if the author wrote one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub body_markdown: String,
    #[serde(skip)]
    pub rendered_html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toc: Vec<TocEntry>,
    /// Plain-text preview of the rendered body.
    pub excerpt: String,
}

impl Document {
    /// Projection shipped to the client. Nothing else leaves the build.
    pub fn search_entry(&self) -> SearchIndexEntry {
        SearchIndexEntry {
            title: self.title.clone(),
            url: self.permalink.clone(),
            tags: self.tags.clone(),
            excerpt: self.excerpt.clone(),
            date: self.publish_date.to_rfc3339(),
        }
    }

    pub fn is_post(&self) -> bool {
        self.layout == "post"
    }
}

/// Position of a document within its series.
///
/// Fractional values are allowed so a part can be slotted between two
/// existing ones (`1.2` between `1.1` and `1.3`). Ordering is total.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct SeriesPart(pub f64);

impl PartialEq for SeriesPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SeriesPart {}

impl PartialOrd for SeriesPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SeriesPart {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SeriesPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A heading collected for the table of contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Anchor id assigned to the heading element.
    pub id: String,
    /// Plain heading text.
    pub text: String,
}

/// Client-visible projection of a [`Document`].
///
/// Field names are the wire format of `search.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchIndexEntry {
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    /// RFC 3339 publish date.
    pub date: String,
}
