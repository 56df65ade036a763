//! The site context handed from the scan stage to every emitter.
//!
//! A [`Site`] owns the documents and two derived indexes over them: series
//! groups and tag groups. Groups refer to documents by index into
//! [`Site::documents`], so there is exactly one copy of each document and
//! renderers never need global state to resolve "the other posts in this
//! series" or "everything tagged aws".
//!
//! Ordering guarantees, relied on by the renderer and the search index:
//!
//! - `documents`: publish date descending, permalink ascending on ties
//! - `series`: by name; members by `series_part` ascending
//! - `tags`: by lowercase key; members in `documents` order

use crate::config::SiteConfig;
use crate::types::Document;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Site {
    pub config: SiteConfig,
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagGroup>,
}

/// Documents sharing a `series` value.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    /// URL segment under `/series/`, unique across series.
    pub slug: String,
    /// Indexes into [`Site::documents`], ordered by part.
    pub members: Vec<usize>,
}

/// Documents sharing a tag, matched case-insensitively.
#[derive(Debug, Clone, Serialize)]
pub struct TagGroup {
    /// Display spelling, taken from the newest document using the tag.
    pub name: String,
    /// Lowercased tag, the grouping key.
    pub key: String,
    /// URL segment under `/tags/`, unique across tags.
    pub slug: String,
    pub members: Vec<usize>,
}

/// Where a document sits within its series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesNav<'a> {
    pub series: &'a Series,
    /// 1-based position.
    pub position: usize,
    pub total: usize,
    pub previous: Option<&'a Document>,
    pub next: Option<&'a Document>,
}

impl Site {
    /// Documents with the `post` layout, newest first.
    pub fn posts(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| d.is_post())
    }

    pub fn series_members<'a>(&'a self, series: &'a Series) -> impl Iterator<Item = &'a Document> {
        series.members.iter().map(|&i| &self.documents[i])
    }

    pub fn tag_members<'a>(&'a self, tag: &'a TagGroup) -> impl Iterator<Item = &'a Document> {
        tag.members.iter().map(|&i| &self.documents[i])
    }

    /// Look up a tag group by any spelling of the tag.
    pub fn tag(&self, name: &str) -> Option<&TagGroup> {
        let key = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.key == key)
    }

    pub fn tag_url(&self, name: &str) -> Option<String> {
        self.tag(name).map(|t| format!("/tags/{}/", t.slug))
    }

    pub fn series_url(series: &Series) -> String {
        format!("/series/{}/", series.slug)
    }

    /// Previous/next links for the document at `index`, if it belongs to a
    /// series. Ends of the series have `None` on the open side.
    pub fn series_nav(&self, index: usize) -> Option<SeriesNav<'_>> {
        let name = self.documents.get(index)?.series.as_deref()?;
        let series = self.series.iter().find(|s| s.name == name)?;
        let pos = series.members.iter().position(|&m| m == index)?;

        Some(SeriesNav {
            series,
            position: pos + 1,
            total: series.members.len(),
            previous: pos
                .checked_sub(1)
                .and_then(|p| series.members.get(p))
                .map(|&i| &self.documents[i]),
            next: series.members.get(pos + 1).map(|&i| &self.documents[i]),
        })
    }

    pub fn find_by_permalink(&self, permalink: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.permalink == permalink)
    }
}
