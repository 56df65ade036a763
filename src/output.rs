//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (post, page, series, tag) is its semantic identity:
//! positional index, date, and title. Source files and permalinks are
//! secondary context on indented lines, so the output reads as a content
//! inventory while still pointing back at the files.
//!
//! # Entity Display Contract
//!
//! 1. **Header line**: positional index + title (+ optional detail)
//! 2. **Context lines**: indented `Source:`, `URL:`, `Tags:`, etc.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Posts
//! 001 2024-04-01 Pod Identity
//!     Source: _posts/2024-04-01-pod-identity.md
//!     URL: /2024/04/01/pod-identity/
//!     Tags: aws, security
//!
//! Pages
//! 001 About
//!     Source: about.md
//!     URL: /about/
//!
//! Series
//! 001 EKS Deep Dive (3 parts)
//!     1.1 EKS Ingress
//!     1.2 EKS Ingress with TLS
//!
//! Tags
//!     aws (4), kubernetes (3), security (1)
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! 001 Pod Identity → 2024/04/01/pod-identity/index.html
//! ...
//! Generated 6 documents, 3 tag pages, 1 series page
//! Search index: 6 entries → search.json
//! Feed → feed.xml
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects, except that scan output checks which optional
//! files exist in the content root.

use crate::generate::{GenerateSummary, output_path_for};
use crate::search::{MatchField, SearchHit};
use crate::site::Site;
use crate::types::Document;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line for a document. Posts lead with their date.
///
/// ```text
/// 001 2024-04-01 Pod Identity
/// 001 About
/// ```
fn entity_header(index: usize, doc: &Document) -> String {
    if doc.is_post() {
        format!(
            "{} {} {}",
            format_index(index),
            doc.publish_date.format("%Y-%m-%d"),
            doc.title
        )
    } else {
        format!("{} {}", format_index(index), doc.title)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format scan stage output showing the discovered site structure.
pub fn format_scan_output(site: &Site, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    let (posts, pages): (Vec<&Document>, Vec<&Document>) =
        site.documents.iter().partition(|d| d.is_post());

    for (heading, docs) in [("Posts", &posts), ("Pages", &pages)] {
        if docs.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        for (i, doc) in docs.iter().enumerate() {
            lines.push(entity_header(i + 1, doc));
            lines.push(format!("{}Source: {}", indent(1), doc.source_path));
            lines.push(format!("{}URL: {}", indent(1), doc.permalink));
            if !doc.tags.is_empty() {
                lines.push(format!("{}Tags: {}", indent(1), doc.tags.join(", ")));
            }
        }
    }

    if !site.series.is_empty() {
        lines.push(String::new());
        lines.push("Series".to_string());
        for (i, series) in site.series.iter().enumerate() {
            lines.push(format!(
                "{} {} ({})",
                format_index(i + 1),
                series.name,
                plural(series.members.len(), "part", "parts")
            ));
            for doc in site.series_members(series) {
                let part = doc
                    .series_part
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                lines.push(format!("{}{} {}", indent(1), part, doc.title));
            }
        }
    }

    if !site.tags.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        let summary: Vec<String> = site
            .tags
            .iter()
            .map(|t| format!("{} ({})", t.name, t.members.len()))
            .collect();
        lines.push(format!("{}{}", indent(1), summary.join(", ")));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push(format!("{}config.toml", indent(1)));
    }
    if source_root.join(&site.config.assets_dir).is_dir() {
        lines.push(format!("{}{}/", indent(1), site.config.assets_dir));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(site: &Site, source_root: &Path) {
    for line in format_scan_output(site, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format generate stage output: every document with the file it became.
pub fn format_generate_output(site: &Site, summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec!["Home → index.html".to_string()];

    for (i, doc) in site
        .documents
        .iter()
        .filter(|d| d.permalink != "/")
        .enumerate()
    {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            doc.title,
            output_path_for(&doc.permalink).display()
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}",
        plural(summary.documents, "document", "documents"),
        plural(summary.tag_pages, "tag page", "tag pages"),
        plural(summary.series_pages, "series page", "series pages"),
    ));
    lines.push(format!(
        "Search index: {} → {}",
        plural(summary.search_entries, "entry", "entries"),
        site.config.search.index_path
    ));
    if summary.feed_written {
        lines.push(format!("Feed → {}", site.config.feed.path));
    }
    if summary.assets_copied > 0 {
        lines.push(format!(
            "Copied {} from {}/",
            plural(summary.assets_copied, "asset", "assets"),
            site.config.assets_dir
        ));
    }
    lines
}

pub fn print_generate_output(site: &Site, summary: &GenerateSummary) {
    for line in format_generate_output(site, summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check and search output
// ============================================================================

pub fn format_check_output(site: &Site) -> Vec<String> {
    vec![format!(
        "OK: {} ({}), {}, {}",
        plural(site.documents.len(), "document", "documents"),
        plural(site.posts().count(), "post", "posts"),
        plural(site.series.len(), "series", "series"),
        plural(site.tags.len(), "tag", "tags"),
    )]
}

pub fn print_check_output(site: &Site) {
    for line in format_check_output(site) {
        println!("{}", line);
    }
}

fn match_label(field: MatchField) -> &'static str {
    match field {
        MatchField::Title => "title",
        MatchField::Tag => "tag",
        MatchField::Excerpt => "excerpt",
    }
}

/// Format search hits, one entry per hit with the field it matched on.
///
/// ```text
/// 001 EKS Ingress [title]
///     /2024/03/15/eks-ingress/
/// ```
pub fn format_search_output(query: &str, hits: &[SearchHit]) -> Vec<String> {
    if hits.is_empty() {
        return vec![format!("No results for \"{}\"", query.trim())];
    }
    let mut lines = Vec::with_capacity(hits.len() * 2);
    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            hit.entry.title,
            match_label(hit.field)
        ));
        lines.push(format!("{}{}", indent(1), hit.entry.url));
    }
    lines
}

pub fn print_search_output(query: &str, hits: &[SearchHit]) {
    for line in format_search_output(query, hits) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
