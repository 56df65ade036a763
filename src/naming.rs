//! Centralized filename parsing for the `YYYY-MM-DD-slug` convention.
//!
//! Posts carry their publish date in the filename, pages usually don't. Both
//! go through [`parse_entry_name`] so slugs and fallback dates are derived the
//! same way everywhere:
//!
//! - `2024-03-15-eks-ingress` → date 2024-03-15, slug `eks-ingress`
//! - `about` → no date, slug `about`
//! - `2024-03-15` → date 2024-03-15, empty slug
//!
//! ## Slugs for generated pages
//!
//! Tag and series listing pages need URL-safe names derived from free text.
//! [`slugify`] lowercases, keeps alphanumerics, and collapses everything else
//! into single dashes.

use chrono::NaiveDate;

/// Result of parsing a content filename stem like `2024-03-15-eks-ingress`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present (e.g. `2024-03-15`)
    pub date: Option<NaiveDate>,
    /// Part after the date prefix, dashes preserved. For undated entries,
    /// this is the full input.
    pub slug: String,
}

/// Parse a filename stem following the `YYYY-MM-DD-slug` convention.
///
/// The prefix only counts as a date when it is a real calendar date, so
/// `2024-13-40-oops` is treated as an undated slug.
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if stem.len() >= 10
        && stem.is_char_boundary(10)
        && let Ok(date) = NaiveDate::parse_from_str(&stem[..10], "%Y-%m-%d")
    {
        let rest = &stem[10..];
        if rest.is_empty() || rest.starts_with('-') {
            return ParsedName {
                date: Some(date),
                slug: rest.trim_start_matches('-').to_string(),
            };
        }
    }
    ParsedName {
        date: None,
        slug: stem.to_string(),
    }
}

/// Convert free text into a URL path segment.
///
/// - Lowercases everything
/// - Keeps alphanumeric characters (including non-ASCII letters)
/// - Replaces any other run of characters with one dash
/// - Strips leading and trailing dashes
///
/// Returns an empty string when nothing survives (e.g. `"++"`).
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
