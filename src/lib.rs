//! # Simple Blog
//!
//! A static site generator for technology blogs. Markdown files with YAML
//! front matter become a navigable HTML site, an RSS feed, and a single JSON
//! search index queried in the browser by a small embedded widget.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/  →  Site              (filesystem → documents, series, tags)
//! 2. Generate  Site      →  dist/             (HTML, search.json, feed.xml, assets)
//! ```
//!
//! The [`site::Site`] produced by the scan stage is plain data: it serializes
//! to `manifest.json` (`simple-blog scan`) for inspection, and every emitter
//! reads it without touching the content directory again. Emitters are pure
//! functions of the site, so two builds of unchanged content are
//! byte-identical.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the content directory, parses documents, groups series and tags |
//! | [`generate`] | Stage 2: renders HTML with Maud into a staging dir, then swaps it into place |
//! | [`frontmatter`] | YAML header splitting and the fixed front matter schema |
//! | [`markdown`] | pulldown-cmark rendering with heading anchors, TOC, and plain text |
//! | [`naming`] | `YYYY-MM-DD-slug` filename parser and [`naming::slugify`] |
//! | [`site`] | The scanned site: documents plus series and tag indexes |
//! | [`types`] | `Document`, `SeriesPart`, `TocEntry`, `SearchIndexEntry` |
//! | [`config`] | `config.toml` loading over stock defaults, validation, color CSS |
//! | [`search_index`] | Projection of documents into the JSON search index |
//! | [`search`] | Reference search algorithm and the widget state machine |
//! | [`feed`] | RSS 2.0 feed of the newest posts |
//! | [`serve`] | Development server (`tiny_http`) |
//! | [`watch`] | Debounced rebuild on content changes (`notify`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fail Fast on Bad Metadata
//!
//! A missing title, an unparseable date, two series members claiming the same
//! part, or two documents claiming the same permalink stop the build with an
//! error naming the offending file(s). Nothing is written: the generator
//! renders into a staging directory and only replaces the published output
//! once every file is in place.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Malformed markup
//! is a compile error, all interpolation is escaped, and there is no template
//! directory to ship. Rendered Markdown is the only pre-escaped input.
//!
//! ## One Search Algorithm, Two Implementations
//!
//! The browser widget (`static/search.js`) and [`search`] implement the same
//! case-insensitive substring match with title, then tag, then excerpt
//! ranking. The Rust side backs `simple-blog search` and pins the behavior
//! down in tests. The widget fetches the index at most once per page and
//! drops loads that complete after the page is torn down.
//!
//! ## Build-Time Presentation
//!
//! Heading anchors and the table of contents are computed while rendering
//! Markdown, and series navigation is resolved from the site indexes. The
//! only script a reader downloads is the search widget.

pub mod config;
pub mod feed;
pub mod frontmatter;
pub mod generate;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod scan;
pub mod search;
pub mod search_index;
pub mod serve;
pub mod site;
pub mod types;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
