//! Shared test utilities for the simple-blog test suite.
//!
//! Provides fixture setup, lookup helpers, bulk extractors, and an in-memory
//! document builder for tests that need a [`Site`] without touching disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let site = scan(tmp.path()).unwrap();
//! let doc = find_document(&site, "_posts/2024-03-15-eks-ingress");
//! assert_eq!(doc.series_part, Some(SeriesPart(1.1)));
//!
//! let site = site_from(vec![
//!     doc("eks-1", "2024-03-15").series("EKS Deep Dive", 1.1),
//!     doc("pod-identity", "2024-04-01").tags(&["aws"]),
//! ]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::frontmatter::parse_date;
use crate::scan::assemble;
use crate::site::Site;
use crate::types::{Document, SeriesPart};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Site lookups: panic with a clear message on miss
// =========================================================================

/// Find a document by id (source path without extension). Panics if not found.
pub fn find_document<'a>(site: &'a Site, id: &str) -> &'a Document {
    site.documents
        .iter()
        .find(|d| d.id == id)
        .unwrap_or_else(|| {
            let ids = document_ids(site);
            panic!("document '{id}' not found. Available: {ids:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All document ids in site order (newest first).
pub fn document_ids(site: &Site) -> Vec<&str> {
    site.documents.iter().map(|d| d.id.as_str()).collect()
}

/// All tag display names in key order.
pub fn tag_names(site: &Site) -> Vec<&str> {
    site.tags.iter().map(|t| t.name.as_str()).collect()
}

// =========================================================================
// In-memory documents
// =========================================================================

/// Builder for a [`Document`] with sensible defaults: a post titled after
/// its id, permalink `/<id>/`, no tags.
pub struct DocBuilder(Document);

pub fn doc(id: &str, date: &str) -> DocBuilder {
    DocBuilder(Document {
        id: id.to_string(),
        source_path: format!("{id}.md"),
        layout: "post".to_string(),
        title: id.to_string(),
        publish_date: parse_date(date).unwrap(),
        tags: Vec::new(),
        series: None,
        series_part: None,
        permalink: format!("/{id}/"),
        description: None,
        body_markdown: String::new(),
        rendered_html: format!("<p>{id}</p>\n"),
        toc: Vec::new(),
        excerpt: id.to_string(),
    })
}

impl DocBuilder {
    pub fn title(mut self, title: &str) -> Self {
        self.0.title = title.to_string();
        self
    }

    pub fn layout(mut self, layout: &str) -> Self {
        self.0.layout = layout.to_string();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.0.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn series(mut self, name: &str, part: f64) -> Self {
        self.0.series = Some(name.to_string());
        self.0.series_part = Some(SeriesPart(part));
        self
    }

    pub fn permalink(mut self, permalink: &str) -> Self {
        self.0.permalink = permalink.to_string();
        self
    }

    pub fn excerpt(mut self, excerpt: &str) -> Self {
        self.0.excerpt = excerpt.to_string();
        self
    }

    pub fn build(self) -> Document {
        self.0
    }
}

/// Assemble a site from builders with the default config. Panics on
/// duplicate permalinks or series parts.
pub fn site_from(docs: Vec<DocBuilder>) -> Site {
    site_with_config(SiteConfig::default(), docs)
}

pub fn site_with_config(config: SiteConfig, docs: Vec<DocBuilder>) -> Site {
    let documents = docs.into_iter().map(DocBuilder::build).collect();
    assemble(config, documents).unwrap()
}
