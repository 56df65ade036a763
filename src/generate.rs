//! HTML site generation.
//!
//! Stage 2 of the build pipeline. Takes the scanned [`Site`] and writes the
//! final static site: one HTML file per document, the generated listing
//! pages, the search index, the feed, and the stylesheet and script.
//!
//! ## Generated Pages
//!
//! - **Documents** (`<permalink>`): posts and pages through their layout
//! - **Home page** (`/index.html`): optional `index.md` intro, then all posts
//!   newest first
//! - **Tag index** (`/tags/index.html`): every tag with its post count
//! - **Tag pages** (`/tags/<slug>/index.html`): documents carrying the tag
//! - **Series pages** (`/series/<slug>/index.html`): members in part order
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                         # Home page
//! ├── style.css                          # Stock CSS + config colors
//! ├── search.js                          # Search widget
//! ├── search.json                        # Search index
//! ├── feed.xml                           # RSS (when base_url is set)
//! ├── about/index.html                   # Page
//! ├── 2024/03/15/eks-ingress/index.html  # Post
//! ├── tags/
//! │   ├── index.html
//! │   └── aws/index.html
//! ├── series/
//! │   └── eks-deep-dive/index.html
//! └── assets/                            # Copied from the content root
//! ```
//!
//! ## Permalinks to files
//!
//! A permalink ending in `/` becomes `index.html` inside that directory
//! (`/a/b/` → `a/b/index.html`); anything else is written as-is
//! (`/a/b.html` → `a/b.html`). See [`output_path_for`].
//!
//! ## Publishing
//!
//! Everything is written into a staging directory next to the output
//! directory. Only when every file has been written is the staging directory
//! swapped into place, so a failed build leaves the previous site untouched.
//! Layouts are resolved for every document before anything is written.
//!
//! ## CSS and JavaScript
//!
//! Embedded at compile time and written as files:
//! - `static/style.css`: base styles (color variables injected from config)
//! - `static/search.js`: the client search widget
//!
//! Both are referenced with a `?v=<hash>` query string derived from their
//! contents, so browsers refetch them exactly when they change.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config;
use crate::feed::{self, FeedError};
use crate::search_index;
use crate::site::{Series, Site, TagGroup};
use crate::types::Document;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Unknown layout \"{layout}\" in {}", path.display())]
    UnknownLayout { path: PathBuf, layout: String },
    #[error("{path} is generated twice (permalink collides with a generated page or asset)")]
    OutputCollision { path: String },
    #[error("Unusable output directory {}: {reason}", path.display())]
    InvalidOutputDir { path: PathBuf, reason: &'static str },
}

/// Layouts a document can render through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Post,
    Page,
}

impl Layout {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "post" => Some(Layout::Post),
            "page" => Some(Layout::Page),
            _ => None,
        }
    }
}

/// What a build produced, for the CLI summary.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GenerateSummary {
    pub documents: usize,
    pub tag_pages: usize,
    pub series_pages: usize,
    pub search_entries: usize,
    pub feed_written: bool,
    pub assets_copied: usize,
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/search.js");

/// Hrefs of the embedded assets, cache-busted by content hash.
#[derive(Debug, Clone)]
struct Assets {
    css_href: String,
    js_href: String,
}

pub fn generate(
    site: &Site,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let layouts = resolve_layouts(site)?;
    check_output_dir(source_root, output_dir)?;

    let staging = sibling_dir(output_dir, "staging");
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let summary = match write_site(site, &layouts, source_root, &staging) {
        Ok(summary) => summary,
        Err(e) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
    };

    publish(&staging, output_dir)?;
    info!(output = %output_dir.display(), "site generated");
    Ok(summary)
}

/// Check every document's layout before writing anything.
pub fn resolve_layouts(site: &Site) -> Result<Vec<Layout>, GenerateError> {
    site.documents
        .iter()
        .map(|doc| {
            Layout::parse(&doc.layout).ok_or_else(|| GenerateError::UnknownLayout {
                path: PathBuf::from(&doc.source_path),
                layout: doc.layout.clone(),
            })
        })
        .collect()
}

/// The output directory is replaced wholesale on publish, so it needs a
/// name of its own to stage next to and must not hold the content.
fn check_output_dir(source_root: &Path, output_dir: &Path) -> Result<(), GenerateError> {
    let invalid = |reason| GenerateError::InvalidOutputDir {
        path: output_dir.to_path_buf(),
        reason,
    };
    if !matches!(output_dir.components().next_back(), Some(Component::Normal(_))) {
        return Err(invalid("must end in a directory name (not `.`, `..`, or `/`)"));
    }
    let output = output_dir
        .canonicalize()
        .or_else(|_| std::path::absolute(output_dir))?;
    let source = source_root
        .canonicalize()
        .or_else(|_| std::path::absolute(source_root))?;
    if source.starts_with(&output) {
        return Err(invalid("it contains the content directory"));
    }
    Ok(())
}

/// Output file for a permalink, relative to the output root.
pub fn output_path_for(permalink: &str) -> PathBuf {
    let trimmed = permalink.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        PathBuf::from(trimmed).join("index.html")
    } else {
        PathBuf::from(trimmed)
    }
}

fn sibling_dir(output_dir: &Path, suffix: &str) -> PathBuf {
    let name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "site".to_string());
    output_dir.with_file_name(format!(".{name}.{suffix}"))
}

/// Replace `output_dir` with `staging`.
fn publish(staging: &Path, output_dir: &Path) -> Result<(), GenerateError> {
    if let Some(parent) = output_dir.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let previous = sibling_dir(output_dir, "previous");
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    if output_dir.exists() {
        fs::rename(output_dir, &previous)?;
    }
    if let Err(e) = fs::rename(staging, output_dir) {
        // Put the old site back
        if previous.exists() {
            let _ = fs::rename(&previous, output_dir);
        }
        return Err(e.into());
    }
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    Ok(())
}

/// Tracks written files so a document can't silently overwrite a
/// generated page or another document.
struct Writer<'a> {
    root: &'a Path,
    written: BTreeSet<PathBuf>,
}

impl Writer<'_> {
    /// Claim `rel` and return its absolute path with parents created.
    fn claim(&mut self, rel: &Path) -> Result<PathBuf, GenerateError> {
        if !self.written.insert(rel.to_path_buf()) {
            return Err(GenerateError::OutputCollision {
                path: rel.to_string_lossy().to_string(),
            });
        }
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn write(&mut self, rel: PathBuf, contents: impl AsRef<[u8]>) -> Result<(), GenerateError> {
        let path = self.claim(&rel)?;
        fs::write(&path, contents)?;
        debug!(path = %rel.display(), "wrote");
        Ok(())
    }

    fn copy(&mut self, rel: PathBuf, src: &Path) -> Result<(), GenerateError> {
        let path = self.claim(&rel)?;
        fs::copy(src, &path)?;
        debug!(path = %rel.display(), "copied");
        Ok(())
    }
}

fn write_site(
    site: &Site,
    layouts: &[Layout],
    source_root: &Path,
    out: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let mut writer = Writer {
        root: out,
        written: BTreeSet::new(),
    };
    let mut summary = GenerateSummary::default();

    let css = format!(
        "{}\n\n{}",
        config::generate_color_css(&site.config.colors),
        CSS_STATIC
    );
    writer.write(PathBuf::from("style.css"), &css)?;
    writer.write(PathBuf::from("search.js"), JS)?;
    let assets = Assets {
        css_href: format!("/style.css?v={}", content_hash(css.as_bytes())),
        js_href: format!("/search.js?v={}", content_hash(JS.as_bytes())),
    };

    // A document at "/" is the home page intro rather than its own file
    let mut intro = None;
    for (index, (doc, layout)) in site.documents.iter().zip(layouts).enumerate() {
        if doc.permalink == "/" {
            intro = Some(doc);
            summary.documents += 1;
            continue;
        }
        let markup = match layout {
            Layout::Post => render_post(site, index, &assets),
            Layout::Page => render_page(site, doc, &assets),
        };
        writer.write(output_path_for(&doc.permalink), markup.into_string())?;
        summary.documents += 1;
    }

    writer.write(
        PathBuf::from("index.html"),
        render_index(site, intro, &assets).into_string(),
    )?;

    if !site.tags.is_empty() {
        writer.write(
            PathBuf::from("tags/index.html"),
            render_tags_index(site, &assets).into_string(),
        )?;
        for tag in &site.tags {
            writer.write(
                PathBuf::from("tags").join(&tag.slug).join("index.html"),
                render_tag_page(site, tag, &assets).into_string(),
            )?;
            summary.tag_pages += 1;
        }
    }

    for series in &site.series {
        writer.write(
            PathBuf::from("series").join(&series.slug).join("index.html"),
            render_series_page(site, series, &assets).into_string(),
        )?;
        summary.series_pages += 1;
    }

    let entries = search_index::build_entries(site);
    writer.write(
        PathBuf::from(&site.config.search.index_path),
        search_index::to_json(&entries)?,
    )?;
    summary.search_entries = entries.len();

    if let Some(xml) = feed::render(site)? {
        writer.write(PathBuf::from(&site.config.feed.path), xml)?;
        summary.feed_written = true;
    }

    summary.assets_copied = copy_assets(
        &mut writer,
        &source_root.join(&site.config.assets_dir),
        Path::new(&site.config.assets_dir),
    )?;

    Ok(summary)
}

/// First 10 hex characters of the SHA-256 of `bytes`.
fn content_hash(bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    digest[..10].to_string()
}

/// Copy the user assets directory through the writer, so assets and pages
/// can't overwrite each other. Symlinks inside it are skipped.
fn copy_assets(writer: &mut Writer<'_>, src: &Path, dest: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink in assets");
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        writer.copy(dest.join(rel), entry.path())?;
        copied += 1;
    }
    Ok(copied)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    site: &Site,
    title: &str,
    description: Option<&str>,
    assets: &Assets,
    content: Markup,
) -> Markup {
    let config = &site.config;
    let full_title = if title == config.title {
        title.to_string()
    } else {
        format!("{} · {}", title, config.title)
    };
    let description = description
        .filter(|d| !d.is_empty())
        .or(Some(config.description.as_str()).filter(|d| !d.is_empty()));
    let feed_href =
        (config.feed.enabled && !config.base_url.is_empty()).then(|| format!("/{}", config.feed.path));

    html! {
        (DOCTYPE)
        html lang=(config.language) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                @if let Some(desc) = description {
                    meta name="description" content=(desc);
                }
                link rel="stylesheet" href=(assets.css_href);
                @if let Some(href) = feed_href {
                    link rel="alternate" type="application/rss+xml" title=(config.title) href=(href);
                }
                script src=(assets.js_href) defer {}
            }
            body {
                (site_header(site))
                (content)
                (site_footer(site))
            }
        }
    }
}

/// Renders the site header with title, navigation, and search box
fn site_header(site: &Site) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site.config.title) }
            nav.site-nav {
                (render_nav(site))
            }
            (search_box(site))
        }
    }
}

/// Navigation: pages by title, then the tag index.
fn render_nav(site: &Site) -> Markup {
    let mut pages: Vec<&Document> = site
        .documents
        .iter()
        .filter(|d| !d.is_post() && d.permalink != "/")
        .collect();
    pages.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.permalink.cmp(&b.permalink)));

    html! {
        ul {
            @for page in pages {
                li { a href=(page.permalink) { (page.title) } }
            }
            @if !site.tags.is_empty() {
                li { a href="/tags/" { "Tags" } }
            }
        }
    }
}

/// Search widget mount point. `search.js` reads its settings from the
/// data attributes.
fn search_box(site: &Site) -> Markup {
    let search = &site.config.search;
    let placeholder = format!("Search (press {})", search.shortcut);
    html! {
        div.search
            role="search"
            data-index={ "/" (search.index_path) }
            data-max-results=(search.max_results)
            data-shortcut=(search.shortcut)
        {
            input.search-input type="search" placeholder=(placeholder)
                aria-label="Search posts" autocomplete="off";
            p.search-status aria-live="polite" hidden {}
            ol.search-results hidden {}
        }
    }
}

fn site_footer(site: &Site) -> Markup {
    html! {
        footer.site-footer {
            @if !site.config.author.is_empty() {
                span.author { (site.config.author) }
            }
            @if site.config.feed.enabled && !site.config.base_url.is_empty() {
                a href={ "/" (site.config.feed.path) } { "RSS" }
            }
        }
    }
}

fn display_date(doc: &Document) -> String {
    doc.publish_date.format("%B %-d, %Y").to_string()
}

fn date_tag(doc: &Document) -> Markup {
    html! {
        time datetime=(doc.publish_date.to_rfc3339()) { (display_date(doc)) }
    }
}

fn tag_links(site: &Site, tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.tags {
                @for tag in tags {
                    li {
                        @if let Some(url) = site.tag_url(tag) {
                            a.tag href=(url) { (tag) }
                        } @else {
                            span.tag { (tag) }
                        }
                    }
                }
            }
        }
    }
}

/// Post summaries for listing pages.
fn post_list<'a>(site: &Site, docs: impl Iterator<Item = &'a Document>) -> Markup {
    html! {
        ol.post-list {
            @for doc in docs {
                li.post-summary {
                    (date_tag(doc))
                    a.post-link href=(doc.permalink) { (doc.title) }
                    @if !doc.excerpt.is_empty() {
                        p.excerpt { (doc.excerpt) }
                    }
                    (tag_links(site, &doc.tags))
                }
            }
        }
    }
}

fn render_toc(doc: &Document) -> Markup {
    html! {
        @if doc.toc.len() >= 2 {
            nav.toc aria-label="Table of contents" {
                h2 { "Contents" }
                ol {
                    @for entry in &doc.toc {
                        li class={ "toc-h" (entry.level) } {
                            a href={ "#" (entry.id) } { (entry.text) }
                        }
                    }
                }
            }
        }
    }
}

fn render_series_box(site: &Site, index: usize) -> Markup {
    let Some(nav) = site.series_nav(index) else {
        return html! {};
    };
    html! {
        aside.series-nav {
            p {
                "Part " (nav.position) " of " (nav.total) " in "
                a href=(Site::series_url(nav.series)) { (nav.series.name) }
            }
            div.series-links {
                @if let Some(prev) = nav.previous {
                    a.series-prev rel="prev" href=(prev.permalink) { "← " (prev.title) }
                }
                @if let Some(next) = nav.next {
                    a.series-next rel="next" href=(next.permalink) { (next.title) " →" }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a post with date, tags, series navigation, and table of contents
fn render_post(site: &Site, index: usize, assets: &Assets) -> Markup {
    let doc = &site.documents[index];
    let content = html! {
        main.post-page {
            article.post {
                header.post-header {
                    h1 { (doc.title) }
                    p.post-meta { (date_tag(doc)) }
                    (tag_links(site, &doc.tags))
                }
                (render_series_box(site, index))
                (render_toc(doc))
                div.post-body {
                    (PreEscaped(&doc.rendered_html))
                }
            }
        }
    };
    base_document(
        site,
        &doc.title,
        doc.description.as_deref().or(Some(doc.excerpt.as_str())),
        assets,
        content,
    )
}

fn render_page(site: &Site, doc: &Document, assets: &Assets) -> Markup {
    let content = html! {
        main.page {
            article {
                h1 { (doc.title) }
                (render_toc(doc))
                div.page-body {
                    (PreEscaped(&doc.rendered_html))
                }
            }
        }
    };
    base_document(site, &doc.title, doc.description.as_deref(), assets, content)
}

/// Renders the home page: optional intro, then every post newest first
fn render_index(site: &Site, intro: Option<&Document>, assets: &Assets) -> Markup {
    let content = html! {
        main.index-page {
            @if let Some(intro) = intro {
                section.intro {
                    (PreEscaped(&intro.rendered_html))
                }
            }
            h2 { "Posts" }
            (post_list(site, site.posts()))
        }
    };
    base_document(site, &site.config.title, None, assets, content)
}

fn render_tags_index(site: &Site, assets: &Assets) -> Markup {
    let content = html! {
        main.tags-page {
            h1 { "Tags" }
            ul.tag-index {
                @for tag in &site.tags {
                    li {
                        a.tag href={ "/tags/" (tag.slug) "/" } { (tag.name) }
                        " "
                        span.count { "(" (tag.members.len()) ")" }
                    }
                }
            }
        }
    };
    base_document(site, "Tags", None, assets, content)
}

fn render_tag_page(site: &Site, tag: &TagGroup, assets: &Assets) -> Markup {
    let title = format!("Tagged “{}”", tag.name);
    let content = html! {
        main.tag-page {
            h1 { (title) }
            (post_list(site, site.tag_members(tag)))
        }
    };
    base_document(site, &title, None, assets, content)
}

fn render_series_page(site: &Site, series: &Series, assets: &Assets) -> Markup {
    let content = html! {
        main.series-page {
            h1 { (series.name) }
            ol.series-list {
                @for doc in site.series_members(series) {
                    li {
                        a href=(doc.permalink) { (doc.title) }
                        " "
                        (date_tag(doc))
                    }
                }
            }
        }
    };
    base_document(site, &series.name, None, assets, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn assets() -> Assets {
        Assets {
            css_href: "/style.css?v=test".to_string(),
            js_href: "/search.js?v=test".to_string(),
        }
    }

    fn eks_site() -> Site {
        site_from(vec![
            doc("eks-1", "2024-03-15")
                .title("EKS Ingress")
                .series("EKS Deep Dive", 1.1)
                .tags(&["kubernetes", "aws"]),
            doc("eks-2", "2024-03-16")
                .title("EKS Ingress TLS")
                .series("EKS Deep Dive", 1.2),
            doc("eks-3", "2024-03-17")
                .title("EKS Observability")
                .series("EKS Deep Dive", 1.3),
            doc("about", "2024-01-01").layout("page").title("About"),
        ])
    }

    fn index_of(site: &Site, id: &str) -> usize {
        site.documents.iter().position(|d| d.id == id).unwrap()
    }

    fn read(dir: &Path, rel: &str) -> String {
        fs::read_to_string(dir.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
    }

    /// Every file under `dir` with its bytes, sorted by path.
    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(dir).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    // =========================================================================
    // Paths and layouts
    // =========================================================================

    #[test]
    fn output_path_for_directory_permalinks() {
        assert_eq!(output_path_for("/"), PathBuf::from("index.html"));
        assert_eq!(output_path_for("/a/b/"), PathBuf::from("a/b/index.html"));
    }

    #[test]
    fn output_path_for_file_permalinks() {
        assert_eq!(output_path_for("/a/b.html"), PathBuf::from("a/b.html"));
        assert_eq!(output_path_for("/feed.json"), PathBuf::from("feed.json"));
    }

    #[test]
    fn layout_parse() {
        assert_eq!(Layout::parse("post"), Some(Layout::Post));
        assert_eq!(Layout::parse("page"), Some(Layout::Page));
        assert_eq!(Layout::parse("newsletter"), None);
    }

    #[test]
    fn unknown_layout_is_error() {
        let site = site_from(vec![doc("x", "2024-01-01").layout("newsletter")]);
        match resolve_layouts(&site).unwrap_err() {
            GenerateError::UnknownLayout { path, layout } => {
                assert_eq!(path, PathBuf::from("x.md"));
                assert_eq!(layout, "newsletter");
            }
            other => panic!("expected UnknownLayout, got {other:?}"),
        }
    }

    #[test]
    fn content_hash_is_stable_and_short() {
        assert_eq!(content_hash(b"body {}"), content_hash(b"body {}"));
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
        assert_eq!(content_hash(b"a").len(), 10);
    }

    // =========================================================================
    // HTML components
    // =========================================================================

    #[test]
    fn base_document_includes_doctype_and_assets() {
        let site = site_from(vec![]);
        let doc = base_document(&site, "Test", None, &assets(), html! { p { "x" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"href="/style.css?v=test""#));
        assert!(doc.contains(r#"src="/search.js?v=test""#));
        assert!(doc.contains("<title>Test · Tech Blog</title>"));
    }

    #[test]
    fn base_document_links_feed_only_with_base_url() {
        let site = site_from(vec![]);
        let doc = base_document(&site, "T", None, &assets(), html! {}).into_string();
        assert!(!doc.contains("application/rss+xml"));

        let config = SiteConfig {
            base_url: "https://blog.example.com".to_string(),
            ..SiteConfig::default()
        };
        let site = site_with_config(config, vec![]);
        let doc = base_document(&site, "T", None, &assets(), html! {}).into_string();
        assert!(doc.contains(r#"href="/feed.xml""#));
    }

    #[test]
    fn search_box_carries_config() {
        let site = site_from(vec![]);
        let html = search_box(&site).into_string();
        assert!(html.contains(r#"data-index="/search.json""#));
        assert!(html.contains(r#"data-max-results="10""#));
        assert!(html.contains(r#"data-shortcut="/""#));
    }

    #[test]
    fn nav_lists_pages_not_posts() {
        let site = eks_site();
        let html = render_nav(&site).into_string();
        assert!(html.contains(r#"href="/about/""#));
        assert!(!html.contains("EKS Ingress"));
        assert!(html.contains(r#"href="/tags/""#));
    }

    #[test]
    fn html_escape_in_maud() {
        let site = site_from(vec![doc("x", "2024-01-01").title("<script>alert(1)</script>")]);
        let html = render_post(&site, 0, &assets()).into_string();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    // =========================================================================
    // Page renderers
    // =========================================================================

    #[test]
    fn post_shows_date_and_linked_tags() {
        let site = eks_site();
        let html = render_post(&site, index_of(&site, "eks-1"), &assets()).into_string();
        assert!(html.contains("March 15, 2024"));
        assert!(html.contains(r#"datetime="2024-03-15T00:00:00+00:00""#));
        assert!(html.contains(r#"href="/tags/aws/""#));
        assert!(html.contains(r#"href="/tags/kubernetes/""#));
    }

    #[test]
    fn series_middle_links_both_neighbours() {
        let site = eks_site();
        let html = render_post(&site, index_of(&site, "eks-2"), &assets()).into_string();
        assert!(html.contains("Part 2 of 3"));
        assert!(html.contains(r#"rel="prev" href="/eks-1/""#));
        assert!(html.contains(r#"rel="next" href="/eks-3/""#));
        assert!(html.contains(r#"href="/series/eks-deep-dive/""#));
    }

    #[test]
    fn series_first_has_no_previous() {
        let site = eks_site();
        let html = render_post(&site, index_of(&site, "eks-1"), &assets()).into_string();
        assert!(html.contains("Part 1 of 3"));
        assert!(!html.contains(r#"rel="prev""#));
        assert!(html.contains(r#"rel="next" href="/eks-2/""#));
    }

    #[test]
    fn toc_only_with_two_or_more_headings() {
        let mut one = doc("one", "2024-01-01").build();
        one.toc = vec![crate::types::TocEntry {
            level: 2,
            id: "a".into(),
            text: "A".into(),
        }];
        assert!(!render_toc(&one).into_string().contains("toc"));

        let mut two = one.clone();
        two.toc.push(crate::types::TocEntry {
            level: 3,
            id: "b".into(),
            text: "B".into(),
        });
        let html = render_toc(&two).into_string();
        assert!(html.contains(r##"href="#a""##));
        assert!(html.contains(r#"class="toc-h3""#));
    }

    #[test]
    fn home_lists_posts_newest_first() {
        let site = eks_site();
        let html = render_index(&site, None, &assets()).into_string();
        let third = html.find("EKS Observability").unwrap();
        let first = html.find("EKS Ingress<").unwrap();
        assert!(third < first);
        // Pages are not in the post list
        assert!(!html.contains(r#"class="post-link" href="/about/""#));
    }

    #[test]
    fn tag_page_lists_members() {
        let site = eks_site();
        let tag = site.tag("aws").unwrap();
        let html = render_tag_page(&site, tag, &assets()).into_string();
        assert!(html.contains("Tagged “aws”"));
        assert!(html.contains(r#"href="/eks-1/""#));
        assert!(!html.contains(r#"class="post-link" href="/eks-2/""#));
    }

    #[test]
    fn tag_page_orders_members_newest_first() {
        let site = site_from(vec![
            doc("old", "2023-01-01").tags(&["aws"]),
            doc("new", "2024-06-01").tags(&["aws"]),
            doc("mid", "2024-01-01").tags(&["AWS"]),
        ]);
        let tag = site.tag("aws").unwrap();
        let html = render_tag_page(&site, tag, &assets()).into_string();
        let new = html.find(r#"class="post-link" href="/new/""#).unwrap();
        let mid = html.find(r#"class="post-link" href="/mid/""#).unwrap();
        let old = html.find(r#"class="post-link" href="/old/""#).unwrap();
        assert!(new < mid && mid < old);
    }

    #[test]
    fn tags_index_shows_counts() {
        let site = eks_site();
        let html = render_tags_index(&site, &assets()).into_string();
        assert!(html.contains("(1)"));
        assert!(html.contains(r#"href="/tags/aws/""#));
    }

    #[test]
    fn series_page_in_part_order() {
        let site = eks_site();
        let html = render_series_page(&site, &site.series[0], &assets()).into_string();
        let p1 = html.find("/eks-1/").unwrap();
        let p2 = html.find("/eks-2/").unwrap();
        let p3 = html.find("/eks-3/").unwrap();
        assert!(p1 < p2 && p2 < p3);
    }

    // =========================================================================
    // Full generation
    // =========================================================================

    #[test]
    fn generate_writes_fixture_site() {
        let tmp = setup_fixtures();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");
        let site = crate::scan::scan(tmp.path()).unwrap();
        let summary = generate(&site, tmp.path(), &dist).unwrap();

        assert_eq!(summary.documents, 6);
        assert_eq!(summary.series_pages, 1);
        assert_eq!(summary.tag_pages, 3);
        assert_eq!(summary.search_entries, 6);
        assert!(summary.feed_written);
        assert_eq!(summary.assets_copied, 1);

        for rel in [
            "index.html",
            "about/index.html",
            "2024/03/15/eks-ingress/index.html",
            "2024/04/01/pod-identity/index.html",
            "tags/index.html",
            "tags/aws/index.html",
            "series/eks-deep-dive/index.html",
            "search.json",
            "feed.xml",
            "style.css",
            "search.js",
            "assets/diagram.svg",
        ] {
            assert!(dist.join(rel).is_file(), "missing {rel}");
        }
        // Home intro comes from index.md
        assert!(read(&dist, "index.html").contains("Field notes on <strong>EKS</strong>"));
        // Staging directory is gone
        assert!(!out.path().join(".dist.staging").exists());
    }

    #[test]
    fn generated_css_includes_config_colors() {
        let tmp = setup_fixtures();
        let out = TempDir::new().unwrap();
        let site = crate::scan::scan(tmp.path()).unwrap();
        generate(&site, tmp.path(), out.path()).unwrap();
        let css = read(out.path(), "style.css");
        assert!(css.contains("--color-bg: #ffffff"));
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let tmp = setup_fixtures();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");

        let site = crate::scan::scan(tmp.path()).unwrap();
        generate(&site, tmp.path(), &dist).unwrap();
        let first = snapshot(&dist);

        let site = crate::scan::scan(tmp.path()).unwrap();
        generate(&site, tmp.path(), &dist).unwrap();
        assert_eq!(first, snapshot(&dist));
    }

    #[test]
    fn failed_build_keeps_previous_output() {
        let tmp = setup_fixtures();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");
        let site = crate::scan::scan(tmp.path()).unwrap();
        generate(&site, tmp.path(), &dist).unwrap();
        let before = snapshot(&dist);

        let broken = site_from(vec![doc("x", "2024-01-01").layout("newsletter")]);
        assert!(generate(&broken, tmp.path(), &dist).is_err());
        assert_eq!(before, snapshot(&dist));
    }

    #[test]
    fn permalink_colliding_with_generated_page_is_error() {
        let tmp = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");
        let site = site_from(vec![
            doc("x", "2024-01-01").permalink("/search.json"),
        ]);
        assert!(matches!(
            generate(&site, tmp.path(), &dist),
            Err(GenerateError::OutputCollision { .. })
        ));
        assert!(!dist.exists());
        assert!(!out.path().join(".dist.staging").exists());
    }

    #[test]
    fn permalink_colliding_with_asset_is_error() {
        let tmp = setup_fixtures();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");
        let site = site_from(vec![
            doc("x", "2024-01-01").permalink("/assets/diagram.svg"),
        ]);
        assert!(matches!(
            generate(&site, tmp.path(), &dist),
            Err(GenerateError::OutputCollision { path }) if path.ends_with("diagram.svg")
        ));
        assert!(!dist.exists());
    }

    #[cfg(unix)]
    #[test]
    fn asset_symlinks_are_skipped() {
        let tmp = setup_fixtures();
        let assets = tmp.path().join("assets");
        std::os::unix::fs::symlink(&assets, assets.join("loop")).unwrap();
        let out = TempDir::new().unwrap();
        let dist = out.path().join("dist");
        let site = crate::scan::scan(tmp.path()).unwrap();
        let summary = generate(&site, tmp.path(), &dist).unwrap();
        assert_eq!(summary.assets_copied, 1);
        assert!(dist.join("assets/diagram.svg").is_file());
        assert!(!dist.join("assets/loop").exists());
    }

    #[test]
    fn output_without_directory_name_is_rejected() {
        let tmp = setup_fixtures();
        let site = site_from(vec![doc("x", "2024-01-01")]);
        for output in [".", "..", "/"] {
            assert!(matches!(
                generate(&site, tmp.path(), Path::new(output)),
                Err(GenerateError::InvalidOutputDir { .. })
            ));
        }
    }

    #[test]
    fn output_containing_content_is_rejected() {
        let root = TempDir::new().unwrap();
        let content = root.path().join("content");
        fs::create_dir_all(&content).unwrap();
        let site = site_from(vec![doc("x", "2024-01-01")]);
        assert!(matches!(
            generate(&site, &content, root.path()),
            Err(GenerateError::InvalidOutputDir { .. })
        ));
        assert!(content.is_dir());
    }
}
