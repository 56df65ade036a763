//! Filesystem scanning and document indexing.
//!
//! Stage 1 of the build pipeline. Walks the content root, turns every
//! Markdown file into a [`Document`], and groups the documents into series
//! and tags. The result is a [`Site`] that every later stage reads.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                              # Content root
//! ├── config.toml                       # Site configuration (optional)
//! ├── about.md                          # Page → /about/
//! ├── index.md                          # Page → / (home page intro)
//! ├── notes/
//! │   ├── index.md                      # Page → /notes/
//! │   └── kubectl.md                    # Page → /notes/kubectl/
//! ├── _posts/                           # Posts (layout defaults to "post")
//! │   ├── 2024-03-15-eks-ingress.md     # → /2024/03/15/eks-ingress/
//! │   └── 2024-04-01-pod-identity.md
//! ├── _drafts/                          # Skipped (underscore prefix)
//! │   └── 2024-05-01-wip.md
//! └── assets/                           # Copied verbatim, never scanned
//!     └── diagram.png
//! ```
//!
//! ## Naming Conventions
//!
//! - **Posts** (`_posts/YYYY-MM-DD-slug.md`): the filename date is the
//!   fallback for a missing `date`, the rest is the slug
//! - **Pages** (any other `.md`): slug is the filename stem, `index.md` maps
//!   to its directory
//! - **Hidden entries** (`.git`, `.DS_Store`) and `_`-prefixed directories
//!   other than `_posts` are ignored, as is a top-level `README.md`
//!
//! ## Validation
//!
//! The scanner stops at the first of these:
//! - A header that is missing, unterminated, not YAML, or lacks `title`/`date`
//! - A series member without `series_part`
//! - Two members of one series with the same `series_part`
//! - Two documents resolving to the same permalink

use crate::config::{self, SiteConfig};
use crate::frontmatter::{self, FrontMatter, MetadataProblem};
use crate::markdown;
use crate::naming::{parse_entry_name, slugify};
use crate::site::{Series, Site, TagGroup};
use crate::types::{Document, SeriesPart};
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Malformed metadata in {}: {problem}", path.display())]
    MalformedMetadata {
        path: PathBuf,
        problem: MetadataProblem,
    },
    #[error(
        "Duplicate series_part {part} in series \"{series}\": {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateSeriesPart {
        series: String,
        part: SeriesPart,
        first: PathBuf,
        second: PathBuf,
    },
    #[error(
        "Duplicate permalink {permalink}: {} and {}",
        first.display(),
        second.display()
    )]
    DuplicatePermalink {
        permalink: String,
        first: PathBuf,
        second: PathBuf,
    },
}

const POSTS_DIR: &str = "_posts";
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

pub fn scan(root: &Path) -> Result<Site, ScanError> {
    let config = config::load_config(root)?;

    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| is_content_entry(e, root, &config.assets_dir));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if let Some(doc) = parse_document(entry.path(), rel, &config)? {
            debug!(id = %doc.id, permalink = %doc.permalink, "indexed document");
            documents.push(doc);
        }
    }

    let site = assemble(config, documents)?;
    info!(
        documents = site.documents.len(),
        series = site.series.len(),
        tags = site.tags.len(),
        "scan complete"
    );
    Ok(site)
}

fn is_content_entry(entry: &DirEntry, root: &Path, assets_dir: &str) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    if entry.file_type().is_dir() {
        if name.starts_with('_') && name != POSTS_DIR {
            return false;
        }
        if entry.path().strip_prefix(root).ok() == Some(Path::new(assets_dir)) {
            return false;
        }
    } else if entry.depth() == 1 && name.eq_ignore_ascii_case("readme.md") {
        return false;
    }
    true
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.contains(&e.as_str()))
}

/// Read one content file. Returns `None` for `published: false`.
fn parse_document(
    path: &Path,
    rel: &Path,
    config: &SiteConfig,
) -> Result<Option<Document>, ScanError> {
    let malformed = |problem: MetadataProblem| ScanError::MalformedMetadata {
        path: rel.to_path_buf(),
        problem,
    };

    let content = fs::read_to_string(path)?;
    let (header, body) = frontmatter::split(&content).map_err(malformed)?;
    let fm = frontmatter::parse(header).map_err(malformed)?;

    if fm.published == Some(false) {
        info!(path = %rel.display(), "skipping unpublished document");
        return Ok(None);
    }

    let fields = resolve_fields(fm, rel, config).map_err(malformed)?;
    let rendered = markdown::render(body);
    let excerpt = markdown::excerpt(&rendered.plain_text, config.excerpt_length);

    Ok(Some(Document {
        id: rel.with_extension("").to_string_lossy().replace('\\', "/"),
        source_path: rel.to_string_lossy().replace('\\', "/"),
        layout: fields.layout,
        title: fields.title,
        publish_date: fields.publish_date,
        tags: fields.tags,
        series: fields.series,
        series_part: fields.series_part,
        permalink: fields.permalink,
        description: fields.description,
        body_markdown: body.to_string(),
        rendered_html: rendered.html,
        toc: rendered.toc,
        excerpt,
    }))
}

/// Front matter after defaults, fallbacks, and validation.
struct Fields {
    layout: String,
    title: String,
    publish_date: DateTime<FixedOffset>,
    tags: Vec<String>,
    series: Option<String>,
    series_part: Option<SeriesPart>,
    permalink: String,
    description: Option<String>,
}

fn resolve_fields(
    fm: FrontMatter,
    rel: &Path,
    config: &SiteConfig,
) -> Result<Fields, MetadataProblem> {
    let in_posts = rel.components().any(|c| c.as_os_str() == POSTS_DIR);
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = parse_entry_name(&stem);

    let default_layout = if in_posts { "post" } else { "page" };
    let layout = non_empty(fm.layout).unwrap_or_else(|| default_layout.to_string());

    let title = non_empty(fm.title).ok_or(MetadataProblem::MissingField("title"))?;

    let publish_date = match fm.date {
        Some(value) => frontmatter::parse_date(&value)?,
        None => name
            .date
            .and_then(frontmatter::midnight_utc)
            .ok_or(MetadataProblem::MissingField("date"))?,
    };

    let mut raw_tags = fm.tags.map(|t| t.into_vec()).unwrap_or_default();
    raw_tags.extend(fm.categories.map(|c| c.into_vec()).unwrap_or_default());
    let tags = dedupe_tags(raw_tags);

    let series = non_empty(fm.series);
    let series_part = match (&series, fm.series_part) {
        (Some(_), None) => return Err(MetadataProblem::MissingField("series_part")),
        (Some(_), Some(part)) if !part.is_finite() => {
            return Err(MetadataProblem::InvalidField {
                field: "series_part",
                value: part.to_string(),
            });
        }
        (Some(_), Some(part)) => Some(SeriesPart(part)),
        (None, _) => None,
    };

    let slug = match slugify(&name.slug) {
        s if s.is_empty() => slugify(&title),
        s => s,
    };

    let permalink = match non_empty(fm.permalink) {
        Some(raw) => normalize_permalink(&raw).ok_or(MetadataProblem::InvalidField {
            field: "permalink",
            value: raw,
        })?,
        None if layout == "post" || in_posts => {
            let expanded = expand_permalink(&config.permalink, &publish_date, &slug);
            normalize_permalink(&expanded).ok_or(MetadataProblem::InvalidField {
                field: "permalink",
                value: expanded,
            })?
        }
        None => page_permalink(rel, &stem, &slug),
    };

    Ok(Fields {
        layout,
        title,
        publish_date,
        tags,
        series,
        series_part,
        permalink,
        description: non_empty(fm.description),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Keep the first spelling of each tag, compared case-insensitively.
fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Fill `:year :month :day :slug :title` in a post permalink template.
fn expand_permalink(template: &str, date: &DateTime<FixedOffset>, slug: &str) -> String {
    template
        .replace(":year", &date.format("%Y").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":slug", slug)
        .replace(":title", slug)
}

/// `/<relative dir>/<slug>/`, or the directory itself for `index.md`.
fn page_permalink(rel: &Path, stem: &str, slug: &str) -> String {
    let mut segments: Vec<String> = rel
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    if !stem.eq_ignore_ascii_case("index") {
        segments.push(slug.to_string());
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Leading `/`, no empty or dot segments, trailing `/` unless the value
/// ends in a segment that looks like a file name (`/a/b.html`). A trailing
/// `/` always keeps the directory form (`/blog/node.js/`). Returns `None`
/// for `..` or `.` segments.
pub fn normalize_permalink(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == ".." || *s == ".") {
        return None;
    }
    match segments.last() {
        None => Some("/".to_string()),
        Some(last) if last.contains('.') && !raw.ends_with('/') => {
            Some(format!("/{}", segments.join("/")))
        }
        Some(_) => Some(format!("/{}/", segments.join("/"))),
    }
}

/// Order documents, check cross-document invariants, and build the series
/// and tag indexes.
pub fn assemble(config: SiteConfig, mut documents: Vec<Document>) -> Result<Site, ScanError> {
    documents.sort_by(|a, b| {
        b.publish_date
            .cmp(&a.publish_date)
            .then_with(|| a.permalink.cmp(&b.permalink))
    });

    let mut permalinks: BTreeMap<&str, &Document> = BTreeMap::new();
    for doc in &documents {
        if let Some(first) = permalinks.insert(doc.permalink.as_str(), doc) {
            return Err(ScanError::DuplicatePermalink {
                permalink: doc.permalink.clone(),
                first: PathBuf::from(&first.source_path),
                second: PathBuf::from(&doc.source_path),
            });
        }
    }

    let series = group_series(&documents)?;
    let tags = group_tags(&documents);

    Ok(Site {
        config,
        documents,
        series,
        tags,
    })
}

fn group_series(documents: &[Document]) -> Result<Vec<Series>, ScanError> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, doc) in documents.iter().enumerate() {
        if let Some(name) = &doc.series {
            groups.entry(name).or_default().push(i);
        }
    }

    let slugs = unique_slugs(groups.keys().copied(), "series");
    let mut series = Vec::with_capacity(groups.len());
    for ((name, mut members), slug) in groups.into_iter().zip(slugs) {
        members.sort_by_key(|&i| documents[i].series_part);
        for pair in members.windows(2) {
            let (a, b) = (&documents[pair[0]], &documents[pair[1]]);
            if a.series_part == b.series_part
                && let Some(part) = a.series_part
            {
                return Err(ScanError::DuplicateSeriesPart {
                    series: name.to_string(),
                    part,
                    first: PathBuf::from(&a.source_path),
                    second: PathBuf::from(&b.source_path),
                });
            }
        }
        series.push(Series {
            name: name.to_string(),
            slug,
            members,
        });
    }
    Ok(series)
}

fn group_tags(documents: &[Document]) -> Vec<TagGroup> {
    let mut groups: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
    for (i, doc) in documents.iter().enumerate() {
        for tag in &doc.tags {
            groups
                .entry(tag.to_lowercase())
                .or_insert_with(|| (tag.clone(), Vec::new()))
                .1
                .push(i);
        }
    }

    let slugs = unique_slugs(groups.keys().map(String::as_str), "tag");
    groups
        .into_iter()
        .zip(slugs)
        .map(|((key, (name, members)), slug)| TagGroup {
            name,
            key,
            slug,
            members,
        })
        .collect()
}

/// Slugify each name, falling back to `fallback` for names with no
/// alphanumerics and suffixing `-2`, `-3`… on collisions.
fn unique_slugs<'a>(names: impl Iterator<Item = &'a str>, fallback: &str) -> Vec<String> {
    let mut used = HashSet::new();
    names
        .map(|name| {
            let base = match slugify(name) {
                s if s.is_empty() => fallback.to_string(),
                s => s,
            };
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{base}-{n}");
                n += 1;
            }
            slug
        })
        .collect()
}
