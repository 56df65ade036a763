//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root; every key is optional and overrides the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Tech Blog"
//! description = ""
//! author = ""
//! base_url = ""                           # e.g. "https://blog.example.com"
//! language = "en"
//! permalink = "/:year/:month/:day/:slug/" # Derived post URLs
//! excerpt_length = 200                    # Characters of plain text per excerpt
//! assets_dir = "assets"                   # Copied verbatim to the output root
//!
//! [search]
//! index_path = "search.json"
//! max_results = 10
//! shortcut = "/"
//!
//! [feed]
//! enabled = true
//! path = "feed.xml"
//! limit = 20
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 4000
//! watch = true
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#1f2328"
//! text_muted = "#656d76"
//! border = "#d0d7de"
//! link = "#0969da"
//! link_hover = "#0550ae"
//! code_background = "#f6f8fa"
//!
//! [colors.dark]
//! background = "#0d1117"
//! text = "#e6edf3"
//! text_muted = "#8d96a0"
//! border = "#30363d"
//! link = "#4493f8"
//! link_hover = "#79c0ff"
//! code_background = "#161b22"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, so override just the values you want:
//!
//! ```toml
//! title = "Platform Notes"
//!
//! [search]
//! max_results = 5
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, shown in the header and the feed channel.
    pub title: String,
    /// One-line site description for `<meta>` and the feed.
    pub description: String,
    /// Default author name.
    pub author: String,
    /// Absolute site URL without trailing slash. Empty means relative links only.
    pub base_url: String,
    /// `lang` attribute and feed language.
    pub language: String,
    /// Template for derived post permalinks.
    pub permalink: String,
    /// Number of plain-text characters kept in each excerpt.
    pub excerpt_length: usize,
    /// Directory (relative to the content root) copied verbatim to the output.
    pub assets_dir: String,
    /// Client search settings.
    pub search: SearchConfig,
    /// RSS feed settings.
    pub feed: FeedConfig,
    /// Development server settings.
    pub serve: ServeConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Blog".to_string(),
            description: String::new(),
            author: String::new(),
            base_url: String::new(),
            language: "en".to_string(),
            permalink: "/:year/:month/:day/:slug/".to_string(),
            excerpt_length: 200,
            assets_dir: "assets".to_string(),
            search: SearchConfig::default(),
            feed: FeedConfig::default(),
            serve: ServeConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.excerpt_length == 0 {
            return Err(ConfigError::Validation(
                "excerpt_length must be greater than 0".into(),
            ));
        }
        if !self.permalink.starts_with('/') {
            return Err(ConfigError::Validation(
                "permalink must start with '/'".into(),
            ));
        }
        if !self.permalink.contains(":slug") && !self.permalink.contains(":title") {
            return Err(ConfigError::Validation(
                "permalink must contain :slug or :title".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::Validation(
                "search.max_results must be greater than 0".into(),
            ));
        }
        validate_output_file("search.index_path", &self.search.index_path)?;
        validate_output_file("feed.path", &self.feed.path)?;
        if self.search.shortcut.chars().count() != 1 {
            return Err(ConfigError::Validation(
                "search.shortcut must be a single character".into(),
            ));
        }
        if self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "base_url must not end with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Absolute URL for a site-relative path, or the path itself when
    /// `base_url` is empty.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn validate_output_file(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty()
        || value.starts_with('/')
        || value.split('/').any(|seg| seg == ".." || seg.is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "{key} must be a relative file path inside the output directory"
        )));
    }
    Ok(())
}

/// Client search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Location of the JSON index relative to the site root.
    pub index_path: String,
    /// Maximum number of results shown per query.
    pub max_results: usize,
    /// Key that focuses the search input.
    pub shortcut: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: "search.json".to_string(),
            max_results: 10,
            shortcut: "/".to_string(),
        }
    }
}

/// RSS feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub enabled: bool,
    /// Location of the feed relative to the site root.
    pub path: String,
    /// Number of most recent posts included.
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "feed.xml".to_string(),
            limit: 20,
        }
    }
}

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub interface: String,
    pub port: u16,
    /// Rebuild when the content directory changes.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 4000,
            watch: true,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Muted/secondary text color (dates, tag chips, captions).
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
    /// Background of inline code and code blocks.
    pub code_background: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1f2328".to_string(),
            text_muted: "#656d76".to_string(),
            border: "#d0d7de".to_string(),
            link: "#0969da".to_string(),
            link_hover: "#0550ae".to_string(),
            code_background: "#f6f8fa".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0d1117".to_string(),
            text: "#e6edf3".to_string(),
            text_muted: "#8d96a0".to_string(),
            border: "#30363d".to_string(),
            link: "#4493f8".to_string(),
            link_hover: "#79c0ff".to_string(),
            code_background: "#161b22".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

title = "Tech Blog"
description = ""
author = ""

# Absolute site URL without trailing slash, used by the feed.
base_url = ""

language = "en"

# Template for post URLs. Placeholders: :year :month :day :slug :title
# Any post can override its URL with `permalink:` in the front matter.
permalink = "/:year/:month/:day/:slug/"

# Plain-text characters kept per excerpt (search previews, listings).
excerpt_length = 200

# Copied verbatim to the output root.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Client-side search
# ---------------------------------------------------------------------------
[search]
# Where the JSON index is written, relative to the site root.
index_path = "search.json"

# Results shown per query.
max_results = 10

# Key that focuses the search box.
shortcut = "/"

# ---------------------------------------------------------------------------
# RSS feed
# ---------------------------------------------------------------------------
[feed]
enabled = true
path = "feed.xml"
limit = 20

# ---------------------------------------------------------------------------
# Development server (simple-blog serve)
# ---------------------------------------------------------------------------
[serve]
interface = "127.0.0.1"
port = 4000
watch = true

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1f2328"
text_muted = "#656d76"    # Dates, tags, captions
border = "#d0d7de"
link = "#0969da"
link_hover = "#0550ae"
code_background = "#f6f8fa"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0d1117"
text = "#e6edf3"
text_muted = "#8d96a0"
border = "#30363d"
link = "#4493f8"
link_hover = "#79c0ff"
code_background = "#161b22"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
{light}
}}

@media (prefers-color-scheme: dark) {{
    :root {{
{dark}
    }}
}}"#,
        light = color_variables(&colors.light, "    "),
        dark = color_variables(&colors.dark, "        "),
    )
}

fn color_variables(scheme: &ColorScheme, indent: &str) -> String {
    [
        ("--color-bg", &scheme.background),
        ("--color-text", &scheme.text),
        ("--color-text-muted", &scheme.text_muted),
        ("--color-border", &scheme.border),
        ("--color-link", &scheme.link),
        ("--color-link-hover", &scheme.link_hover),
        ("--color-code-bg", &scheme.code_background),
    ]
    .iter()
    .map(|(name, value)| format!("{indent}{name}: {value};"))
    .collect::<Vec<_>>()
    .join("\n")
}
