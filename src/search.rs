//! Keyword search over the built index, and the search widget state machine.
//!
//! The browser widget (`static/search.js`) and this module implement the same
//! algorithm; this one is what `simple-blog search` runs and what the tests
//! pin down.
//!
//! ## Matching
//!
//! The query is trimmed and lowercased, then tested as a substring against
//! each entry's title, tags, and excerpt. An entry ranks by the best field it
//! matches:
//!
//! | Rank | Field   |
//! |------|---------|
//! | 0    | title   |
//! | 1    | tag     |
//! | 2    | excerpt |
//!
//! Entries with the same rank keep index order (newest first), and the list
//! is cut to `search.max_results`.
//!
//! ## Widget lifecycle
//!
//! ```text
//!          activate / input            load ok              input
//!   Idle ────────────────▶ Loading ─────────────▶ Ready ───────────▶ Querying
//!                             │                     ▲                  │
//!                  load error │     empty input     │      ┌───────────┴──────────┐
//!                             ▼                     │      ▼                      ▼
//!                          Errored                  └─ ShowingResults      ShowingEmpty
//! ```
//!
//! The index is fetched at most once per widget. Every load is tied to a
//! [`LoadTicket`]; [`SearchWidget::teardown`] invalidates outstanding tickets
//! so a load that completes afterwards is dropped.

use crate::types::SearchIndexEntry;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SearchIndexFetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid search index: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Field an entry matched on. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchField {
    Title,
    Tag,
    Excerpt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry: SearchIndexEntry,
    pub field: MatchField,
}

pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn best_match(entry: &SearchIndexEntry, needle: &str) -> Option<MatchField> {
    if entry.title.to_lowercase().contains(needle) {
        Some(MatchField::Title)
    } else if entry.tags.iter().any(|t| t.to_lowercase().contains(needle)) {
        Some(MatchField::Tag)
    } else if entry.excerpt.to_lowercase().contains(needle) {
        Some(MatchField::Excerpt)
    } else {
        None
    }
}

/// Rank entries matching `query`. An empty query matches nothing.
pub fn search(entries: &[SearchIndexEntry], query: &str, limit: usize) -> Vec<SearchHit> {
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<SearchHit> = entries
        .iter()
        .filter_map(|entry| {
            best_match(entry, &needle).map(|field| SearchHit {
                entry: entry.clone(),
                field,
            })
        })
        .collect();
    // Stable sort keeps index order within a rank
    hits.sort_by_key(|h| h.field);
    hits.truncate(limit);
    hits
}

/// Where the widget gets its index from.
pub trait IndexSource {
    fn fetch(&self) -> Result<Vec<SearchIndexEntry>, SearchIndexFetchError>;
}

/// Reads a built `search.json` from disk.
#[derive(Debug, Clone)]
pub struct FileIndexSource {
    path: PathBuf,
}

impl FileIndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexSource for FileIndexSource {
    fn fetch(&self) -> Result<Vec<SearchIndexEntry>, SearchIndexFetchError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Idle,
    Loading,
    Ready,
    Querying { query: String },
    ShowingResults { query: String, hits: Vec<SearchHit> },
    ShowingEmpty { query: String },
    /// "Search unavailable". Terminal for this widget.
    Errored { message: String },
}

/// Handle for one in-flight index load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct SearchWidget {
    state: WidgetState,
    index: Option<Vec<SearchIndexEntry>>,
    /// Input typed while the index was still loading.
    pending_query: Option<String>,
    generation: u64,
    fetches: usize,
    max_results: usize,
    shortcut: char,
}

impl SearchWidget {
    pub fn new(max_results: usize, shortcut: char) -> Self {
        Self {
            state: WidgetState::Idle,
            index: None,
            pending_query: None,
            generation: 0,
            fetches: 0,
            max_results,
            shortcut,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Number of index fetches started over the widget's lifetime.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Hits currently displayed, empty in every state but `ShowingResults`.
    pub fn hits(&self) -> &[SearchHit] {
        match &self.state {
            WidgetState::ShowingResults { hits, .. } => hits,
            _ => &[],
        }
    }

    /// Search input gained focus. Starts the load if nothing was loaded yet.
    pub fn activate(&mut self) -> Option<LoadTicket> {
        if self.state != WidgetState::Idle {
            return None;
        }
        self.fetches += 1;
        self.state = WidgetState::Loading;
        debug!(generation = self.generation, "search index load started");
        Some(LoadTicket(self.generation))
    }

    /// A key was pressed outside the search input. Only the shortcut key
    /// activates the widget.
    pub fn on_key(&mut self, key: char) -> Option<LoadTicket> {
        if key == self.shortcut {
            self.activate()
        } else {
            None
        }
    }

    /// The search input changed. May start the load when typing into a
    /// widget that was never activated.
    pub fn on_input(&mut self, query: &str) -> Option<LoadTicket> {
        match self.state {
            WidgetState::Errored { .. } => None,
            WidgetState::Idle => {
                self.pending_query = Some(query.to_string());
                self.activate()
            }
            WidgetState::Loading => {
                self.pending_query = Some(query.to_string());
                None
            }
            _ => {
                self.run_query(query);
                None
            }
        }
    }

    /// Deliver the result of the load started with `ticket`. Returns `false`
    /// when the load is stale and was ignored.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<SearchIndexEntry>, SearchIndexFetchError>,
    ) -> bool {
        if ticket.0 != self.generation || self.state != WidgetState::Loading {
            debug!(ticket = ticket.0, "discarding stale search index load");
            return false;
        }
        match result {
            Ok(entries) => {
                debug!(entries = entries.len(), "search index ready");
                self.index = Some(entries);
                self.state = WidgetState::Ready;
                if let Some(query) = self.pending_query.take() {
                    self.run_query(&query);
                }
            }
            Err(e) => {
                warn!("search unavailable: {e}");
                self.pending_query = None;
                self.state = WidgetState::Errored {
                    message: e.to_string(),
                };
            }
        }
        true
    }

    /// Start and finish a load synchronously from `source`.
    pub fn load_from<S: IndexSource>(&mut self, source: &S) {
        if let Some(ticket) = self.activate() {
            self.complete_load(ticket, source.fetch());
        }
    }

    /// The page is going away. Any in-flight load is discarded.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.pending_query = None;
        if self.state == WidgetState::Loading {
            self.state = WidgetState::Idle;
        }
    }

    fn run_query(&mut self, query: &str) {
        let Some(index) = &self.index else {
            return;
        };
        let normalized = normalize(query);
        if normalized.is_empty() {
            self.state = WidgetState::Ready;
            return;
        }
        self.state = WidgetState::Querying {
            query: normalized.clone(),
        };
        let hits = search(index, &normalized, self.max_results);
        self.state = if hits.is_empty() {
            WidgetState::ShowingEmpty { query: normalized }
        } else {
            WidgetState::ShowingResults {
                query: normalized,
                hits,
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn entry(title: &str, tags: &[&str], excerpt: &str) -> SearchIndexEntry {
        SearchIndexEntry {
            title: title.to_string(),
            url: format!("/{}/", crate::naming::slugify(title)),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            excerpt: excerpt.to_string(),
            date: "2024-03-15T00:00:00+00:00".to_string(),
        }
    }

    fn sample_index() -> Vec<SearchIndexEntry> {
        vec![
            entry("EKS Ingress", &["kubernetes", "aws"], "load balancer setup"),
            entry("Pod Identity", &["aws", "security"], "no secrets needed"),
        ]
    }

    fn titles(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.entry.title.as_str()).collect()
    }

    struct StubSource {
        result: fn() -> Result<Vec<SearchIndexEntry>, SearchIndexFetchError>,
        calls: Cell<usize>,
    }

    impl IndexSource for StubSource {
        fn fetch(&self) -> Result<Vec<SearchIndexEntry>, SearchIndexFetchError> {
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    fn ready_widget() -> SearchWidget {
        let mut w = SearchWidget::new(10, '/');
        let ticket = w.activate().unwrap();
        assert!(w.complete_load(ticket, Ok(sample_index())));
        w
    }

    // =========================================================================
    // Matching
    // =========================================================================

    #[test]
    fn tag_query_returns_both_entries() {
        let hits = search(&sample_index(), "aws", 10);
        assert_eq!(titles(&hits), vec!["EKS Ingress", "Pod Identity"]);
        assert!(hits.iter().all(|h| h.field == MatchField::Tag));
    }

    #[test]
    fn title_query_returns_only_title_match() {
        let hits = search(&sample_index(), "ingress", 10);
        assert_eq!(titles(&hits), vec!["EKS Ingress"]);
        assert_eq!(hits[0].field, MatchField::Title);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(search(&sample_index(), "zzz", 10).is_empty());
    }

    #[test]
    fn empty_and_blank_queries_match_nothing() {
        assert!(search(&sample_index(), "", 10).is_empty());
        assert!(search(&sample_index(), "   ", 10).is_empty());
    }

    #[test]
    fn query_is_trimmed_and_case_insensitive() {
        let hits = search(&sample_index(), "  POD ", 10);
        assert_eq!(titles(&hits), vec!["Pod Identity"]);
    }

    #[test]
    fn title_matches_rank_above_tag_and_excerpt() {
        let mut index = sample_index();
        index.push(entry("AWS Cost Notes", &[], "budgets"));
        index.push(entry("Networking", &[], "vpc and aws peering"));
        let hits = search(&index, "aws", 10);
        assert_eq!(
            titles(&hits),
            vec!["AWS Cost Notes", "EKS Ingress", "Pod Identity", "Networking"]
        );
        let fields: Vec<MatchField> = hits.iter().map(|h| h.field).collect();
        assert_eq!(
            fields,
            vec![
                MatchField::Title,
                MatchField::Tag,
                MatchField::Tag,
                MatchField::Excerpt
            ]
        );
    }

    #[test]
    fn results_capped_at_limit() {
        let index: Vec<_> = (0..25)
            .map(|i| entry(&format!("Post {i}"), &["aws"], ""))
            .collect();
        assert_eq!(search(&index, "aws", 10).len(), 10);
        assert_eq!(search(&index, "post", 3).len(), 3);
    }

    // =========================================================================
    // Widget state machine
    // =========================================================================

    #[test]
    fn widget_starts_idle() {
        let w = SearchWidget::new(10, '/');
        assert_eq!(w.state(), &WidgetState::Idle);
        assert_eq!(w.fetch_count(), 0);
    }

    #[test]
    fn shortcut_key_activates() {
        let mut w = SearchWidget::new(10, '/');
        assert!(w.on_key('a').is_none());
        assert_eq!(w.state(), &WidgetState::Idle);
        assert!(w.on_key('/').is_some());
        assert_eq!(w.state(), &WidgetState::Loading);
    }

    #[test]
    fn load_then_query_shows_results() {
        let mut w = ready_widget();
        assert_eq!(w.state(), &WidgetState::Ready);
        w.on_input("ingress");
        assert!(matches!(w.state(), WidgetState::ShowingResults { query, .. } if query == "ingress"));
        assert_eq!(titles(w.hits()), vec!["EKS Ingress"]);
    }

    #[test]
    fn query_without_match_shows_empty() {
        let mut w = ready_widget();
        w.on_input("zzz");
        assert_eq!(
            w.state(),
            &WidgetState::ShowingEmpty {
                query: "zzz".to_string()
            }
        );
        assert!(w.hits().is_empty());
    }

    #[test]
    fn empty_query_returns_to_ready_without_refetch() {
        let mut w = ready_widget();
        w.on_input("aws");
        w.on_input("");
        assert_eq!(w.state(), &WidgetState::Ready);
        assert!(w.hits().is_empty());
        assert_eq!(w.fetch_count(), 1);
    }

    #[test]
    fn index_fetched_at_most_once() {
        let source = StubSource {
            result: || Ok(sample_index()),
            calls: Cell::new(0),
        };
        let mut w = SearchWidget::new(10, '/');
        w.load_from(&source);
        w.load_from(&source);
        assert!(w.activate().is_none());
        assert!(w.on_key('/').is_none());
        w.on_input("aws");
        w.on_input("pod");
        assert_eq!(source.calls.get(), 1);
        assert_eq!(w.fetch_count(), 1);
    }

    #[test]
    fn typing_before_activation_loads_and_applies_query() {
        let mut w = SearchWidget::new(10, '/');
        let ticket = w.on_input("aw").unwrap();
        w.on_input("aws");
        assert_eq!(w.state(), &WidgetState::Loading);
        w.complete_load(ticket, Ok(sample_index()));
        assert_eq!(titles(w.hits()), vec!["EKS Ingress", "Pod Identity"]);
    }

    #[test]
    fn fetch_failure_is_errored_and_contained() {
        let source = StubSource {
            result: || Err(SearchIndexFetchError::Io(std::io::Error::other("offline"))),
            calls: Cell::new(0),
        };
        let mut w = SearchWidget::new(10, '/');
        w.load_from(&source);
        assert!(matches!(w.state(), WidgetState::Errored { message } if message.contains("offline")));
        // Further interaction is inert, no retry storm
        assert!(w.on_input("aws").is_none());
        assert!(w.on_key('/').is_none());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn teardown_discards_in_flight_load() {
        let mut w = SearchWidget::new(10, '/');
        let ticket = w.activate().unwrap();
        w.teardown();
        assert!(!w.complete_load(ticket, Ok(sample_index())));
        assert_eq!(w.state(), &WidgetState::Idle);
    }

    #[test]
    fn stale_ticket_ignored_after_reactivation() {
        let mut w = SearchWidget::new(10, '/');
        let stale = w.activate().unwrap();
        w.teardown();
        let fresh = w.activate().unwrap();
        assert_ne!(stale, fresh);
        assert!(!w.complete_load(stale, Ok(vec![])));
        assert!(w.complete_load(fresh, Ok(sample_index())));
        assert_eq!(w.state(), &WidgetState::Ready);
    }

    // =========================================================================
    // File source
    // =========================================================================

    #[test]
    fn file_source_reads_built_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("search.json");
        fs::write(&path, serde_json::to_string(&sample_index()).unwrap()).unwrap();
        let source = FileIndexSource::new(&path);
        assert_eq!(source.fetch().unwrap(), sample_index());
    }

    #[test]
    fn file_source_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let source = FileIndexSource::new(tmp.path().join("missing.json"));
        assert!(matches!(source.fetch(), Err(SearchIndexFetchError::Io(_))));
    }

    #[test]
    fn file_source_extra_fields_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("search.json");
        fs::write(
            &path,
            r#"[{"title":"x","url":"/x/","tags":[],"excerpt":"","date":"","body":"leak"}]"#,
        )
        .unwrap();
        assert!(matches!(
            FileIndexSource::new(&path).fetch(),
            Err(SearchIndexFetchError::Parse(_))
        ));
    }
}
