//! Rebuild-on-change for the development server.
//!
//! Watches the content directory with `notify`, batches bursts of events
//! with a debouncer, then runs a full scan and generate. A failed rebuild is
//! logged and the previously published output stays in place, because
//! [`generate::generate`] only swaps in a completely written site.
//!
//! ```text
//! notify events ──▶ Debouncer (300ms) ──▶ rebuild() ──▶ scan + generate
//! ```

use crate::generate;
use crate::scan;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEBOUNCE_MS: u64 = 300;

/// Editor swap files and hidden entries never trigger a rebuild.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Whether a changed path can affect the built site.
///
/// Paths inside `output` are ignored so a build can't retrigger itself when
/// the output lives under the content directory, as are hidden directories
/// (the build's staging directories are hidden).
fn is_relevant_path(path: &Path, source: &Path, output: &Path) -> bool {
    if path.starts_with(output) || is_temp_file(path) {
        return false;
    }
    let relative = path.strip_prefix(source).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

const fn is_relevant_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Debounce State
// =============================================================================

/// Collects paths until events have been quiet for [`DEBOUNCE_MS`].
struct Debouncer {
    pending: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            pending: BTreeSet::new(),
            last_event: None,
            window,
        }
    }

    fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        let before = self.pending.len();
        self.pending.extend(paths);
        if self.pending.len() > before || self.last_event.is_some() {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.window)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            self.window
        }
    }
}

/// Full rebuild. Returns whether it succeeded.
fn rebuild(source: &Path, output: &Path, changed: &[PathBuf]) -> bool {
    let names: Vec<String> = changed
        .iter()
        .map(|p| p.strip_prefix(source).unwrap_or(p).display().to_string())
        .collect();
    info!(changed = %names.join(", "), "rebuilding");

    let result = scan::scan(source)
        .map_err(|e| e.to_string())
        .and_then(|site| {
            generate::generate(&site, source, output).map_err(|e| e.to_string())
        });
    match result {
        Ok(summary) => {
            println!("Rebuilt {} documents", summary.documents);
            true
        }
        Err(e) => {
            warn!("rebuild failed, keeping previous output: {e}");
            false
        }
    }
}

/// Watch `source` and rebuild into `output` until the event channel closes.
pub fn watch_for_changes_blocking(source: &Path, output: &Path) -> notify::Result<()> {
    let source = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());
    let output = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(&source, RecursiveMode::Recursive)?;
    info!(source = %source.display(), "watching for changes");

    let mut debouncer = Debouncer::new(Duration::from_millis(DEBOUNCE_MS));
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant_event(&event) => {
                let paths: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| is_relevant_path(p, &source, &output))
                    .collect();
                debug!(count = paths.len(), "change event");
                debouncer.add(paths);
            }
            Ok(Err(e)) => warn!("watch error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                rebuild(&source, &output, &debouncer.take());
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }
    Ok(())
}
