//! Development server.
//!
//! Builds the site once, then serves the output directory over HTTP with
//! `tiny_http`. When watching is enabled a second thread rebuilds the site
//! on content changes (see [`crate::watch`]).
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (notify events) │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    serve files from        scan + generate
//!      output dir  ◀──────── (atomic swap)
//! ```
//!
//! Requests resolve to a file, then to `index.html` inside a directory,
//! then to 404. Paths containing `..` are rejected.

use crate::config::ServeConfig;
use crate::generate::{self, GenerateError};
use crate::scan::{self, ScanError};
use crate::watch;
use std::fs;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{info, warn};

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid interface address {0:?}")]
    Interface(String),
    #[error("Failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        attempts: u16,
        first: u16,
        last: u16,
        message: String,
    },
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Initial build failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Initial build failed: {0}")]
    Generate(#[from] GenerateError),
}

/// Options resolved from the CLI on top of `[serve]` config.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    pub port: Option<u16>,
    pub no_watch: bool,
}

/// Build the site and serve it until Ctrl+C.
pub fn serve_site(options: &ServeOptions) -> Result<(), ServeError> {
    let site = scan::scan(&options.source)?;
    let summary = generate::generate(&site, &options.source, &options.output)?;
    info!(documents = summary.documents, "initial build complete");

    let ServeConfig {
        interface,
        port,
        watch: watch_enabled,
    } = site.config.serve.clone();
    let interface: IpAddr = interface
        .parse()
        .map_err(|_| ServeError::Interface(interface.clone()))?;
    let base_port = options.port.unwrap_or(port);

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        info!("shutting down");
        server_for_signal.unblock();
    })?;

    println!("Serving {} at http://{}", options.output.display(), addr);

    if watch_enabled && !options.no_watch {
        let source = options.source.clone();
        let output = options.output.clone();
        std::thread::spawn(move || {
            if let Err(e) = watch::watch_for_changes_blocking(&source, &output) {
                warn!("watcher stopped: {e}");
            }
        });
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &options.output) {
            warn!("request error: {e}");
        }
    }
    Ok(())
}

fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::new();
    let mut last_port = base_port;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        last_port = port;
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    info!("port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServeError::Bind {
        attempts: max_retries,
        first: base_port,
        last: last_port,
        message: last_error,
    })
}

// ============================================================================
// Request handling
// ============================================================================

fn handle_request(request: Request, serve_root: &Path) -> std::io::Result<()> {
    match resolve_request_path(serve_root, request.url()) {
        Some(path) => serve_file(request, &path),
        None => serve_not_found(request),
    }
}

/// Map a request URL to a file under `serve_root`.
///
/// Decodes percent escapes and drops the query string. Returns `None` for
/// missing files and for paths that try to leave `serve_root`.
fn resolve_request_path(serve_root: &Path, url: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url).ok()?;
    let without_query = decoded.split(['?', '#']).next().unwrap_or_default();
    let relative = Path::new(without_query.trim_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let local = serve_root.join(relative);
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

fn serve_file(request: Request, path: &Path) -> std::io::Result<()> {
    let content = fs::read(path)?;
    request.respond(with_content_type(Response::from_data(content), path))
}

fn serve_not_found(request: Request) -> std::io::Result<()> {
    let response = Response::from_string("404 Not Found").with_status_code(StatusCode(404));
    request.respond(with_content_type(response, Path::new("404.txt")))
}

fn with_content_type<R: Read>(response: Response<R>, path: &Path) -> Response<R> {
    match Header::from_bytes("Content-Type", guess_content_type(path)) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

/// MIME type from file extension; `application/octet-stream` otherwise.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/rss+xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        _ => "application/octet-stream",
    }
}
