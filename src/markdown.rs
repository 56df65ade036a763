//! Markdown rendering.
//!
//! Wraps pulldown-cmark with the extensions a technology blog needs (tables,
//! footnotes, strikethrough, task lists, `{#id}` heading attributes) and
//! derives three things from the same event stream:
//!
//! - the HTML body, with every heading carrying an anchor id
//! - a table of contents built from those headings
//! - the plain text of the body, used for excerpts and search previews
//!
//! Heading ids are derived with [`slugify`] and made unique within the
//! document (`setup`, `setup-1`, `setup-2`). An explicit `{#id}` wins.

use crate::naming::slugify;
use crate::types::TocEntry;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::HashSet;

/// Output of [`render`].
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Body text with markup removed and whitespace collapsed.
    pub plain_text: String,
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render a Markdown body.
pub fn render(source: &str) -> Rendered {
    let mut events: Vec<Event> = Parser::new_ext(source, options()).collect();

    let toc = assign_heading_ids(&mut events);
    let plain_text = plain_text(&events);

    let mut html = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut html, events.into_iter());

    Rendered {
        html,
        toc,
        plain_text,
    }
}

/// Give every heading a unique id and return the headings in order.
fn assign_heading_ids(events: &mut [Event]) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    // Explicit ids are reserved up front so generated ones never collide.
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            used.insert(id.to_string());
        }
    }

    let mut i = 0;
    while i < events.len() {
        let Event::Start(Tag::Heading { level, id, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let level = *level as u8;
        let explicit = id.as_ref().map(|s| s.to_string());

        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() {
            match &events[end] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                _ => {}
            }
            end += 1;
        }
        let text = text.trim().to_string();

        let anchor = match explicit {
            Some(id) => id,
            None => {
                let base = match slugify(&text) {
                    s if s.is_empty() => "section".to_string(),
                    s => s,
                };
                let anchor = unique_id(&base, &used);
                used.insert(anchor.clone());
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                    *id = Some(CowStr::from(anchor.clone()));
                }
                anchor
            }
        };

        toc.push(TocEntry {
            level,
            id: anchor,
            text,
        });
        i = end + 1;
    }
    toc
}

fn unique_id(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Collect readable text, separating blocks with spaces.
fn plain_text(events: &[Event]) -> String {
    let mut raw = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => raw.push_str(t),
            Event::SoftBreak | Event::HardBreak => raw.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableCell,
            ) => raw.push(' '),
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut plain text down to `max` characters, appending `…` when truncated.
///
/// Cuts at the last word boundary inside the limit when there is one.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let cut = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}
