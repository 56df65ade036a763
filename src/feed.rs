//! RSS feed generation.
//!
//! Emits an RSS 2.0 channel with the newest `feed.limit` posts. Pages never
//! appear in the feed. `lastBuildDate` is the newest post's date rather than
//! the wall clock, so rebuilding unchanged content yields the same bytes.
//!
//! RSS links must be absolute, so the feed is only written when `base_url`
//! is set.

use crate::site::Site;
use crate::types::Document;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("RSS validation failed: {0}")]
    Invalid(String),
}

/// Render the feed XML, or `None` when the feed is disabled or `base_url`
/// is empty.
pub fn render(site: &Site) -> Result<Option<String>, FeedError> {
    let config = &site.config;
    if !config.feed.enabled {
        return Ok(None);
    }
    if config.base_url.is_empty() {
        warn!("feed skipped: base_url is not set");
        return Ok(None);
    }

    let posts: Vec<&Document> = site.posts().take(config.feed.limit).collect();
    let items: Vec<rss::Item> = posts.iter().map(|doc| item(site, doc)).collect();

    let mut builder = ChannelBuilder::default();
    builder
        .title(config.title.clone())
        .link(config.absolute_url("/"))
        .description(config.description.clone())
        .language(Some(config.language.clone()))
        .generator(Some(format!("simple-blog {}", env!("CARGO_PKG_VERSION"))))
        .items(items);
    if let Some(newest) = posts.first() {
        builder.last_build_date(Some(newest.publish_date.to_rfc2822()));
    }
    let channel = builder.build();

    channel
        .validate()
        .map_err(|e| FeedError::Invalid(e.to_string()))?;
    Ok(Some(channel.to_string()))
}

fn item(site: &Site, doc: &Document) -> rss::Item {
    let link = site.config.absolute_url(&doc.permalink);
    let categories = doc
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(Some(doc.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(Some(
            doc.description.clone().unwrap_or_else(|| doc.excerpt.clone()),
        ))
        .pub_date(Some(doc.publish_date.to_rfc2822()))
        .categories(categories)
        .build()
}
