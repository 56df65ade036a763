//! Search index emission.
//!
//! Projects every document to a [`SearchIndexEntry`] and serializes the whole set
//! as one compact JSON array. The projection is the only document data the
//! browser ever sees: title, url, tags, excerpt, date.

use crate::site::Site;
use crate::types::SearchIndexEntry;

/// Entries for every document, newest first, url ascending on equal dates.
pub fn build_entries(site: &Site) -> Vec<SearchIndexEntry> {
    let mut dated: Vec<_> = site
        .documents
        .iter()
        .map(|d| (d.publish_date, d.search_entry()))
        .collect();
    dated.sort_by(|(da, a), (db, b)| db.cmp(da).then_with(|| a.url.cmp(&b.url)));
    dated.into_iter().map(|(_, entry)| entry).collect()
}

pub fn to_json(entries: &[SearchIndexEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}
