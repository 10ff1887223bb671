//! HTML index of available streams.

use std::fmt::Write as _;

use axum::extract::State;
use axum::response::Html;
use tracing::warn;

use crate::context::AppContext;

/// Landing page listing every rendition currently in the cache.
pub async fn index(State(ctx): State<AppContext>) -> Html<String> {
    let entries = ctx.store.cache_entries().unwrap_or_else(|err| {
        warn!(error = %err, "Cache listing failed");
        Vec::new()
    });

    let mut links = String::new();
    for entry in &entries {
        let _ = write!(
            links,
            "<li><a href=\"/{file}\">{file}</a> (created: {created})</li>",
            file = entry.file_name,
            created = entry.modified.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }

    Html(format!("<h3>Available Video Streams</h3><ul>{links}</ul>"))
}
