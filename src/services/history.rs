use std::collections::BTreeSet;

use crate::{
    models::{Account, HistoryEntry, Library},
    services::providers::MediaServer,
};

/// Reduces playback records to the unique canonical titles they reference
///
/// Order is alphabetical so log output stays stable between runs.
pub fn canonical_titles(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(HistoryEntry::canonical_title)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fetches recent history for one account in one library and returns its titles
///
/// Fetch failures are logged and yield an empty list; they never propagate.
pub async fn collect_watched_titles(
    server: &dyn MediaServer,
    library: &Library,
    account: &Account,
    sample_size: usize,
) -> Vec<String> {
    tracing::info!(
        library = %library.title,
        account = %account.display_name(),
        sample_size,
        "Fetching watch history"
    );

    match server.history(library, account, sample_size).await {
        Ok(entries) => {
            let titles = canonical_titles(&entries);
            tracing::info!(
                library = %library.title,
                account = %account.display_name(),
                records = entries.len(),
                unique_titles = titles.len(),
                titles = ?titles,
                "Collected watch history"
            );
            titles
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                library = %library.title,
                account = %account.display_name(),
                "Could not get watch history"
            );
            Vec::new()
        }
    }
}
