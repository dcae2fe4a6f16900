use crate::{
    error::AppResult,
    models::{CatalogItem, CatalogItemKind, MediaKind},
    services::providers::MediaServer,
};

/// Picks the best candidate for the expected kind from ranked search results
///
/// Show searches only accept whole series, never seasons or episodes; movie searches
/// take the top hit regardless of its concrete type.
pub fn select_match(results: Vec<CatalogItem>, kind: MediaKind) -> Option<CatalogItem> {
    match kind {
        MediaKind::Show => results
            .into_iter()
            .find(|item| item.kind == CatalogItemKind::FullSeries),
        MediaKind::Movie => results.into_iter().next(),
    }
}

/// Resolves one free-text title against the server catalog
pub async fn match_title(
    server: &dyn MediaServer,
    title: &str,
    kind: MediaKind,
    limit: usize,
) -> AppResult<Option<CatalogItem>> {
    let results = server.search(title.trim(), kind, limit).await?;
    Ok(select_match(results, kind))
}
