use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{CatalogItem, Collection, Library, MediaKind},
    services::{matcher::match_title, providers::MediaServer},
};

/// Parameters for publishing one collection
#[derive(Debug, Clone)]
pub struct CollectionRequest<'a> {
    pub library: &'a Library,
    pub name: &'a str,
    pub titles: &'a [String],
    pub description: &'a str,
    pub kind: MediaKind,
    pub minimum_matches: i64,
    pub search_limit: usize,
}

/// What publishing did to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Too few titles matched; nothing was written
    Skipped { matched: usize },
    Updated { matched: usize },
    Created { matched: usize },
}

/// Resolves every title against the catalog, keeping successful matches in order
///
/// Search failures count as misses. Titles resolving to an item already matched are
/// collapsed.
pub async fn resolve_titles(
    server: &dyn MediaServer,
    titles: &[String],
    kind: MediaKind,
    limit: usize,
) -> Vec<CatalogItem> {
    let mut matched = Vec::new();
    let mut seen = HashSet::new();

    for title in titles {
        match match_title(server, title, kind, limit).await {
            Ok(Some(item)) => {
                tracing::info!(title = %title, rating_key = %item.rating_key, "Found in catalog");
                if seen.insert(item.rating_key.clone()) {
                    matched.push(item);
                }
            }
            Ok(None) => {
                tracing::info!(title = %title, "Not found or incorrect type");
            }
            Err(e) => {
                tracing::warn!(error = %e, title = %title, "Catalog search failed");
            }
        }
    }

    matched
}

/// Creates or replaces a collection with the matched recommendations
///
/// An existing collection is emptied and refilled so repeated runs never accumulate
/// stale items. Nothing is written unless strictly more than `minimum_matches`
/// titles resolved.
pub async fn publish_collection(
    server: &dyn MediaServer,
    request: CollectionRequest<'_>,
) -> AppResult<PublishOutcome> {
    tracing::info!(
        collection = %request.name,
        library = %request.library.title,
        "Creating or updating collection"
    );

    let items = resolve_titles(server, request.titles, request.kind, request.search_limit).await;
    let matched = items.len();

    if !exceeds_minimum(matched, request.minimum_matches) {
        tracing::info!(
            collection = %request.name,
            matched,
            minimum = request.minimum_matches,
            "Not enough items were found to create or update the collection"
        );
        return Ok(PublishOutcome::Skipped { matched });
    }

    match lookup_collection(server, request.library, request.name).await? {
        Some(collection) => {
            replace_items(server, &collection, &items).await?;
            server.edit_summary(&collection, request.description).await?;
            tracing::info!(collection = %request.name, matched, "Updated pre-existing collection");
            Ok(PublishOutcome::Updated { matched })
        }
        None => {
            tracing::info!(collection = %request.name, "Creating new collection");
            let collection = server
                .create_collection(request.library, request.name, &items)
                .await?;
            server.edit_summary(&collection, request.description).await?;
            tracing::info!(
                collection = %request.name,
                rating_key = %collection.rating_key,
                matched,
                "Added new collection"
            );
            Ok(PublishOutcome::Created { matched })
        }
    }
}

fn exceeds_minimum(matched: usize, minimum: i64) -> bool {
    i64::try_from(matched).map_or(true, |matched| matched > minimum)
}

/// A `NotFound` from the lookup is the same branch as an empty result
async fn lookup_collection(
    server: &dyn MediaServer,
    library: &Library,
    name: &str,
) -> AppResult<Option<Collection>> {
    match server.find_collection(library, name).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

async fn replace_items(
    server: &dyn MediaServer,
    collection: &Collection,
    items: &[CatalogItem],
) -> AppResult<()> {
    let current = server.collection_items(collection).await?;
    if !current.is_empty() {
        server.remove_collection_items(collection, &current).await?;
    }
    server.add_collection_items(collection, items).await
}
