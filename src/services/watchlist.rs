use crate::{error::AppResult, models::MediaKind, services::providers::MediaServer};

/// Per-title results of a watchlist publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistSummary {
    pub added: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

/// Adds each recommended title to the connected account's watchlist
///
/// Titles are resolved against the global catalog, not a library. A title that cannot
/// be found is expected and only warned about; any other failure is logged and the
/// next title is tried. Items added before a failure stay added.
pub async fn publish_watchlist(
    server: &dyn MediaServer,
    titles: &[String],
    kind: MediaKind,
) -> WatchlistSummary {
    tracing::info!(count = titles.len(), kind = %kind, "Adding recommendations to watchlist");
    let mut summary = WatchlistSummary::default();

    for title in titles {
        match add_title(server, title, kind).await {
            Ok(true) => {
                tracing::info!(title = %title, "Added to watchlist");
                summary.added.push(title.clone());
            }
            Ok(false) => {
                tracing::info!(title = %title, "Not found in global Plex catalog");
                summary.missing.push(title.clone());
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(title = %title, "Item not found");
                summary.missing.push(title.clone());
            }
            Err(e) => {
                tracing::error!(error = %e, title = %title, "Failed to add to watchlist");
                summary.failed.push(title.clone());
            }
        }
    }

    summary
}

/// Returns `Ok(false)` when the global catalog has no result for the title
async fn add_title(server: &dyn MediaServer, title: &str, kind: MediaKind) -> AppResult<bool> {
    let results = server.search_global(title.trim(), kind).await?;
    match results.into_iter().next() {
        Some(item) => {
            server.add_to_watchlist(&item).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{CatalogItem, CatalogItemKind},
        services::providers::MockMediaServer,
    };

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let mut server = MockMediaServer::new();
        server.expect_search_global().returning(|query, _| match query {
            "Gone" => Ok(Vec::new()),
            "Removed" => Err(AppError::NotFound("/library/search".to_string())),
            _ => Ok(vec![CatalogItem {
                rating_key: format!("key-{}", query),
                title: query.to_string(),
                kind: CatalogItemKind::Movie,
            }]),
        });
        server
            .expect_add_to_watchlist()
            .times(2)
            .returning(|item| {
                if item.title == "Flaky" {
                    Err(AppError::ExternalApi("status 503".to_string()))
                } else {
                    Ok(())
                }
            });

        let summary = publish_watchlist(
            &server,
            &titles(&["Arrival", "Gone", "Removed", "Flaky"]),
            MediaKind::Movie,
        )
        .await;

        assert_eq!(summary.added, titles(&["Arrival"]));
        assert_eq!(summary.missing, titles(&["Gone", "Removed"]));
        assert_eq!(summary.failed, titles(&["Flaky"]));
    }

    #[tokio::test]
    async fn test_takes_first_global_result() {
        let mut server = MockMediaServer::new();
        server.expect_search_global().returning(|_, _| {
            Ok(vec![
                CatalogItem {
                    rating_key: "first".to_string(),
                    title: "Dark".to_string(),
                    kind: CatalogItemKind::FullSeries,
                },
                CatalogItem {
                    rating_key: "second".to_string(),
                    title: "Dark Matter".to_string(),
                    kind: CatalogItemKind::FullSeries,
                },
            ])
        });
        server
            .expect_add_to_watchlist()
            .times(1)
            .returning(|item| {
                assert_eq!(item.rating_key, "first");
                Ok(())
            });

        let summary = publish_watchlist(&server, &titles(&["Dark"]), MediaKind::Show).await;
        assert_eq!(summary.added.len(), 1);
    }
}
