use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppResult,
    models::{Account, Library, Recommendation},
    services::{
        collections::{publish_collection, CollectionRequest},
        history::collect_watched_titles,
        providers::{CompletionProvider, MediaServer, OpenAiProvider, PlexServer},
        recommendations::request_recommendations,
        watchlist::publish_watchlist,
    },
};

/// Recommendations produced for one library
#[derive(Debug, Clone)]
pub struct LibraryRecommendation {
    pub library: Library,
    pub recommendation: Recommendation,
}

/// Recommendations produced for one account, in configured library order
#[derive(Debug, Clone)]
pub struct AccountRecommendations {
    pub account: Account,
    pub libraries: Vec<LibraryRecommendation>,
}

/// Collection title for a library, suffixed with the account unless it is the target account
pub fn collection_name(config: &Config, library_title: &str, account_name: &str) -> String {
    if config.is_target_account(account_name) {
        format!("{} - {}", config.collection_title, library_title)
    } else {
        format!(
            "{} - {} - For {}",
            config.collection_title, library_title, account_name
        )
    }
}

/// Resolves the configured library names once per pass
///
/// A name the server does not know is skipped; any other failure aborts the pass.
async fn resolve_libraries(config: &Config, server: &dyn MediaServer) -> AppResult<Vec<Library>> {
    let mut libraries = Vec::with_capacity(config.library_names.len());
    for name in &config.library_names {
        match server.library_section(name).await {
            Ok(library) => libraries.push(library),
            Err(e) if e.is_not_found() => {
                tracing::warn!(library = %name, "Library section not found, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(libraries)
}

/// Collects history and requests recommendations for every non-owner account
///
/// Failures for one (account, library) pair are logged and skipped. Errors listing
/// accounts or libraries are returned and abort the pass.
pub async fn gather_recommendations(
    config: &Config,
    server: &dyn MediaServer,
    completion: &dyn CompletionProvider,
) -> AppResult<Vec<AccountRecommendations>> {
    let accounts = server.system_accounts().await?;
    tracing::info!(count = accounts.len(), "Found system accounts");

    let libraries = resolve_libraries(config, server).await?;
    let mut gathered = Vec::new();

    // The first account is the server owner/system account
    for account in accounts.iter().skip(1) {
        let account_name = account.display_name();
        tracing::info!(account = %account_name, account_id = account.id, "Processing account");

        let mut per_library = Vec::new();
        for library in &libraries {
            tracing::info!(
                account = %account_name,
                library = %library.title,
                kind = %library.kind,
                "Processing library"
            );

            let watched =
                collect_watched_titles(server, library, account, config.history_size).await;
            if watched.is_empty() {
                tracing::info!(
                    account = %account_name,
                    library = %library.title,
                    "No watch history found, skipping"
                );
                continue;
            }

            match request_recommendations(
                completion,
                &watched,
                library.kind,
                config.recommended_count,
            )
            .await
            {
                Ok(recommendation) => {
                    tracing::info!(
                        account = %account_name,
                        library = %library.title,
                        recommended = recommendation.titles.len(),
                        "Recommendations received"
                    );
                    per_library.push(LibraryRecommendation {
                        library: library.clone(),
                        recommendation,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        account = %account_name,
                        library = %library.title,
                        "Recommendation request failed"
                    );
                }
            }
        }

        if !per_library.is_empty() {
            gathered.push(AccountRecommendations {
                account: account.clone(),
                libraries: per_library,
            });
        }
    }

    Ok(gathered)
}

/// Applies gathered recommendations as collections and, for the target account only,
/// watchlist entries
pub async fn publish_recommendations(
    config: &Config,
    server: &dyn MediaServer,
    gathered: &[AccountRecommendations],
) {
    for entry in gathered {
        let account_name = entry.account.display_name();
        let is_target = config.is_target_account(&account_name);
        tracing::info!(account = %account_name, "Creating collections for account");

        for item in &entry.libraries {
            let recommendation = &item.recommendation;
            if recommendation.titles.is_empty() {
                continue;
            }

            if config.create_collections {
                let name = collection_name(config, &item.library.title, &account_name);
                let request = CollectionRequest {
                    library: &item.library,
                    name: &name,
                    titles: &recommendation.titles,
                    description: &recommendation.description,
                    kind: item.library.kind,
                    minimum_matches: config.minimum_matches,
                    search_limit: config.search_limit,
                };
                match publish_collection(server, request).await {
                    Ok(outcome) => {
                        tracing::debug!(collection = %name, outcome = ?outcome, "Collection publish finished");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, collection = %name, "Collection publish failed");
                    }
                }
            }

            // Watchlists are personal: only the connected target account's can be written
            if config.add_to_watchlist && is_target {
                let summary =
                    publish_watchlist(server, &recommendation.titles, item.library.kind).await;
                tracing::info!(
                    account = %account_name,
                    library = %item.library.title,
                    added = summary.added.len(),
                    missing = summary.missing.len(),
                    failed = summary.failed.len(),
                    "Watchlist publish finished"
                );
            }
        }
    }
}

/// One full pass over an established connection
pub async fn run_pass(
    config: &Config,
    server: &dyn MediaServer,
    completion: &dyn CompletionProvider,
) -> AppResult<()> {
    let gathered = gather_recommendations(config, server, completion).await?;
    publish_recommendations(config, server, &gathered).await;
    Ok(())
}

/// Connects and runs one pass; only a connection failure is returned
async fn run_once(config: &Config, completion: &dyn CompletionProvider) -> AppResult<()> {
    tracing::info!("Starting collection run");

    let server = match PlexServer::connect(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Plex authorization error");
            return Err(e);
        }
    };

    complete_pass(config, &server, completion).await;
    Ok(())
}

/// Runs a pass and logs its failure; returns whether the pass finished
///
/// A failed pass never ends the loop, the next one is attempted after the usual wait.
async fn complete_pass(
    config: &Config,
    server: &dyn MediaServer,
    completion: &dyn CompletionProvider,
) -> bool {
    match run_pass(config, server, completion).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                error = %e,
                provider = server.name(),
                "Error during library processing, abandoning this pass"
            );
            false
        }
    }
}

fn next_run_at(wait_seconds: u64) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::try_seconds(i64::try_from(wait_seconds).ok()?)?;
    Utc::now().checked_add_signed(delta)
}

/// Runs passes forever, sleeping between them
///
/// Returns only when the media server connection cannot be established.
pub async fn run(config: &Config) -> AppResult<()> {
    let completion = OpenAiProvider::from_config(config);
    tracing::info!(provider = completion.name(), model = %config.openai_model, "Completion provider ready");

    loop {
        let pass_id = Uuid::new_v4();
        run_once(config, &completion)
            .instrument(tracing::info_span!("pass", pass_id = %pass_id))
            .await?;

        match next_run_at(config.wait_seconds) {
            Some(at) => tracing::info!(next_run = %at.to_rfc3339(), "Waiting on next call"),
            None => tracing::info!(seconds = config.wait_seconds, "Waiting on next call"),
        }
        tokio::time::sleep(Duration::from_secs(config.wait_seconds)).await;
    }
}
