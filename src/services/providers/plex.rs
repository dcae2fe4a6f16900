//! Plex Media Server provider
//!
//! Talks to the local server for accounts, history, search and collections, and to
//! the Plex discover provider for the global catalog and the account watchlist.
//! Every request carries the configured token, so watchlist writes always land on
//! the token owner's watchlist.
//!
//! API Flow:
//! 1. Connect: / → verifies the token and yields the machine identifier
//! 2. Reads: /accounts, /library/sections, /status/sessions/history/all, /hubs/search
//! 3. Collections: /library/sections/{key}/collections → /library/collections/{key}/...
//! 4. Watchlist: discover /library/search → /actions/addToWatchlist
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        plex::PlexResponse, Account, CatalogItem, Collection, HistoryEntry, Library, MediaKind,
    },
    services::providers::MediaServer,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client as HttpClient, RequestBuilder, StatusCode,
};

const CLIENT_IDENTIFIER: &str = "plex-curator";
const LIBRARY_PROVIDER: &str = "com.plexapp.plugins.library";
const COLLECTION_METADATA_TYPE: u8 = 18;

#[derive(Clone)]
pub struct PlexServer {
    http_client: HttpClient,
    base_url: String,
    discover_url: String,
    machine_identifier: String,
}

impl PlexServer {
    /// Opens an authenticated session against the configured server
    ///
    /// TLS verification is disabled unless `VERIFY_TLS` is set, since local servers
    /// commonly present self-signed certificates.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&config.plex_token)
            .map_err(|_| AppError::Config("PLEX_TOKEN is not a valid header value".to_string()))?;
        headers.insert("X-Plex-Token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Plex-Client-Identifier",
            HeaderValue::from_static(CLIENT_IDENTIFIER),
        );
        headers.insert("X-Plex-Product", HeaderValue::from_static(CLIENT_IDENTIFIER));

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        let base_url = config.plex_url.trim_end_matches('/').to_string();
        let root = send(http_client.get(format!("{}/", base_url))).await?;
        let machine_identifier = root.media_container.machine_identifier.ok_or_else(|| {
            AppError::ExternalApi("Plex server did not report a machine identifier".to_string())
        })?;

        tracing::info!(
            url = %base_url,
            machine_identifier = %machine_identifier,
            "Connected to Plex server"
        );

        Ok(Self {
            http_client,
            base_url,
            discover_url: config.plex_discover_url.trim_end_matches('/').to_string(),
            machine_identifier,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `server://` URI addressing a set of library items on this server
    fn items_uri(&self, items: &[CatalogItem]) -> String {
        let keys: Vec<&str> = items.iter().map(|i| i.rating_key.as_str()).collect();
        format!(
            "server://{}/{}/library/metadata/{}",
            self.machine_identifier,
            LIBRARY_PROVIDER,
            keys.join(",")
        )
    }
}

/// Hubs returned by `/hubs/search` that can hold items of the given kind
fn hub_holds(kind: MediaKind, hub_type: &str) -> bool {
    match kind {
        MediaKind::Show => matches!(hub_type, "show" | "season" | "episode"),
        MediaKind::Movie => hub_type == "movie",
    }
}

/// Discover provider `searchTypes` value
fn discover_search_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Show => "tv",
        MediaKind::Movie => "movies",
    }
}

/// Sends a request and decodes the `MediaContainer` envelope
///
/// Mutating endpoints answer with an empty body, which decodes as an empty container.
async fn send(request: RequestBuilder) -> AppResult<PlexResponse> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(response.url().path().to_string()));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalApi(format!(
            "Plex API returned status {}: {}",
            status, body
        )));
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(PlexResponse::default());
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(error = %e, response = %text, "Failed to deserialize Plex response");
        AppError::ExternalApi(format!("Failed to parse Plex response: {}", e))
    })
}

#[async_trait::async_trait]
impl MediaServer for PlexServer {
    async fn system_accounts(&self) -> AppResult<Vec<Account>> {
        let response = send(self.http_client.get(self.url("/accounts"))).await?;
        Ok(response
            .media_container
            .accounts
            .into_iter()
            .map(Account::from)
            .collect())
    }

    async fn library_section(&self, name: &str) -> AppResult<Library> {
        let response = send(self.http_client.get(self.url("/library/sections"))).await?;
        response
            .media_container
            .directories
            .into_iter()
            .find(|dir| dir.title == name)
            .map(Library::from)
            .ok_or_else(|| AppError::NotFound(format!("library section '{}'", name)))
    }

    async fn history(
        &self,
        library: &Library,
        account: &Account,
        max_results: usize,
    ) -> AppResult<Vec<HistoryEntry>> {
        let account_id = account.id.to_string();
        let size = max_results.to_string();
        let response = send(
            self.http_client
                .get(self.url("/status/sessions/history/all"))
                .query(&[
                    ("sort", "viewedAt:desc"),
                    ("librarySectionID", library.key.as_str()),
                    ("accountID", account_id.as_str()),
                    ("X-Plex-Container-Start", "0"),
                    ("X-Plex-Container-Size", size.as_str()),
                ]),
        )
        .await?;

        let mut entries: Vec<HistoryEntry> = response
            .media_container
            .metadata
            .into_iter()
            .map(HistoryEntry::from)
            .collect();
        entries.truncate(max_results);

        tracing::debug!(
            library = %library.title,
            account_id = account.id,
            entries = entries.len(),
            "History fetched"
        );

        Ok(entries)
    }

    async fn search(
        &self,
        query: &str,
        kind: MediaKind,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let limit_param = limit.to_string();
        let response = send(
            self.http_client
                .get(self.url("/hubs/search"))
                .query(&[("query", query), ("limit", limit_param.as_str())]),
        )
        .await?;

        let items: Vec<CatalogItem> = response
            .media_container
            .hubs
            .into_iter()
            .filter(|hub| hub_holds(kind, &hub.hub_type))
            .flat_map(|hub| hub.metadata)
            .filter_map(|meta| meta.into_catalog_item())
            .take(limit)
            .collect();

        tracing::debug!(query = %query, kind = %kind, results = items.len(), "Catalog search completed");

        Ok(items)
    }

    async fn find_collection(
        &self,
        library: &Library,
        title: &str,
    ) -> AppResult<Option<Collection>> {
        let path = format!("/library/sections/{}/collections", library.key);
        let response = send(
            self.http_client
                .get(self.url(&path))
                .query(&[("title", title)]),
        )
        .await?;

        Ok(response
            .media_container
            .metadata
            .into_iter()
            .filter(|meta| meta.title.as_deref() == Some(title))
            .find_map(|meta| meta.into_collection(&library.key)))
    }

    async fn collection_items(&self, collection: &Collection) -> AppResult<Vec<CatalogItem>> {
        let path = format!("/library/collections/{}/children", collection.rating_key);
        let response = send(self.http_client.get(self.url(&path))).await?;
        Ok(response
            .media_container
            .metadata
            .into_iter()
            .filter_map(|meta| meta.into_catalog_item())
            .collect())
    }

    async fn remove_collection_items(
        &self,
        collection: &Collection,
        items: &[CatalogItem],
    ) -> AppResult<()> {
        for item in items {
            let path = format!(
                "/library/collections/{}/items/{}",
                collection.rating_key, item.rating_key
            );
            send(self.http_client.delete(self.url(&path))).await?;
        }
        Ok(())
    }

    async fn add_collection_items(
        &self,
        collection: &Collection,
        items: &[CatalogItem],
    ) -> AppResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let path = format!("/library/collections/{}/items", collection.rating_key);
        let uri = self.items_uri(items);
        send(
            self.http_client
                .put(self.url(&path))
                .query(&[("uri", uri.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn create_collection(
        &self,
        library: &Library,
        title: &str,
        items: &[CatalogItem],
    ) -> AppResult<Collection> {
        let metadata_type = library.kind.plex_type().to_string();
        let uri = self.items_uri(items);
        let response = send(
            self.http_client
                .post(self.url("/library/collections"))
                .query(&[
                    ("type", metadata_type.as_str()),
                    ("title", title),
                    ("smart", "0"),
                    ("sectionId", library.key.as_str()),
                    ("uri", uri.as_str()),
                ]),
        )
        .await?;

        response
            .media_container
            .metadata
            .into_iter()
            .find_map(|meta| meta.into_collection(&library.key))
            .ok_or_else(|| {
                AppError::ExternalApi(format!(
                    "Plex did not return the created collection '{}'",
                    title
                ))
            })
    }

    async fn edit_summary(&self, collection: &Collection, summary: &str) -> AppResult<()> {
        let path = format!("/library/sections/{}/all", collection.library_key);
        let metadata_type = COLLECTION_METADATA_TYPE.to_string();
        send(
            self.http_client
                .put(self.url(&path))
                .query(&[
                    ("type", metadata_type.as_str()),
                    ("id", collection.rating_key.as_str()),
                    ("summary.value", summary),
                    ("summary.locked", "1"),
                ]),
        )
        .await?;
        Ok(())
    }

    async fn search_global(&self, query: &str, kind: MediaKind) -> AppResult<Vec<CatalogItem>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/library/search", self.discover_url);
        let response = send(self.http_client.get(&url).query(&[
            ("query", query),
            ("searchTypes", discover_search_type(kind)),
            ("searchProviders", "discover"),
            ("includeMetadata", "1"),
        ]))
        .await?;

        let wanted = kind.to_string();
        let items: Vec<CatalogItem> = response
            .media_container
            .search_results
            .into_iter()
            .flat_map(|group| group.results)
            .filter_map(|result| result.metadata)
            .filter(|meta| meta.item_type.as_deref() == Some(wanted.as_str()))
            .filter_map(|meta| meta.into_catalog_item())
            .collect();

        tracing::debug!(query = %query, kind = %kind, results = items.len(), "Global search completed");

        Ok(items)
    }

    async fn add_to_watchlist(&self, item: &CatalogItem) -> AppResult<()> {
        let url = format!("{}/actions/addToWatchlist", self.discover_url);
        send(
            self.http_client
                .put(&url)
                .query(&[("ratingKey", item.rating_key.as_str())]),
        )
        .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "plex"
    }
}
