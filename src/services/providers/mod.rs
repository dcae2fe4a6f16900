//! External collaborators of the curation pipeline
//!
//! The media server (library reads, collection writes, account watchlist) and the
//! text completion service sit behind traits so the pipeline can be driven against
//! in-memory or mocked implementations.
use crate::{
    error::AppResult,
    models::{Account, CatalogItem, Collection, HistoryEntry, Library, MediaKind},
};

pub mod openai;
pub mod plex;

pub use openai::OpenAiProvider;
pub use plex::PlexServer;

/// Trait for media server connections
///
/// Watchlist operations act on the account owning the connection's credentials;
/// there is no way to address another account's watchlist.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaServer: Send + Sync {
    /// All accounts known to the server; the first is the owner/system account
    async fn system_accounts(&self) -> AppResult<Vec<Account>>;

    /// Look up a library section by its display name
    async fn library_section(&self, name: &str) -> AppResult<Library>;

    /// Most recent playback records for one account in one library, newest first
    async fn history(
        &self,
        library: &Library,
        account: &Account,
        max_results: usize,
    ) -> AppResult<Vec<HistoryEntry>>;

    /// Ranked catalog search on this server filtered by media kind
    async fn search(&self, query: &str, kind: MediaKind, limit: usize)
        -> AppResult<Vec<CatalogItem>>;

    /// Collection with exactly this title in the library, if any
    async fn find_collection(&self, library: &Library, title: &str)
        -> AppResult<Option<Collection>>;

    async fn collection_items(&self, collection: &Collection) -> AppResult<Vec<CatalogItem>>;

    async fn remove_collection_items(
        &self,
        collection: &Collection,
        items: &[CatalogItem],
    ) -> AppResult<()>;

    async fn add_collection_items(
        &self,
        collection: &Collection,
        items: &[CatalogItem],
    ) -> AppResult<()>;

    async fn create_collection(
        &self,
        library: &Library,
        title: &str,
        items: &[CatalogItem],
    ) -> AppResult<Collection>;

    async fn edit_summary(&self, collection: &Collection, summary: &str) -> AppResult<()>;

    /// Global (not library-scoped) catalog search
    async fn search_global(&self, query: &str, kind: MediaKind) -> AppResult<Vec<CatalogItem>>;

    /// Add an item from the global catalog to the connected account's watchlist
    async fn add_to_watchlist(&self, item: &CatalogItem) -> AppResult<()>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for stateless text completion services
///
/// Each call carries exactly one user prompt and no conversation history.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}
