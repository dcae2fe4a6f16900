use serde::Deserialize;

use super::{Account, CatalogItem, CatalogItemKind, Collection, HistoryEntry, Library, MediaKind};

// ============================================================================
// Plex Media Server API Types
// ============================================================================

/// Every Plex JSON response wraps its payload in a `MediaContainer`
#[derive(Debug, Default, Deserialize)]
pub struct PlexResponse {
    #[serde(rename = "MediaContainer", default)]
    pub media_container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContainer {
    #[serde(default)]
    pub machine_identifier: Option<String>,
    #[serde(rename = "Account", default)]
    pub accounts: Vec<PlexAccount>,
    #[serde(rename = "Directory", default)]
    pub directories: Vec<PlexDirectory>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexMetadata>,
    #[serde(rename = "Hub", default)]
    pub hubs: Vec<PlexHub>,
    #[serde(rename = "SearchResults", default)]
    pub search_results: Vec<PlexSearchResults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexAccount {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl From<PlexAccount> for Account {
    fn from(account: PlexAccount) -> Self {
        Account {
            id: account.id,
            name: account.name,
        }
    }
}

/// Directory entry; library sections carry a `type`, root capability entries do not
#[derive(Debug, Clone, Deserialize)]
pub struct PlexDirectory {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub section_type: String,
}

impl From<PlexDirectory> for Library {
    fn from(dir: PlexDirectory) -> Self {
        Library {
            kind: MediaKind::from_section_type(&dir.section_type),
            key: dir.key,
            title: dir.title,
        }
    }
}

/// Item metadata, shared by history, search, and collection listings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexMetadata {
    #[serde(default)]
    pub rating_key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
}

impl From<PlexMetadata> for HistoryEntry {
    fn from(meta: PlexMetadata) -> Self {
        HistoryEntry {
            title: meta.title,
            grandparent_title: meta.grandparent_title,
        }
    }
}

impl PlexMetadata {
    /// Items without a rating key cannot be referenced and are dropped
    pub fn into_catalog_item(self) -> Option<CatalogItem> {
        let rating_key = self.rating_key?;
        Some(CatalogItem {
            rating_key,
            title: self.title.unwrap_or_default(),
            kind: CatalogItemKind::from_plex_type(self.item_type.as_deref().unwrap_or_default()),
        })
    }

    pub fn into_collection(self, library_key: &str) -> Option<Collection> {
        Some(Collection {
            rating_key: self.rating_key?,
            title: self.title.unwrap_or_default(),
            library_key: library_key.to_string(),
        })
    }
}

/// Search results grouped by type
#[derive(Debug, Clone, Deserialize)]
pub struct PlexHub {
    #[serde(rename = "type", default)]
    pub hub_type: String,
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexMetadata>,
}

// ============================================================================
// Plex Discover Provider Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PlexSearchResults {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "SearchResult", default)]
    pub results: Vec<PlexSearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexSearchResult {
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<PlexMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 2,
                "Account": [
                    {"id": 0, "key": "/accounts/0", "name": ""},
                    {"id": 12345, "key": "/accounts/12345", "name": "alice"}
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let accounts: Vec<Account> = response
            .media_container
            .accounts
            .into_iter()
            .map(Account::from)
            .collect();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].id, 12345);
        assert_eq!(accounts[1].name, "alice");
    }

    #[test]
    fn test_history_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "Metadata": [
                    {"title": "Pilot", "grandparentTitle": "Severance", "type": "episode", "viewedAt": 1700000000},
                    {"title": "Dune", "type": "movie"}
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let entries: Vec<HistoryEntry> = response
            .media_container
            .metadata
            .into_iter()
            .map(HistoryEntry::from)
            .collect();
        assert_eq!(entries[0].canonical_title(), Some("Severance"));
        assert_eq!(entries[1].canonical_title(), Some("Dune"));
    }

    #[test]
    fn test_hub_search_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "Hub": [
                    {"type": "show", "Metadata": [{"ratingKey": "101", "title": "Dark", "type": "show"}]},
                    {"type": "episode", "Metadata": [{"ratingKey": "202", "title": "Secrets", "type": "episode"}]}
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let hubs = response.media_container.hubs;
        assert_eq!(hubs.len(), 2);
        let item = hubs[0].metadata[0].clone().into_catalog_item().unwrap();
        assert_eq!(item.rating_key, "101");
        assert_eq!(item.kind, CatalogItemKind::FullSeries);
        let fragment = hubs[1].metadata[0].clone().into_catalog_item().unwrap();
        assert_eq!(fragment.kind, CatalogItemKind::SeasonOrEpisode);
    }

    #[test]
    fn test_discover_search_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "SearchResults": [
                    {
                        "id": "external",
                        "SearchResult": [
                            {"score": 0.9, "Metadata": {"ratingKey": "5d776b59ad5437001f79c6f8", "title": "Arrival", "type": "movie"}}
                        ]
                    }
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let results = &response.media_container.search_results[0];
        assert_eq!(results.id.as_deref(), Some("external"));
        let metadata = results.results[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Arrival"));
    }

    #[test]
    fn test_discover_result_without_metadata() {
        let json = r#"{
            "MediaContainer": {
                "SearchResults": [
                    {
                        "id": "external",
                        "SearchResult": [
                            {"score": 0.4},
                            {"score": 0.9, "Metadata": {"ratingKey": "5d77", "title": "Heat", "type": "movie"}}
                        ]
                    }
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let results = &response.media_container.search_results[0].results;
        assert_eq!(results.len(), 2);
        assert!(results[0].metadata.is_none());
        assert!(results[1].metadata.is_some());
    }

    #[test]
    fn test_server_root_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 3,
                "friendlyName": "living-room",
                "machineIdentifier": "abc123",
                "version": "1.40.1.8227",
                "Directory": [
                    {"count": 1, "key": "actions", "title": "actions"},
                    {"count": 1, "key": "butler", "title": "butler"},
                    {"count": 3, "key": "library", "title": "library"}
                ]
            }
        }"#;

        let response: PlexResponse = serde_json::from_str(json).unwrap();
        let container = response.media_container;
        assert_eq!(container.machine_identifier.as_deref(), Some("abc123"));
        assert_eq!(container.directories.len(), 3);
        assert_eq!(container.directories[0].section_type, "");
    }

    #[test]
    fn test_metadata_without_rating_key_is_dropped() {
        let meta = PlexMetadata {
            rating_key: None,
            title: Some("Orphan".to_string()),
            grandparent_title: None,
            item_type: Some("movie".to_string()),
        };
        assert!(meta.into_catalog_item().is_none());
    }

    #[test]
    fn test_section_to_library() {
        let dir = PlexDirectory {
            key: "2".to_string(),
            title: "TV Shows".to_string(),
            section_type: "show".to_string(),
        };
        let library = Library::from(dir);
        assert_eq!(library.kind, MediaKind::Show);
        assert_eq!(library.key, "2");
    }
}
