use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod completion;
pub mod plex;

/// Media kind of a library section, used as the search filter downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Show,
    Movie,
}

impl MediaKind {
    /// Library sections of any type other than `show` are searched as movies
    pub fn from_section_type(section_type: &str) -> Self {
        match section_type {
            "show" => MediaKind::Show,
            _ => MediaKind::Movie,
        }
    }

    /// Plex metadata type number for search and collection creation
    pub fn plex_type(&self) -> u8 {
        match self {
            MediaKind::Movie => 1,
            MediaKind::Show => 2,
        }
    }

    /// Plural noun used in prompts
    pub fn plural(&self) -> &'static str {
        match self {
            MediaKind::Show => "shows",
            MediaKind::Movie => "movies",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Show => write!(f, "show"),
            MediaKind::Movie => write!(f, "movie"),
        }
    }
}

/// An account on the media server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub name: String,
}

impl Account {
    /// Name used in logs and collection titles; falls back to the id when blank
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Unknown_{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// A library section of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub key: String,
    pub title: String,
    pub kind: MediaKind,
}

/// One playback record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryEntry {
    pub title: Option<String>,
    pub grandparent_title: Option<String>,
}

impl HistoryEntry {
    /// Series name for episodes, otherwise the item's own title
    ///
    /// Returns `None` when neither field carries a non-blank value.
    pub fn canonical_title(&self) -> Option<&str> {
        non_blank(self.grandparent_title.as_deref()).or_else(|| non_blank(self.title.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|t| !t.is_empty())
}

/// Concrete entity granularity of a catalog search hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogItemKind {
    FullSeries,
    SeasonOrEpisode,
    Movie,
    Other,
}

impl CatalogItemKind {
    pub fn from_plex_type(item_type: &str) -> Self {
        match item_type {
            "show" => CatalogItemKind::FullSeries,
            "season" | "episode" => CatalogItemKind::SeasonOrEpisode,
            "movie" => CatalogItemKind::Movie,
            _ => CatalogItemKind::Other,
        }
    }
}

/// A catalog item resolved from a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub rating_key: String,
    pub title: String,
    pub kind: CatalogItemKind,
}

/// A named collection within one library section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub rating_key: String,
    pub title: String,
    pub library_key: String,
}

/// Parsed model output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendation {
    pub titles: Vec<String>,
    pub description: String,
}
