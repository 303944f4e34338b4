use serde::{Deserialize, Serialize};

pub mod collection;
pub mod error;
pub mod settings;

pub use collection::{Collection, CollectionSummary};
pub use error::CollectionError;
pub use settings::Settings;

/// A game from the collection export, together with whatever catalog
/// enrichment has been gathered for it so far.
///
/// One struct serves both halves of the pipeline: the collection extractor
/// fills the identity and status fields (publishers may be pre-seeded from
/// the export's `version_publishers` column), and the enricher fills or
/// replaces `publishers`, `tags` and the stats fields from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    /// BoardGameGeek object id.
    pub object_id: u64,

    /// Display name from the collection export.
    pub name: String,

    pub want_to_play: bool,
    pub want_to_buy: bool,
    pub owned: bool,
    pub is_expansion: bool,

    /// Publisher names, ordered, deduplicated case-insensitively.
    pub publishers: Vec<String>,

    /// Personal rating from the collection (absent when unrated).
    pub personal_rating: Option<f32>,

    /// Mechanic and category tags from the catalog.
    pub tags: Vec<String>,

    pub average_rating: Option<f32>,
    pub complexity_weight: Option<f32>,

    /// Playing time in minutes.
    pub playing_time: Option<u32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
}

impl Game {
    /// A target game is one the user wants to play or buy and does not own.
    pub fn is_target(&self) -> bool {
        (self.want_to_play || self.want_to_buy) && !self.owned
    }

    /// Canonical BGG page URL for this game.
    pub fn bgg_url(&self) -> String {
        let slug = slugify(&self.name);
        if slug.is_empty() {
            format!("https://boardgamegeek.com/boardgame/{}", self.object_id)
        } else {
            format!(
                "https://boardgamegeek.com/boardgame/{}/{}",
                self.object_id, slug
            )
        }
    }
}

/// Lowercase URL slug: alphanumerics kept, everything else collapsed to `-`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
