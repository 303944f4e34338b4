pub mod cache;
pub mod client;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod lookup;

pub use cache::{CacheEntryInfo, CachedPage, PageCache};
pub use client::{BggClient, DelayRange};
pub use enrich::{
    CHECKPOINT_INTERVAL, EnrichEvent, EnrichOptions, EnrichedCollection, SnapshotCounts,
    enrich_games, snapshot_path,
};
pub use error::ScrapeError;
pub use extract::{GameRecord, extract_game_record};
pub use lookup::{fetch_game, parse_game_url};
