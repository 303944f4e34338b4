//! Incremental enrichment of a collection export.
//!
//! Walks the games in collection order, reusing the previous snapshot where
//! it already holds enrichment data and fetching the rest. The accumulating
//! result is checkpointed to disk every few records so an aborted run keeps
//! its progress. One game failing never aborts the batch; a checkpoint that
//! cannot be written does.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use meeple_scout_lib::Game;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::cache::write_atomic;
use crate::client::BggClient;
use crate::error::ScrapeError;
use crate::extract::{GameRecord, extract_game_record};

/// How many records between checkpoint writes.
pub const CHECKPOINT_INTERVAL: usize = 10;

/// Collection-level tallies stored alongside the games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotCounts {
    pub total_games: usize,
    pub owned_games: usize,
    pub want_to_play: usize,
    pub want_to_buy: usize,
}

/// The enriched snapshot: every game from the export plus whatever the
/// catalog pages added. This is the input to booth matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichedCollection {
    pub metadata: SnapshotCounts,
    pub games: Vec<Game>,
}

impl EnrichedCollection {
    pub fn new(games: Vec<Game>) -> Self {
        let mut collection = Self {
            metadata: SnapshotCounts::default(),
            games,
        };
        collection.recount();
        collection
    }

    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, &json)?;
        Ok(())
    }

    /// Recompute the metadata tallies from the game list.
    pub fn recount(&mut self) {
        self.metadata = SnapshotCounts {
            total_games: self.games.len(),
            owned_games: self.games.iter().filter(|g| g.owned).count(),
            want_to_play: self.games.iter().filter(|g| g.want_to_play).count(),
            want_to_buy: self.games.iter().filter(|g| g.want_to_buy).count(),
        };
    }

    /// Games worth visiting a booth for.
    pub fn target_games(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().filter(|g| g.is_target())
    }

    pub fn owned_games(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().filter(|g| g.owned)
    }

    pub fn find(&self, object_id: u64) -> Option<&Game> {
        self.games.iter().find(|g| g.object_id == object_id)
    }
}

/// Default snapshot location under the user cache dir.
pub fn snapshot_path() -> Result<PathBuf, ScrapeError> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| ScrapeError::cache("Could not determine cache directory"))?;
    Ok(dir.join("meeple-scout").join("enriched.json"))
}

/// Options for an enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Ignore the previous snapshot and refetch everything.
    pub force_refresh: bool,
    /// Keep expansions in the run instead of skipping them.
    pub include_expansions: bool,
    /// Records between checkpoint writes.
    pub checkpoint_interval: usize,
    /// Where the snapshot is written.
    pub snapshot: PathBuf,
}

impl EnrichOptions {
    pub fn new(snapshot: impl Into<PathBuf>) -> Self {
        Self {
            force_refresh: false,
            include_expansions: false,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            snapshot: snapshot.into(),
        }
    }
}

/// Progress events emitted during enrichment, consumed by the CLI.
#[derive(Debug, Clone)]
pub enum EnrichEvent {
    /// Run started, total games queued.
    Started { total: usize },
    /// A game is next in line.
    GameStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// Game carried over from the previous snapshot.
    GameReused { name: String },
    /// Game fetched and extracted.
    GameEnriched {
        name: String,
        publishers: usize,
        tags: usize,
    },
    /// Fetch or extraction failed (non-fatal); the game keeps its export data.
    GameFailed { name: String, error: String },
    /// Intermediate snapshot written.
    CheckpointSaved { games: usize },
    /// All games processed.
    Finished {
        enriched: usize,
        reused: usize,
        failed: usize,
    },
}

/// Accumulates finished games and persists the snapshot every `interval`
/// records. Games are handed over by value; the checkpoint owns the result.
struct Checkpoint {
    path: PathBuf,
    interval: usize,
    processed: usize,
    collection: EnrichedCollection,
}

impl Checkpoint {
    fn new(path: PathBuf, interval: usize) -> Self {
        Self {
            path,
            interval: interval.max(1),
            processed: 0,
            collection: EnrichedCollection::default(),
        }
    }

    /// Append a finished game. Returns whether a checkpoint was written.
    fn record(&mut self, game: Game) -> Result<bool, ScrapeError> {
        self.collection.games.push(game);
        self.processed += 1;
        if self.processed % self.interval == 0 {
            self.save()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn save(&mut self) -> Result<(), ScrapeError> {
        self.collection.recount();
        let json = serde_json::to_string_pretty(&self.collection)?;
        write_atomic(&self.path, &json).map_err(ScrapeError::Checkpoint)?;
        Ok(())
    }

    fn finish(mut self) -> Result<EnrichedCollection, ScrapeError> {
        self.save()?;
        Ok(self.collection)
    }
}

/// Enrich the given games, reusing the previous snapshot where possible.
/// The snapshot at `options.snapshot` is replaced, checkpointing along the
/// way, and the final collection is returned.
pub async fn enrich_games(
    client: &BggClient,
    games: &[Game],
    options: &EnrichOptions,
    events: mpsc::UnboundedSender<EnrichEvent>,
) -> Result<EnrichedCollection, ScrapeError> {
    let prior = if options.force_refresh {
        HashMap::new()
    } else {
        load_prior(&options.snapshot)
    };
    if !prior.is_empty() {
        log::debug!("Previous snapshot holds {} enriched games", prior.len());
    }

    let queue: Vec<&Game> = games
        .iter()
        .filter(|g| options.include_expansions || !g.is_expansion)
        .collect();
    let total = queue.len();
    let _ = events.send(EnrichEvent::Started { total });

    let mut checkpoint = Checkpoint::new(options.snapshot.clone(), options.checkpoint_interval);
    let mut enriched = 0usize;
    let mut reused = 0usize;
    let mut failed = 0usize;

    for (index, game) in queue.into_iter().enumerate() {
        let _ = events.send(EnrichEvent::GameStarted {
            index: index + 1,
            total,
            name: game.name.clone(),
        });

        let finished = match prior.get(&game.object_id) {
            Some(previous) => {
                reused += 1;
                let _ = events.send(EnrichEvent::GameReused {
                    name: game.name.clone(),
                });
                reuse_prior(game, previous)
            }
            None => match fetch_details(client, game).await {
                Ok(updated) => {
                    enriched += 1;
                    let _ = events.send(EnrichEvent::GameEnriched {
                        name: updated.name.clone(),
                        publishers: updated.publishers.len(),
                        tags: updated.tags.len(),
                    });
                    updated
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("Could not enrich '{}': {e}", game.name);
                    let _ = events.send(EnrichEvent::GameFailed {
                        name: game.name.clone(),
                        error: e.to_string(),
                    });
                    game.clone()
                }
            },
        };

        if checkpoint.record(finished)? {
            let _ = events.send(EnrichEvent::CheckpointSaved {
                games: checkpoint.collection.games.len(),
            });
        }
    }

    let collection = checkpoint.finish()?;
    let _ = events.send(EnrichEvent::Finished {
        enriched,
        reused,
        failed,
    });
    Ok(collection)
}

async fn fetch_details(client: &BggClient, game: &Game) -> Result<Game, ScrapeError> {
    let body = client.fetch_game_page(game.object_id).await?;
    let record = extract_game_record(&body);
    let mut updated = game.clone();
    apply_record(&mut updated, &record);
    Ok(updated)
}

/// Index the previous snapshot by id, keeping only games that actually
/// carry enrichment data. Games that failed last time get retried.
fn load_prior(path: &Path) -> HashMap<u64, Game> {
    let collection = match EnrichedCollection::load(path) {
        Ok(collection) => collection,
        Err(_) => return HashMap::new(),
    };
    collection
        .games
        .into_iter()
        .filter(|g| !g.publishers.is_empty() || !g.tags.is_empty())
        .map(|g| (g.object_id, g))
        .collect()
}

/// Carry enriched data forward from the previous snapshot while taking
/// name and collection status from the fresh export.
fn reuse_prior(current: &Game, prior: &Game) -> Game {
    let mut game = current.clone();
    if !prior.publishers.is_empty() {
        game.publishers = prior.publishers.clone();
    }
    if !prior.tags.is_empty() {
        game.tags = prior.tags.clone();
    }
    if prior.average_rating.is_some() {
        game.average_rating = prior.average_rating;
    }
    if prior.complexity_weight.is_some() {
        game.complexity_weight = prior.complexity_weight;
    }
    if prior.playing_time.is_some() {
        game.playing_time = prior.playing_time;
    }
    if prior.min_players.is_some() {
        game.min_players = prior.min_players;
    }
    if prior.max_players.is_some() {
        game.max_players = prior.max_players;
    }
    game
}

/// Merge a scraped record into a game. Scraped publishers and tags replace
/// the seed values when present; stats only fill gaps the export left.
pub(crate) fn apply_record(game: &mut Game, record: &GameRecord) {
    if !record.publishers.is_empty() {
        game.publishers = record.publishers.clone();
    }
    if !record.tags.is_empty() {
        game.tags = record.tags.clone();
    }
    if game.average_rating.is_none() {
        game.average_rating = record.average_rating;
    }
    if game.complexity_weight.is_none() {
        game.complexity_weight = record.complexity_weight;
    }
    if game.playing_time.is_none() {
        game.playing_time = record.playing_time;
    }
    if game.min_players.is_none() {
        game.min_players = record.min_players;
    }
    if game.max_players.is_none() {
        game.max_players = record.max_players;
    }
}
