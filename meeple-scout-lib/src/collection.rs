//! BoardGameGeek collection CSV parsing.
//!
//! The export is messy: flag columns are `"1"`/`"0"` strings, numeric columns
//! may be empty or zero for "unset", and older exports lack some columns
//! entirely. Every row is parsed leniently and bad rows are skipped with a
//! warning rather than failing the whole import.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::Game;
use crate::error::CollectionError;

/// Explicit markers that a name belongs to an expansion.
const EXPANSION_KEYWORDS: [&str; 5] = [
    "expansion",
    "extension",
    "add-on",
    "addon",
    "mini-expansion",
];

/// Words that mark a colon/dash suffix as a subtitle rather than an expansion.
const SUBTITLE_WORDS: [&str; 4] = ["edition", "deluxe", "collection", "reprint"];

/// One row of the collection CSV. All columns are read as strings and parsed
/// afterwards; unknown columns are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CollectionRow {
    objectid: String,
    objectname: String,
    rating: String,
    own: String,
    wanttoplay: String,
    wanttobuy: String,
    itemtype: String,
    average: String,
    avgweight: String,
    playingtime: String,
    minplayers: String,
    maxplayers: String,
    version_publishers: String,
}

/// The parsed collection, ordered by game name.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub games: Vec<Game>,
}

/// Aggregate counts over the collection, for display and snapshot metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    pub total: usize,
    pub owned: usize,
    pub want_to_play: usize,
    pub want_to_buy: usize,
    pub targets: usize,
    pub expansions: usize,
}

impl Collection {
    /// Load and parse the collection export at `path`.
    pub fn load(path: &Path) -> Result<Self, CollectionError> {
        if !path.exists() {
            return Err(CollectionError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let games = read_games(file)?;
        Ok(Self { games })
    }

    /// Games the planner should route: wanted and not owned.
    pub fn target_games(&self) -> Vec<&Game> {
        self.games.iter().filter(|g| g.is_target()).collect()
    }

    pub fn owned_games(&self) -> Vec<&Game> {
        self.games.iter().filter(|g| g.owned).collect()
    }

    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            total: self.games.len(),
            owned: self.games.iter().filter(|g| g.owned).count(),
            want_to_play: self.games.iter().filter(|g| g.want_to_play).count(),
            want_to_buy: self.games.iter().filter(|g| g.want_to_buy).count(),
            targets: self.games.iter().filter(|g| g.is_target()).count(),
            expansions: self.games.iter().filter(|g| g.is_expansion).count(),
        }
    }
}

/// Parse collection rows from any reader. Rows without a usable object id are
/// skipped. The result is sorted by name for a stable processing order.
fn read_games<R: Read>(reader: R) -> Result<Vec<Game>, CollectionError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut games = Vec::new();
    for row in csv_reader.deserialize::<CollectionRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping unreadable collection row: {e}");
                continue;
            }
        };
        match game_from_row(&row) {
            Some(game) => games.push(game),
            None => log::warn!(
                "Skipping collection row without object id (name: {:?})",
                row.objectname
            ),
        }
    }

    games.sort_by(|a, b| a.name.cmp(&b.name).then(a.object_id.cmp(&b.object_id)));
    Ok(games)
}

fn game_from_row(row: &CollectionRow) -> Option<Game> {
    let object_id = row.objectid.trim().parse::<u64>().ok()?;
    let name = row.objectname.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let item_type = row.itemtype.trim();
    let is_expansion = match item_type {
        "expansion" => true,
        "" => looks_like_expansion(&name),
        _ => false,
    };

    Some(Game {
        object_id,
        name,
        want_to_play: flag(&row.wanttoplay),
        want_to_buy: flag(&row.wanttobuy),
        owned: flag(&row.own),
        is_expansion,
        publishers: split_publishers(&row.version_publishers),
        personal_rating: positive_f32(&row.rating),
        tags: Vec::new(),
        average_rating: positive_f32(&row.average),
        complexity_weight: positive_f32(&row.avgweight),
        playing_time: positive_u32(&row.playingtime),
        min_players: positive_u32(&row.minplayers),
        max_players: positive_u32(&row.maxplayers),
    })
}

/// Name-based expansion detection, used when the export's `itemtype` column
/// is empty. Colon and dash suffixes usually mean an expansion unless the
/// name carries a subtitle word like "Edition".
fn looks_like_expansion(name: &str) -> bool {
    let lower = name.to_lowercase();
    if EXPANSION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    if name.contains(':') || name.contains(" \u{2013} ") || name.contains(" - ") {
        let has_subtitle_word = lower
            .split_whitespace()
            .any(|word| SUBTITLE_WORDS.contains(&word));
        return !has_subtitle_word;
    }
    false
}

fn flag(value: &str) -> bool {
    value.trim() == "1"
}

/// Parse a numeric column where zero and empty both mean "unset".
fn positive_f32(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().filter(|v| *v > 0.0)
}

fn positive_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

/// Split the semicolon-separated `version_publishers` column, preserving
/// order and dropping case-insensitive duplicates.
fn split_publishers(value: &str) -> Vec<String> {
    let mut publishers: Vec<String> = Vec::new();
    for part in value.split(';') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        let key = name.to_lowercase();
        if !publishers.iter().any(|p| p.to_lowercase() == key) {
            publishers.push(name.to_string());
        }
    }
    publishers
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
objectname,objectid,rating,own,wanttoplay,wanttobuy,itemtype,average,avgweight,playingtime,minplayers,maxplayers,version_publishers
Ark Nova,342942,8,1,0,0,standalone,8.5,3.69,150,1,4,Feuerland Spiele
Babylon,418354,0,0,0,1,standalone,7.2,2.1,45,2,4,
Spirit Island: Jagged Earth,304812,0,0,1,0,expansion,8.9,4.26,120,1,6,Greater Than Games
Cascadia,295947,0,0,1,0,standalone,7.9,1.83,45,1,4,Flatout Games;AEG;Flatout Games
Brass: Birmingham,224517,0,0,1,0,standalone,8.6,3.87,120,2,4,
";

    fn sample_games() -> Vec<Game> {
        read_games(SAMPLE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_games_sorted_by_name() {
        let games = sample_games();
        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Ark Nova",
                "Babylon",
                "Brass: Birmingham",
                "Cascadia",
                "Spirit Island: Jagged Earth"
            ]
        );
    }

    #[test]
    fn test_flags_and_ratings() {
        let games = sample_games();
        let ark = &games[0];
        assert!(ark.owned);
        assert!(!ark.want_to_play);
        assert_eq!(ark.personal_rating, Some(8.0));
        assert_eq!(ark.average_rating, Some(8.5));
        assert_eq!(ark.playing_time, Some(150));

        let babylon = &games[1];
        assert!(babylon.want_to_buy);
        assert!(babylon.is_target());
        assert_eq!(babylon.personal_rating, None);
    }

    #[test]
    fn test_version_publishers_deduped() {
        let games = sample_games();
        let cascadia = &games[3];
        assert_eq!(cascadia.publishers, vec!["Flatout Games", "AEG"]);
    }

    #[test]
    fn test_itemtype_marks_expansion() {
        let games = sample_games();
        assert!(games[4].is_expansion);
        // itemtype "standalone" wins over the colon heuristic
        assert!(!games[2].is_expansion);
    }

    #[test]
    fn test_rows_without_id_are_skipped() {
        let csv = "objectname,objectid,own\nGhost Game,,0\nReal Game,42,1\n";
        let games = read_games(csv.as_bytes()).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].object_id, 42);
    }

    #[test]
    fn test_looks_like_expansion_keywords() {
        assert!(looks_like_expansion("Carcassonne: Expansion 1"));
        assert!(looks_like_expansion("Dune Imperium Rise of Ix Add-on"));
        assert!(looks_like_expansion("Wingspan: European Birds"));
    }

    #[test]
    fn test_looks_like_expansion_subtitle_words() {
        assert!(!looks_like_expansion("Brass: Deluxe Edition"));
        assert!(!looks_like_expansion("Root: The Clockwork Collection"));
        assert!(!looks_like_expansion("Azul"));
    }

    #[test]
    fn test_summary_counts() {
        let collection = Collection {
            games: sample_games(),
        };
        let summary = collection.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.owned, 1);
        assert_eq!(summary.want_to_play, 3);
        assert_eq!(summary.want_to_buy, 1);
        assert_eq!(summary.targets, 4);
        assert_eq!(summary.expansions, 1);
    }
}
