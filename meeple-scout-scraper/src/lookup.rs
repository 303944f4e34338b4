//! Single-game lookup from a catalog URL.

use meeple_scout_lib::Game;
use regex::Regex;

use crate::client::BggClient;
use crate::enrich::apply_record;
use crate::error::ScrapeError;
use crate::extract::extract_game_record;

/// Pull the numeric game id out of a BGG boardgame URL. Accepts the full
/// form with or without slug and query, a scheme-less variant, or a bare
/// numeric id. Everything else is rejected.
pub fn parse_game_url(input: &str) -> Result<u64, ScrapeError> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(id) = trimmed.parse() {
            return Ok(id);
        }
        return Err(ScrapeError::InvalidUrl(input.to_string()));
    }

    Regex::new(r"boardgamegeek\.com/boardgame/(\d+)")
        .ok()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
        .ok_or_else(|| ScrapeError::InvalidUrl(input.to_string()))
}

/// Fetch one game by id and build a standalone record for it. The game is
/// not part of any collection, so the status flags stay unset.
pub async fn fetch_game(client: &BggClient, game_id: u64) -> Result<Game, ScrapeError> {
    let body = client.fetch_game_page(game_id).await?;
    let record = extract_game_record(&body);

    let mut game = Game {
        object_id: game_id,
        ..Default::default()
    };
    if let Some(name) = &record.name {
        game.name = name.clone();
    }
    apply_record(&mut game, &record);
    Ok(game)
}
