//! Turns per-game match results into a booth-by-booth visiting plan.
//!
//! Each matched game contributes to one stop: its first product-confirmed
//! match when there is one, otherwise its highest-confidence match. Stops
//! group games by hall, booth and exhibitor, and are ordered by priority
//! score, then hall (numbered halls first), then booth. Unmatched games are
//! carried through every report rather than dropped.

use std::io::Write as IoWrite;

use serde::Serialize;

use crate::error::FairError;
use crate::matcher::{BoothMatch, GameMatches};
use crate::types::Exhibitor;
use meeple_scout_lib::Game;

/// One game on the route, flattened for reports.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedGame {
    pub name: String,
    pub object_id: u64,
    pub want_to_buy: bool,
    pub want_to_play: bool,
    pub average_rating: Option<f32>,
    pub complexity_weight: Option<f32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub playing_time: Option<u32>,
    pub confidence: f64,
    pub reason: String,
    pub product_confirmed: bool,
    pub product_note: Option<String>,
    pub bgg_url: String,
}

impl PlannedGame {
    fn new(game: &Game, chosen: &BoothMatch) -> Self {
        Self {
            name: game.name.clone(),
            object_id: game.object_id,
            want_to_buy: game.want_to_buy,
            want_to_play: game.want_to_play,
            average_rating: game.average_rating,
            complexity_weight: game.complexity_weight,
            min_players: game.min_players,
            max_players: game.max_players,
            playing_time: game.playing_time,
            confidence: chosen.confidence,
            reason: chosen.reason.to_string(),
            product_confirmed: chosen.product_confirmed,
            product_note: chosen.product_match.as_ref().map(|p| p.to_string()),
            bgg_url: game.bgg_url(),
        }
    }
}

/// One booth to visit and the games to look for there.
#[derive(Debug, Clone, Serialize)]
pub struct RouteStop {
    pub hall: String,
    pub booth: String,
    pub exhibitor: Exhibitor,
    pub priority: u32,
    pub games: Vec<PlannedGame>,
}

/// The full plan, serializable as the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub total_games: usize,
    pub matched_games: usize,
    pub unmatched_games: Vec<String>,
    pub stops: Vec<RouteStop>,
}

/// Build the route from match results. Input order only matters for
/// breaking exact ties between stops.
pub fn build_route(results: &[GameMatches]) -> RouteReport {
    let mut stops: Vec<RouteStop> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();
    let mut matched = 0usize;

    for result in results {
        let chosen = result
            .matches
            .iter()
            .find(|m| m.product_confirmed)
            .or_else(|| result.matches.first());
        let Some(chosen) = chosen else {
            unmatched.push(result.game.name.clone());
            continue;
        };
        matched += 1;

        let planned = PlannedGame::new(&result.game, chosen);
        let existing = stops.iter_mut().find(|s| {
            s.hall == chosen.exhibitor.hall
                && s.booth == chosen.exhibitor.booth
                && s.exhibitor.id == chosen.exhibitor.id
        });
        match existing {
            Some(stop) => stop.games.push(planned),
            None => stops.push(RouteStop {
                hall: chosen.exhibitor.hall.clone(),
                booth: chosen.exhibitor.booth.clone(),
                exhibitor: chosen.exhibitor.clone(),
                priority: 0,
                games: vec![planned],
            }),
        }
    }

    for stop in &mut stops {
        stop.priority = priority_score(&stop.games);
    }
    stops.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| hall_sort_key(&a.hall).cmp(&hall_sort_key(&b.hall)))
            .then_with(|| a.booth.cmp(&b.booth))
    });

    RouteReport {
        total_games: results.len(),
        matched_games: matched,
        unmatched_games: unmatched,
        stops,
    }
}

/// Buy-list games weigh double what play-list games do.
fn priority_score(games: &[PlannedGame]) -> u32 {
    games
        .iter()
        .map(|g| {
            if g.want_to_buy {
                10
            } else if g.want_to_play {
                5
            } else {
                0
            }
        })
        .sum()
}

/// Numbered halls sort ascending ahead of named areas.
fn hall_sort_key(hall: &str) -> (u8, u32, String) {
    match hall.trim().parse::<u32>() {
        Ok(n) => (0, n, String::new()),
        Err(_) => (1, 0, hall.to_string()),
    }
}

impl RouteReport {
    /// Unique halls on the route, numbered halls first.
    pub fn halls(&self) -> Vec<String> {
        let mut halls: Vec<String> = Vec::new();
        for stop in &self.stops {
            if !halls.contains(&stop.hall) {
                halls.push(stop.hall.clone());
            }
        }
        halls.sort_by_key(|h| hall_sort_key(h));
        halls
    }

    /// Stops holding at least one want-to-buy game.
    pub fn buy_stops(&self) -> impl Iterator<Item = &RouteStop> {
        self.stops
            .iter()
            .filter(|s| s.games.iter().any(|g| g.want_to_buy))
    }

    /// Render the checklist version of the route, grouped by hall.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Essen Spiel Route\n\n");
        out.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        ));

        out.push_str("## Summary\n\n");
        out.push_str(&format!(
            "- Games matched: {} of {}\n",
            self.matched_games, self.total_games
        ));
        out.push_str(&format!("- Booths to visit: {}\n", self.stops.len()));
        if !self.stops.is_empty() {
            out.push_str(&format!("- Halls: {}\n", self.halls().join(", ")));
        }
        out.push_str("\nLegend: 🛒 want to buy · 🎲 want to play · ⭐ rating · ⚖️ weight · 👥 players · ⏱️ playing time\n");

        for hall in self.halls() {
            out.push_str(&format!("\n## Hall {hall}\n"));
            for stop in self.stops.iter().filter(|s| s.hall == hall) {
                out.push_str(&format!(
                    "\n### {} — Booth {}\n\n",
                    stop.exhibitor.name, stop.booth
                ));
                let mut details = vec![format!("Priority {}", stop.priority)];
                if !stop.exhibitor.country.is_empty() {
                    details.push(stop.exhibitor.country.clone());
                }
                if !stop.exhibitor.website.is_empty() {
                    details.push(stop.exhibitor.website.clone());
                }
                out.push_str(&format!("{}\n\n", details.join(" · ")));

                for game in &stop.games {
                    out.push_str(&format!("{}\n", game_line(game)));
                    out.push_str(&format!("  - {}\n", game.reason));
                    if let Some(note) = &game.product_note {
                        out.push_str(&format!("  - {note}\n"));
                    }
                }
            }
        }

        if !self.unmatched_games.is_empty() {
            out.push_str("\n## Unmatched\n\n");
            out.push_str("No booth found for these games; check the fair catalog by hand.\n\n");
            for name in &self.unmatched_games {
                out.push_str(&format!("- {name}\n"));
            }
        }
        out
    }

    /// Write the spreadsheet summary: one row per stop.
    pub fn write_csv<W: IoWrite>(&self, writer: W) -> Result<(), FairError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["Hall", "Booth", "Exhibitor", "Priority", "Games"])?;
        for stop in &self.stops {
            let games = stop
                .games
                .iter()
                .map(|g| {
                    let marker = if g.want_to_buy {
                        " [BUY]"
                    } else if g.want_to_play {
                        " [PLAY]"
                    } else {
                        ""
                    };
                    format!("{}{marker}", g.name)
                })
                .collect::<Vec<_>>()
                .join("; ");
            let priority = stop.priority.to_string();
            csv_writer.write_record([
                stop.hall.as_str(),
                stop.booth.as_str(),
                stop.exhibitor.name.as_str(),
                priority.as_str(),
                games.as_str(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the full structure as pretty JSON.
    pub fn write_json<W: IoWrite>(&self, writer: W) -> Result<(), FairError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn game_line(game: &PlannedGame) -> String {
    let marker = if game.want_to_buy { "🛒" } else { "🎲" };
    let mut line = format!("- [ ] {marker} **[{}]({})**", game.name, game.bgg_url);
    if let Some(rating) = game.average_rating {
        line.push_str(&format!(" ⭐{rating:.1}"));
    }
    if let Some(weight) = game.complexity_weight {
        line.push_str(&format!(" ⚖️{weight:.1}"));
    }
    if let (Some(min), Some(max)) = (game.min_players, game.max_players) {
        line.push_str(&format!(" 👥{min}-{max}"));
    }
    if let Some(minutes) = game.playing_time {
        line.push_str(&format!(" ⏱️{minutes} min"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchReason, ProductMatch};

    fn exhibitor(id: &str, name: &str, hall: &str, booth: &str) -> Exhibitor {
        Exhibitor {
            id: id.to_string(),
            name: name.to_string(),
            hall: hall.to_string(),
            booth: booth.to_string(),
            country: "Germany".to_string(),
            website: "https://example.com".to_string(),
            email: String::new(),
            info: String::new(),
            is_multi_location: false,
        }
    }

    fn booth_match(exhibitor: Exhibitor, confidence: f64, confirmed: bool) -> BoothMatch {
        BoothMatch {
            reason: MatchReason::ExactName {
                publisher: "P".to_string(),
                exhibitor: exhibitor.name.clone(),
            },
            product_match: confirmed.then(|| ProductMatch {
                title: "Title".to_string(),
                score: 0.9,
            }),
            product_confirmed: confirmed,
            confidence,
            exhibitor,
        }
    }

    fn matched_game(name: &str, buy: bool, matches: Vec<BoothMatch>) -> GameMatches {
        GameMatches {
            game: Game {
                object_id: 42,
                name: name.to_string(),
                want_to_play: !buy,
                want_to_buy: buy,
                average_rating: Some(7.5),
                playing_time: Some(90),
                ..Default::default()
            },
            matches,
        }
    }

    #[test]
    fn test_games_group_into_one_stop_per_booth() {
        let booth = exhibitor("1", "Feuerland", "3", "B100");
        let results = vec![
            matched_game("Ark Nova", true, vec![booth_match(booth.clone(), 1.0, false)]),
            matched_game("Bonfire", false, vec![booth_match(booth.clone(), 1.0, false)]),
        ];
        let report = build_route(&results);

        assert_eq!(report.stops.len(), 1);
        assert_eq!(report.stops[0].games.len(), 2);
        assert_eq!(report.stops[0].priority, 15);
        assert_eq!(report.matched_games, 2);
        assert!(report.unmatched_games.is_empty());
    }

    #[test]
    fn test_confirmed_match_preferred_over_higher_confidence() {
        let likely = booth_match(exhibitor("1", "Maybe Verlag", "3", "A1"), 0.95, false);
        let confirmed = booth_match(exhibitor("2", "Surely Games", "4", "B2"), 0.86, true);
        let results = vec![matched_game("Ark Nova", true, vec![likely, confirmed])];

        let report = build_route(&results);
        assert_eq!(report.stops.len(), 1);
        assert_eq!(report.stops[0].exhibitor.name, "Surely Games");
    }

    #[test]
    fn test_stop_order_priority_then_hall() {
        let results = vec![
            matched_game(
                "Play Game",
                false,
                vec![booth_match(exhibitor("1", "A", "Galeria", "G1"), 1.0, false)],
            ),
            matched_game(
                "Buy Game",
                true,
                vec![booth_match(exhibitor("2", "B", "10", "C5"), 1.0, false)],
            ),
            matched_game(
                "Other Play",
                false,
                vec![booth_match(exhibitor("3", "C", "3", "A2"), 1.0, false)],
            ),
        ];
        let report = build_route(&results);

        // buy stop first; equal-priority stops follow hall order with
        // numbered halls ascending before named areas
        let order: Vec<(&str, u32)> = report
            .stops
            .iter()
            .map(|s| (s.hall.as_str(), s.priority))
            .collect();
        assert_eq!(order, vec![("10", 10), ("3", 5), ("Galeria", 5)]);
    }

    #[test]
    fn test_unmatched_games_are_kept() {
        let results = vec![matched_game("Nowhere To Be Found", true, Vec::new())];
        let report = build_route(&results);

        assert_eq!(report.matched_games, 0);
        assert_eq!(report.unmatched_games, vec!["Nowhere To Be Found"]);
        assert!(report.stops.is_empty());

        let markdown = report.to_markdown();
        assert!(markdown.contains("## Unmatched"));
        assert!(markdown.contains("- Nowhere To Be Found"));
    }

    #[test]
    fn test_markdown_checklist_content() {
        let booth = exhibitor("1", "Feuerland", "3", "B100");
        let mut chosen = booth_match(booth, 1.0, true);
        chosen.product_match = Some(ProductMatch {
            title: "Ark Nova".to_string(),
            score: 1.0,
        });
        let results = vec![matched_game("Ark Nova", true, vec![chosen])];

        let markdown = build_route(&results).to_markdown();
        assert!(markdown.contains("## Hall 3"));
        assert!(markdown.contains("### Feuerland — Booth B100"));
        assert!(markdown.contains("- [ ] 🛒 **[Ark Nova](https://boardgamegeek.com/boardgame/42/ark-nova)**"));
        assert!(markdown.contains("⭐7.5"));
        assert!(markdown.contains("⏱️90 min"));
        assert!(markdown.contains("Product 'Ark Nova' confirmed (100% match)"));
    }

    #[test]
    fn test_csv_rows_carry_markers() {
        let booth = exhibitor("1", "Feuerland", "3", "B100");
        let results = vec![
            matched_game("Ark Nova", true, vec![booth_match(booth.clone(), 1.0, false)]),
            matched_game("Bonfire", false, vec![booth_match(booth.clone(), 1.0, false)]),
        ];
        let report = build_route(&results);

        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Hall,Booth,Exhibitor,Priority,Games"));
        assert_eq!(
            lines.next(),
            Some("3,B100,Feuerland,15,Ark Nova [BUY]; Bonfire [PLAY]")
        );
    }

    #[test]
    fn test_json_report_structure() {
        let booth = exhibitor("1", "Feuerland", "3", "B100");
        let results = vec![matched_game("Ark Nova", true, vec![booth_match(booth, 1.0, false)])];
        let report = build_route(&results);

        let mut buffer = Vec::new();
        report.write_json(&mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value["total_games"], 1);
        assert_eq!(value["matched_games"], 1);
        assert_eq!(value["stops"][0]["hall"], "3");
        assert_eq!(value["stops"][0]["games"][0]["name"], "Ark Nova");
        assert_eq!(value["stops"][0]["games"][0]["confidence"], 1.0);
    }
}
