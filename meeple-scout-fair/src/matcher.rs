//! Links games to the exhibitor booths most likely selling them.
//!
//! Matching runs in two tiers. Tier 1 compares each publisher on the game
//! against every exhibitor's display name and info text and keeps the best
//! qualifying exhibitor per publisher. Tier 2 then looks for the game's
//! title among each candidate's own products; a hit marks the candidate
//! confirmed without touching its confidence. Only when Tier 1 produces
//! nothing at all does a title-only product search stand in, carrying the
//! title similarity as its confidence. A game with no qualifying match in
//! either tier simply yields no results.

use std::fmt;

use meeple_scout_lib::Game;

use crate::similarity::{name_similarity, normalized_contains, partial_similarity};
use crate::types::{Exhibitor, Product};

/// Thresholds a score must reach (inclusive) to qualify.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub publisher_threshold: f64,
    pub product_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            publisher_threshold: 0.80,
            product_threshold: 0.85,
        }
    }
}

/// Why a game was linked to an exhibitor.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchReason {
    /// Publisher name equals the exhibitor name, ignoring case.
    ExactName { publisher: String, exhibitor: String },
    /// Publisher name appears verbatim in the exhibitor info text.
    InfoContains { publisher: String, exhibitor: String },
    /// Publisher name is close to the exhibitor name.
    SimilarName {
        publisher: String,
        exhibitor: String,
        score: f64,
    },
    /// Publisher name aligns with part of the exhibitor info text.
    SimilarInfo {
        publisher: String,
        exhibitor: String,
        score: f64,
    },
    /// No publisher matched; the game title matched one of the exhibitor's
    /// products instead.
    TitleFallback { exhibitor: String, score: f64 },
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactName {
                publisher,
                exhibitor,
            } => write!(
                f,
                "Publisher '{publisher}' matched to '{exhibitor}' (exact_match, 100%)"
            ),
            Self::InfoContains {
                publisher,
                exhibitor,
            } => write!(
                f,
                "Publisher '{publisher}' matched to '{exhibitor}' (info_match, 100%)"
            ),
            Self::SimilarName {
                publisher,
                exhibitor,
                score,
            } => write!(
                f,
                "Publisher '{publisher}' matched to '{exhibitor}' (fuzzy_match, {:.0}%)",
                score * 100.0
            ),
            Self::SimilarInfo {
                publisher,
                exhibitor,
                score,
            } => write!(
                f,
                "Publisher '{publisher}' matched to '{exhibitor}' (info_fuzzy_match, {:.0}%)",
                score * 100.0
            ),
            Self::TitleFallback { exhibitor, score } => write!(
                f,
                "Game title matched to product by '{exhibitor}' ({:.0}%)",
                score * 100.0
            ),
        }
    }
}

/// A product title that corroborates a match.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMatch {
    pub title: String,
    pub score: f64,
}

impl fmt::Display for ProductMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product '{}' confirmed ({:.0}% match)",
            self.title,
            self.score * 100.0
        )
    }
}

/// One ranked booth suggestion for a game.
#[derive(Debug, Clone)]
pub struct BoothMatch {
    pub exhibitor: Exhibitor,
    pub confidence: f64,
    pub reason: MatchReason,
    pub product_confirmed: bool,
    pub product_match: Option<ProductMatch>,
}

/// A game together with its ranked booth suggestions. An empty list is a
/// normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct GameMatches {
    pub game: Game,
    pub matches: Vec<BoothMatch>,
}

/// Match every game in the slice. Result order follows the input.
pub fn match_games(
    games: &[Game],
    exhibitors: &[Exhibitor],
    products: &[Product],
    config: &MatchConfig,
) -> Vec<GameMatches> {
    games
        .iter()
        .map(|game| GameMatches {
            game: game.clone(),
            matches: match_game(game, exhibitors, products, config),
        })
        .collect()
}

/// Produce ranked booth matches for one game: confidence descending, then
/// confirmed before unconfirmed, then exhibitor name.
pub fn match_game(
    game: &Game,
    exhibitors: &[Exhibitor],
    products: &[Product],
    config: &MatchConfig,
) -> Vec<BoothMatch> {
    let mut matches = publisher_candidates(game, exhibitors, config);

    for candidate in &mut matches {
        if let Some(found) = confirm_product(
            &game.name,
            &candidate.exhibitor.id,
            products,
            config.product_threshold,
        ) {
            candidate.product_confirmed = true;
            candidate.product_match = Some(found);
        }
    }

    if matches.is_empty() {
        if let Some(fallback) = title_fallback(game, exhibitors, products, config) {
            matches.push(fallback);
        }
    }

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.product_confirmed.cmp(&a.product_confirmed))
            .then_with(|| a.exhibitor.name.cmp(&b.exhibitor.name))
    });
    matches
}

/// Tier 1: the best qualifying exhibitor per publisher, deduplicated by
/// exhibitor id (the higher confidence wins).
fn publisher_candidates(
    game: &Game,
    exhibitors: &[Exhibitor],
    config: &MatchConfig,
) -> Vec<BoothMatch> {
    let mut candidates: Vec<BoothMatch> = Vec::new();

    for publisher in &game.publishers {
        if publisher.trim().is_empty() {
            continue;
        }

        let mut best: Option<BoothMatch> = None;
        for exhibitor in exhibitors {
            let (confidence, reason) = score_publisher(publisher, exhibitor);
            if confidence < config.publisher_threshold {
                continue;
            }
            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                best = Some(BoothMatch {
                    exhibitor: exhibitor.clone(),
                    confidence,
                    reason,
                    product_confirmed: false,
                    product_match: None,
                });
            }
        }

        let Some(candidate) = best else {
            continue;
        };
        match candidates
            .iter_mut()
            .find(|c| c.exhibitor.id == candidate.exhibitor.id)
        {
            Some(existing) => {
                if candidate.confidence > existing.confidence {
                    *existing = candidate;
                }
            }
            None => candidates.push(candidate),
        }
    }

    candidates
}

/// Score one publisher against one exhibitor. Exact name equality and a
/// verbatim appearance in the info text both count as certain.
fn score_publisher(publisher: &str, exhibitor: &Exhibitor) -> (f64, MatchReason) {
    if publisher.trim().to_lowercase() == exhibitor.name.trim().to_lowercase() {
        return (
            1.0,
            MatchReason::ExactName {
                publisher: publisher.to_string(),
                exhibitor: exhibitor.name.clone(),
            },
        );
    }
    if normalized_contains(&exhibitor.info, publisher) {
        return (
            1.0,
            MatchReason::InfoContains {
                publisher: publisher.to_string(),
                exhibitor: exhibitor.name.clone(),
            },
        );
    }

    let name_score = name_similarity(publisher, &exhibitor.name);
    let info_score = partial_similarity(publisher, &exhibitor.info);
    if info_score > name_score {
        (
            info_score,
            MatchReason::SimilarInfo {
                publisher: publisher.to_string(),
                exhibitor: exhibitor.name.clone(),
                score: info_score,
            },
        )
    } else {
        (
            name_score,
            MatchReason::SimilarName {
                publisher: publisher.to_string(),
                exhibitor: exhibitor.name.clone(),
                score: name_score,
            },
        )
    }
}

/// Tier 2: search the candidate exhibitor's own products for the game
/// title. Confirmation never alters confidence.
fn confirm_product(
    game_name: &str,
    exhibitor_id: &str,
    products: &[Product],
    threshold: f64,
) -> Option<ProductMatch> {
    let mut best: Option<ProductMatch> = None;
    for product in products.iter().filter(|p| p.company_id == exhibitor_id) {
        let score = name_similarity(game_name, &product.title);
        if score >= threshold && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(ProductMatch {
                title: product.title.clone(),
                score,
            });
        }
    }
    best
}

/// Title-only fallback across the whole product catalog, used when no
/// publisher qualified. Products whose exhibitor is unknown are skipped.
fn title_fallback(
    game: &Game,
    exhibitors: &[Exhibitor],
    products: &[Product],
    config: &MatchConfig,
) -> Option<BoothMatch> {
    let mut best: Option<(f64, &Product, &Exhibitor)> = None;
    for product in products {
        let score = name_similarity(&game.name, &product.title);
        if score < config.product_threshold {
            continue;
        }
        let Some(exhibitor) = exhibitors.iter().find(|e| e.id == product.company_id) else {
            continue;
        };
        if best.is_none_or(|(s, _, _)| score > s) {
            best = Some((score, product, exhibitor));
        }
    }

    let (score, product, exhibitor) = best?;
    Some(BoothMatch {
        exhibitor: exhibitor.clone(),
        confidence: score,
        reason: MatchReason::TitleFallback {
            exhibitor: exhibitor.name.clone(),
            score,
        },
        product_confirmed: true,
        product_match: Some(ProductMatch {
            title: product.title.clone(),
            score,
        }),
    })
}
