pub mod error;
pub mod matcher;
pub mod route;
pub mod similarity;
pub mod source;
pub mod types;

pub use error::FairError;
pub use matcher::{
    BoothMatch, GameMatches, MatchConfig, MatchReason, ProductMatch, match_game, match_games,
};
pub use route::{PlannedGame, RouteReport, RouteStop, build_route};
pub use similarity::{name_similarity, normalized_contains, partial_similarity};
pub use source::{FairData, FairSource, fair_year};
pub use types::{Exhibitor, Product};
