use meeple_scout_fair::*;
use meeple_scout_lib::Game;

fn exhibitor(id: &str, name: &str, hall: &str, booth: &str, info: &str) -> Exhibitor {
    Exhibitor {
        id: id.to_string(),
        name: name.to_string(),
        hall: hall.to_string(),
        booth: booth.to_string(),
        country: "Germany".to_string(),
        website: String::new(),
        email: String::new(),
        info: info.to_string(),
        is_multi_location: false,
    }
}

fn product(company_id: &str, title: &str) -> Product {
    Product {
        title: title.to_string(),
        company_id: company_id.to_string(),
        subtitle: String::new(),
        info: String::new(),
    }
}

fn game(object_id: u64, name: &str, publishers: &[&str], buy: bool) -> Game {
    Game {
        object_id,
        name: name.to_string(),
        want_to_play: !buy,
        want_to_buy: buy,
        publishers: publishers.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

fn sample_fair() -> (Vec<Exhibitor>, Vec<Product>) {
    let exhibitors = vec![
        exhibitor("101", "Feuerland Spiele", "3", "B100", ""),
        exhibitor(
            "102",
            "CGE",
            "3",
            "F300",
            "Czech Games Edition brings Codenames and Lost Ruins of Arnak",
        ),
        exhibitor("103", "Capstone Games", "5", "A20", ""),
        exhibitor("104", "Zvezda", "6", "D15", ""),
    ];
    let products = vec![
        product("101", "Ark Nova"),
        product("102", "Codenames"),
        product("102", "Lost Ruins of Arnak"),
        product("103", "Ark Nova"),
        product("104", "Babylonia"),
    ];
    (exhibitors, products)
}

#[test]
fn exact_publisher_match_is_certain() {
    let (exhibitors, products) = sample_fair();
    let ark = game(342942, "Ark Nova", &["Feuerland Spiele", "Capstone Games"], true);
    let matches = match_game(&ark, &exhibitors, &products, &MatchConfig::default());

    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.confidence == 1.0));
    assert!(matches.iter().all(|m| m.product_confirmed));
    // equal confidence and confirmation, so exhibitor name decides
    assert_eq!(matches[0].exhibitor.name, "Capstone Games");
    assert_eq!(matches[1].exhibitor.name, "Feuerland Spiele");
}

#[test]
fn abbreviated_exhibitor_found_through_info_text() {
    let (exhibitors, products) = sample_fair();
    let codenames = game(178900, "Codenames", &["Czech Games Edition"], false);
    let matches = match_game(&codenames, &exhibitors, &products, &MatchConfig::default());

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].exhibitor.name, "CGE");
    assert_eq!(matches[0].confidence, 1.0);
    assert!(matches!(matches[0].reason, MatchReason::InfoContains { .. }));
    assert!(matches[0].reason.to_string().contains("info_match"));
    assert!(matches[0].product_confirmed);
}

#[test]
fn backup_matches_ranked_descending() {
    let (exhibitors, products) = sample_fair();
    let ark = game(1, "Ark Nova", &["Capstone", "Feuerland Spiele"], true);
    let matches = match_game(&ark, &exhibitors, &products, &MatchConfig::default());

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].exhibitor.name, "Feuerland Spiele");
    assert_eq!(matches[0].confidence, 1.0);
    assert!(matches[1].confidence < 1.0 && matches[1].confidence >= 0.80);
    assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn publisher_threshold_boundary_is_inclusive() {
    let (exhibitors, products) = sample_fair();
    let score = name_similarity("Feuerland", "Feuerland Spiele");
    assert!(score < 1.0);
    let fuzzy = game(8, "Bonfire", &["Feuerland"], false);

    let at = MatchConfig {
        publisher_threshold: score,
        product_threshold: 0.85,
    };
    let matches = match_game(&fuzzy, &exhibitors, &products, &at);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence, score);

    let above = MatchConfig {
        publisher_threshold: score + 1e-9,
        product_threshold: 0.85,
    };
    assert!(match_game(&fuzzy, &exhibitors, &products, &above).is_empty());
}

#[test]
fn title_fallback_when_publishers_unknown() {
    let (exhibitors, products) = sample_fair();
    let babylon = game(6, "Babylon", &["Ludonova"], false);
    let matches = match_game(&babylon, &exhibitors, &products, &MatchConfig::default());

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].exhibitor.name, "Zvezda");
    let expected = name_similarity("Babylon", "Babylonia");
    assert!(expected >= 0.85 && expected < 1.0);
    assert_eq!(matches[0].confidence, expected);
    assert!(matches!(matches[0].reason, MatchReason::TitleFallback { .. }));
}

#[test]
fn confirmation_limited_to_candidates_own_products() {
    let (exhibitors, _) = sample_fair();
    let products = vec![product("104", "Ark Nova")];
    let ark = game(1, "Ark Nova", &["Feuerland Spiele"], true);
    let matches = match_game(&ark, &exhibitors, &products, &MatchConfig::default());

    assert_eq!(matches.len(), 1);
    assert!(!matches[0].product_confirmed);
    assert!(matches[0].product_match.is_none());
    assert_eq!(matches[0].confidence, 1.0);
}

#[test]
fn no_qualifying_match_yields_nothing() {
    let (exhibitors, products) = sample_fair();
    let obscure = game(7, "Hyperborea Depths", &["Micro Press"], false);
    assert!(match_game(&obscure, &exhibitors, &products, &MatchConfig::default()).is_empty());
}

#[test]
fn route_groups_booths_and_keeps_unmatched() {
    let (exhibitors, products) = sample_fair();
    let games = vec![
        game(1, "Ark Nova", &["Feuerland Spiele"], true),
        game(2, "Bonfire", &["Feuerland Spiele"], false),
        game(3, "Codenames", &["Czech Games Edition"], false),
        game(4, "Ghost Stories Unknown", &["Nobody Home"], true),
    ];
    let results = match_games(&games, &exhibitors, &products, &MatchConfig::default());
    let report = build_route(&results);

    assert_eq!(report.total_games, 4);
    assert_eq!(report.matched_games, 3);
    assert_eq!(report.unmatched_games, vec!["Ghost Stories Unknown"]);
    assert_eq!(report.stops.len(), 2);

    assert_eq!(report.stops[0].exhibitor.name, "Feuerland Spiele");
    assert_eq!(report.stops[0].priority, 15);
    assert_eq!(report.stops[0].games.len(), 2);
    assert_eq!(report.stops[1].exhibitor.name, "CGE");
    assert_eq!(report.stops[1].priority, 5);

    let markdown = report.to_markdown();
    assert!(markdown.contains("## Hall 3"));
    assert!(markdown.contains("Ghost Stories Unknown"));
}
