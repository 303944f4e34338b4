//! meeple-scout CLI
//!
//! Command-line interface for turning a BoardGameGeek collection export into
//! an Essen Spiel booth route.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use meeple_scout_fair::{
    BoothMatch, FairSource, MatchConfig, RouteReport, build_route, match_game, match_games,
};
use meeple_scout_lib::settings::settings_path;
use meeple_scout_lib::{Collection, Game, Settings};
use meeple_scout_scraper::{
    BggClient, DelayRange, EnrichEvent, EnrichOptions, EnrichedCollection, PageCache, enrich_games,
    fetch_game, parse_game_url, snapshot_path,
};

#[derive(Parser)]
#[command(name = "meeple-scout")]
#[command(about = "Plan an Essen Spiel visit from a BGG collection export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich the collection export with publishers, tags and stats from BGG
    Enrich {
        /// Path to the collection CSV export
        #[arg(short, long)]
        collection: Option<PathBuf>,

        /// Refetch every game, ignoring the previous snapshot
        #[arg(long)]
        refresh: bool,

        /// Also enrich expansions
        #[arg(long)]
        include_expansions: bool,
    },

    /// Build a booth-by-booth route for your target games
    Plan {
        /// Fair edition as a two-digit year (e.g. 25); defaults to this year
        #[arg(short, long)]
        year: Option<String>,

        /// Refetch exhibitor data even when a snapshot exists
        #[arg(long)]
        refresh_fair: bool,

        /// Directory for the route files (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum publisher/exhibitor similarity (default from settings)
        #[arg(long)]
        publisher_threshold: Option<f64>,

        /// Minimum product-title similarity (default from settings)
        #[arg(long)]
        product_threshold: Option<f64>,
    },

    /// Look up the booth for a single game by BGG URL or id
    Where {
        /// BGG boardgame URL or bare numeric id
        url: String,

        /// Fair edition as a two-digit year (e.g. 25); defaults to this year
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Search owned games by tag, or show tag statistics
    Tags {
        /// Tag substring to search for, or "unplayed" for unrated owned games
        query: Option<String>,

        /// Include expansions in the search
        #[arg(long)]
        include_expansions: bool,
    },

    /// Manage cached fair exhibitor data
    Fair {
        #[command(subcommand)]
        action: FairAction,
    },

    /// Manage the BGG page cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage matching and pacing settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum FairAction {
    /// Download fresh exhibitor and product data
    Fetch {
        /// Fair edition as a two-digit year (e.g. 25); defaults to this year
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Show exhibitor and hall statistics
    Stats {
        /// Fair edition as a two-digit year (e.g. 25); defaults to this year
        #[arg(short, long)]
        year: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show page cache and snapshot sizes
    Stats,

    /// Remove cached BGG pages
    Clear {
        /// Also remove fair snapshots and the enrichment snapshot
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings and their file status
    Show,

    /// Interactively edit settings
    Setup,

    /// Print the settings file path
    Path,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Enrich {
            collection,
            refresh,
            include_expansions,
        } => run_enrich(collection, refresh, include_expansions),
        Commands::Plan {
            year,
            refresh_fair,
            output,
            publisher_threshold,
            product_threshold,
        } => run_plan(
            year,
            refresh_fair,
            output,
            publisher_threshold,
            product_threshold,
        ),
        Commands::Where { url, year } => run_where(&url, year),
        Commands::Tags {
            query,
            include_expansions,
        } => run_tags(query, include_expansions),
        Commands::Fair { action } => match action {
            FairAction::Fetch { year } => run_fair_fetch(year),
            FairAction::Stats { year } => run_fair_stats(year),
        },
        Commands::Cache { action } => match action {
            CacheAction::Stats => run_cache_stats(),
            CacheAction::Clear { all } => run_cache_clear(all),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => run_config_show(),
            ConfigAction::Setup => run_config_setup(),
            ConfigAction::Path => run_config_path(),
        },
    };

    if !ok {
        std::process::exit(1);
    }
}

/// Print a red failure line. Returns `false` so callers can tail-return it.
fn fail(message: impl std::fmt::Display) -> bool {
    eprintln!(
        "{} {}",
        "\u{2718}".if_supports_color(Stdout, |t| t.red()),
        message,
    );
    false
}

fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .expect("static pattern")
            .tick_chars("/-\\|"),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Format a byte size as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// "Hall 3" for numbered halls, the name as-is for areas like "Galeria".
fn format_hall(hall: &str) -> String {
    if !hall.is_empty() && hall.chars().all(|c| c.is_ascii_digit()) {
        format!("Hall {hall}")
    } else {
        hall.to_string()
    }
}

/// Confidence percentage, green at 90%+, yellow at 80%+, red below.
fn confidence_label(confidence: f64) -> String {
    let pct = format!("{:.0}%", confidence * 100.0);
    if confidence >= 0.90 {
        pct.if_supports_color(Stdout, |t| t.green()).to_string()
    } else if confidence >= 0.80 {
        pct.if_supports_color(Stdout, |t| t.yellow()).to_string()
    } else {
        pct.if_supports_color(Stdout, |t| t.red()).to_string()
    }
}

// -- enrich --

fn run_enrich(collection: Option<PathBuf>, refresh: bool, include_expansions: bool) -> bool {
    let settings = Settings::load();
    let path = settings.resolve_collection_path(collection);
    log::debug!("Resolved collection path: {}", path.display());

    let collection = match Collection::load(&path) {
        Ok(c) => c,
        Err(e) => {
            fail(format!("Failed to load collection: {e}"));
            eprintln!();
            eprintln!("Export your collection from boardgamegeek.com (Collection ->");
            eprintln!("Export) and pass it with --collection, or set collection_path");
            eprintln!("via 'meeple-scout config setup'.");
            return false;
        }
    };
    let summary = collection.summary();

    println!(
        "Collection: {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    println!(
        "  {} games ({} owned, {} want to play, {} want to buy)",
        summary.total, summary.owned, summary.want_to_play, summary.want_to_buy,
    );
    if !include_expansions && summary.expansions > 0 {
        println!(
            "  {}",
            format!("{} expansions will be skipped", summary.expansions)
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    if refresh {
        println!(
            "  {}",
            "Refresh: refetching every game".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    println!();

    let snapshot = match snapshot_path() {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let cache = match PageCache::open() {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to open page cache: {e}")),
    };
    let client = match BggClient::new(
        cache,
        DelayRange::new(settings.delay_min, settings.delay_max),
    ) {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to build BGG client: {e}")),
    };

    let mut options = EnrichOptions::new(snapshot.clone());
    options.force_refresh = refresh;
    options.include_expansions = include_expansions;

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    let (result, totals) = rt.block_on(async {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<EnrichEvent>();

        let pb = spinner("Starting enrichment...");
        let progress_bar = pb.clone();
        let consumer = tokio::spawn(async move {
            let mut totals = None;
            while let Some(event) = rx.recv().await {
                match event {
                    EnrichEvent::Started { total } => {
                        progress_bar.set_message(format!("Enriching {total} games..."));
                    }
                    EnrichEvent::GameStarted { index, total, name } => {
                        progress_bar.set_message(format!("[{index}/{total}] {name}"));
                    }
                    EnrichEvent::GameReused { .. }
                    | EnrichEvent::GameEnriched { .. }
                    | EnrichEvent::CheckpointSaved { .. } => {}
                    EnrichEvent::GameFailed { name, error } => {
                        progress_bar.println(format!(
                            "  {} {}: {}",
                            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                            name,
                            error,
                        ));
                    }
                    EnrichEvent::Finished {
                        enriched,
                        reused,
                        failed,
                    } => {
                        totals = Some((enriched, reused, failed));
                    }
                }
            }
            totals
        });

        let result = enrich_games(&client, &collection.games, &options, tx).await;
        let totals = consumer.await.ok().flatten();
        pb.finish_and_clear();
        (result, totals)
    });

    match result {
        Ok(enriched) => {
            println!(
                "{} Snapshot written to {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                snapshot.display().if_supports_color(Stdout, |t| t.cyan()),
            );
            if let Some((fetched, reused, failed)) = totals {
                println!(
                    "  {} games in snapshot ({} fetched, {} reused, {} failed)",
                    enriched.games.len(),
                    fetched,
                    reused,
                    failed,
                );
            }
            println!(
                "  {} target games ready for planning",
                enriched.target_games().count(),
            );
            true
        }
        Err(e) => fail(format!("Enrichment failed: {e}")),
    }
}

// -- plan --

fn run_plan(
    year: Option<String>,
    refresh_fair: bool,
    output: Option<PathBuf>,
    publisher_threshold: Option<f64>,
    product_threshold: Option<f64>,
) -> bool {
    let settings = Settings::load();
    let config = MatchConfig {
        publisher_threshold: publisher_threshold.unwrap_or(settings.publisher_threshold),
        product_threshold: product_threshold.unwrap_or(settings.product_threshold),
    };

    let enriched = match load_snapshot() {
        Some(c) => c,
        None => return false,
    };
    let targets: Vec<Game> = enriched.target_games().cloned().collect();
    if targets.is_empty() {
        println!(
            "{}",
            "No target games in the snapshot (want-to-play or want-to-buy, not owned)."
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
        return true;
    }

    let source = match FairSource::open(year) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let fair = match load_fair(&source, refresh_fair) {
        Some(d) => d,
        None => return false,
    };

    log::debug!(
        "Matching {} target games against {} exhibitors",
        targets.len(),
        fair.exhibitors.len()
    );
    let results = match_games(&targets, &fair.exhibitors, &fair.products, &config);
    let report = build_route(&results);

    let out_dir = output.unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = fs::create_dir_all(&out_dir) {
        return fail(format!("Failed to create output directory: {e}"));
    }
    let md_path = out_dir.join("essen-route.md");
    let csv_path = out_dir.join("route-summary.csv");
    let json_path = out_dir.join("route-report.json");

    if let Err(e) = fs::write(&md_path, report.to_markdown()) {
        return fail(format!("Failed to write {}: {e}", md_path.display()));
    }
    if let Err(e) = fs::File::create(&csv_path).map_err(Into::into).and_then(|f| report.write_csv(f)) {
        return fail(format!("Failed to write {}: {e}", csv_path.display()));
    }
    if let Err(e) = fs::File::create(&json_path).map_err(Into::into).and_then(|f| report.write_json(f)) {
        return fail(format!("Failed to write {}: {e}", json_path.display()));
    }

    print_route_summary(&report);

    println!();
    println!(
        "{} Route written to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        md_path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    println!("  {}", csv_path.display());
    println!("  {}", json_path.display());
    true
}

fn print_route_summary(report: &RouteReport) {
    println!("{}", "Route:".if_supports_color(Stdout, |t| t.bold()));
    println!(
        "  {} of {} games matched, {} booths across {} halls",
        report.matched_games,
        report.total_games,
        report.stops.len(),
        report.halls().len(),
    );

    for hall in report.halls() {
        let stops: Vec<_> = report.stops.iter().filter(|s| s.hall == hall).collect();
        let games: usize = stops.iter().map(|s| s.games.len()).sum();
        println!(
            "    {:<12} {} stops, {} games",
            format_hall(&hall),
            stops.len(),
            games,
        );
    }

    let buys: Vec<_> = report.buy_stops().collect();
    if !buys.is_empty() {
        println!();
        println!(
            "{}",
            "Priority stops (want to buy):".if_supports_color(Stdout, |t| t.bold()),
        );
        for stop in buys {
            let titles: Vec<&str> = stop
                .games
                .iter()
                .filter(|g| g.want_to_buy)
                .map(|g| g.name.as_str())
                .collect();
            println!(
                "  {} Booth {}  {}  {}",
                format_hall(&stop.hall),
                stop.booth,
                stop.exhibitor.name.if_supports_color(Stdout, |t| t.bold()),
                titles.join(", ").if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }

    if let Some(first) = report.stops.first() {
        println!();
        println!(
            "Suggested start: {} Booth {} ({})",
            format_hall(&first.hall),
            first.booth,
            first.exhibitor.name,
        );
    }

    if !report.unmatched_games.is_empty() {
        println!();
        println!(
            "{} {} games without a booth match:",
            "?".if_supports_color(Stdout, |t| t.yellow()),
            report.unmatched_games.len(),
        );
        for name in &report.unmatched_games {
            println!("  {name}");
        }
    }
}

// -- where --

fn run_where(url: &str, year: Option<String>) -> bool {
    let settings = Settings::load();
    let game_id = match parse_game_url(url) {
        Ok(id) => id,
        Err(e) => return fail(e),
    };

    let source = match FairSource::open(year) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let fair = match load_fair(&source, false) {
        Some(d) => d,
        None => return false,
    };

    let cache = match PageCache::open() {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to open page cache: {e}")),
    };
    let client = match BggClient::new(
        cache,
        DelayRange::new(settings.delay_min, settings.delay_max),
    ) {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to build BGG client: {e}")),
    };

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let game = rt.block_on(async {
        let pb = spinner(format!("Fetching game {game_id}..."));
        let result = fetch_game(&client, game_id).await;
        pb.finish_and_clear();
        result
    });
    let game = match game {
        Ok(g) => g,
        Err(e) => return fail(format!("Failed to fetch game {game_id}: {e}")),
    };

    println!(
        "{} {}",
        game.name.if_supports_color(Stdout, |t| t.bold()),
        game.bgg_url().if_supports_color(Stdout, |t| t.dimmed()),
    );
    if !game.publishers.is_empty() {
        println!("  Publishers: {}", game.publishers.join(", "));
    }
    println!();

    let config = MatchConfig {
        publisher_threshold: settings.publisher_threshold,
        product_threshold: settings.product_threshold,
    };
    let matches = match_game(&game, &fair.exhibitors, &fair.products, &config);

    if matches.is_empty() {
        println!(
            "{}",
            "No booth match found at this fair.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return true;
    }

    for (i, m) in matches.iter().enumerate() {
        print_booth_match(i + 1, m);
    }
    true
}

fn print_booth_match(rank: usize, m: &BoothMatch) {
    let confirmed = if m.product_confirmed {
        format!(" {}", "\u{2713}".if_supports_color(Stdout, |t| t.green()))
    } else {
        String::new()
    };
    println!(
        "{}. {} {} {}{}",
        rank,
        m.exhibitor.name.if_supports_color(Stdout, |t| t.bold()),
        format!("({}, Booth {})", format_hall(&m.exhibitor.hall), m.exhibitor.booth)
            .if_supports_color(Stdout, |t| t.cyan()),
        confidence_label(m.confidence),
        confirmed,
    );
    println!("   {}", m.reason);
    if let Some(product) = &m.product_match {
        println!("   {product}");
    }
    if !m.exhibitor.country.is_empty() {
        println!(
            "   {}",
            m.exhibitor.country.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    if !m.exhibitor.website.is_empty() {
        println!(
            "   {}",
            m.exhibitor.website.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    println!();
}

// -- tags --

fn run_tags(query: Option<String>, include_expansions: bool) -> bool {
    let enriched = match load_snapshot() {
        Some(c) => c,
        None => return false,
    };

    let owned: Vec<&Game> = enriched
        .owned_games()
        .filter(|g| include_expansions || !g.is_expansion)
        .collect();
    if owned.is_empty() {
        println!(
            "{}",
            "No owned games in the snapshot.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return true;
    }

    let Some(query) = query else {
        print_tag_stats(&owned);
        return true;
    };

    let needle = query.to_lowercase();
    let hits: Vec<&Game> = if needle == "unplayed" {
        owned
            .iter()
            .copied()
            .filter(|g| g.personal_rating.is_none())
            .collect()
    } else {
        owned
            .iter()
            .copied()
            .filter(|g| g.tags.iter().any(|t| t.to_lowercase().contains(&needle)))
            .collect()
    };

    if hits.is_empty() {
        println!(
            "{}",
            format!("No owned games match '{query}'.").if_supports_color(Stdout, |t| t.dimmed()),
        );
        println!();
        print_tag_stats(&owned);
        return true;
    }

    println!(
        "{}",
        format!("{} owned games for '{}':", hits.len(), query)
            .if_supports_color(Stdout, |t| t.bold()),
    );
    for game in &hits {
        let mut notes = Vec::new();
        if let Some(r) = game.average_rating {
            notes.push(format!("rating {r:.1}"));
        }
        if let Some(w) = game.complexity_weight {
            notes.push(format!("weight {w:.1}"));
        }
        match game.personal_rating {
            Some(r) => notes.push(format!("rated {r:.0}")),
            None => notes.push("unplayed".to_string()),
        }
        println!(
            "  {}  {}",
            game.name,
            notes.join(", ").if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    true
}

/// Per-tag counts with up to three example games, most common first.
fn print_tag_stats(owned: &[&Game]) {
    let mut counts: BTreeMap<&str, (usize, Vec<&str>)> = BTreeMap::new();
    for game in owned {
        for tag in &game.tags {
            let entry = counts.entry(tag.as_str()).or_default();
            entry.0 += 1;
            if entry.1.len() < 3 {
                entry.1.push(game.name.as_str());
            }
        }
    }
    if counts.is_empty() {
        println!(
            "{}",
            "No tags in the snapshot.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        println!("Run 'meeple-scout enrich' to fetch tags from BGG.");
        return;
    }

    let mut rows: Vec<(&str, usize, Vec<&str>)> = counts
        .into_iter()
        .map(|(tag, (count, examples))| (tag, count, examples))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!(
        "{}",
        "Tags across owned games:".if_supports_color(Stdout, |t| t.bold()),
    );
    for (tag, count, examples) in rows {
        println!(
            "  {:<28} {:>3}  {}",
            tag,
            count,
            examples.join(", ").if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
}

// -- fair --

fn run_fair_fetch(year: Option<String>) -> bool {
    let source = match FairSource::open(year) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let pb = spinner(format!("Fetching spiel{} exhibitor data...", source.year()));
    match source.load(true) {
        Ok(data) => {
            pb.finish_and_clear();
            println!(
                "{} {} exhibitors, {} products cached for spiel{}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                data.exhibitors.len(),
                data.products.len(),
                source.year(),
            );
            println!("  {}", source.document_path("exhibitors").display());
            println!("  {}", source.document_path("products").display());
            true
        }
        Err(e) => {
            pb.finish_and_clear();
            fail(format!("Fetch failed: {e}"))
        }
    }
}

fn run_fair_stats(year: Option<String>) -> bool {
    let source = match FairSource::open(year) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data = match load_fair(&source, false) {
        Some(d) => d,
        None => return false,
    };

    println!(
        "{}",
        format!("spiel{}", source.year()).if_supports_color(Stdout, |t| t.bold()),
    );
    println!("  Exhibitors: {}", data.exhibitors.len());
    println!("  Products:   {}", data.products.len());
    let multi = data
        .exhibitors
        .iter()
        .filter(|e| e.is_multi_location)
        .count();
    if multi > 0 {
        println!("  Multi-hall: {multi}");
    }
    println!();

    println!(
        "{}",
        "Exhibitors per hall:".if_supports_color(Stdout, |t| t.bold()),
    );
    for (hall, count) in data.hall_counts() {
        println!("  {:<12} {:>4}", format_hall(&hall), count);
    }
    true
}

// -- cache --

fn run_cache_stats() -> bool {
    let cache = match PageCache::open() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let entries = match cache.list() {
        Ok(e) => e,
        Err(e) => return fail(format!("Error listing cache: {e}")),
    };

    if entries.is_empty() {
        println!(
            "{}",
            "No cached pages.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        println!("Run 'meeple-scout enrich' to populate the cache.");
    } else {
        let total: u64 = entries.iter().map(|e| e.size).sum();
        let sentinels = entries.iter().filter(|e| e.not_found).count();
        println!("{}", "Page cache:".if_supports_color(Stdout, |t| t.bold()));
        println!(
            "  Location: {}",
            cache.root().display().if_supports_color(Stdout, |t| t.cyan()),
        );
        println!(
            "  Entries:  {} ({} not-found sentinels)",
            entries.len(),
            sentinels,
        );
        println!("  Size:     {}", format_bytes(total));
    }

    if let Ok(snapshot) = snapshot_path() {
        if let Ok(meta) = fs::metadata(&snapshot) {
            println!();
            println!(
                "{}",
                "Enrichment snapshot:".if_supports_color(Stdout, |t| t.bold()),
            );
            println!(
                "  Location: {}",
                snapshot.display().if_supports_color(Stdout, |t| t.cyan()),
            );
            println!("  Size:     {}", format_bytes(meta.len()));
        }
    }
    true
}

fn run_cache_clear(all: bool) -> bool {
    let cache = match PageCache::open() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    match cache.clear() {
        Ok(freed) => {
            println!(
                "{} Page cache cleared ({} freed)",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                format_bytes(freed),
            );
        }
        Err(e) => return fail(format!("Error clearing cache: {e}")),
    }

    if all {
        let mut freed = 0u64;
        if let Ok(source) = FairSource::open(None) {
            freed += remove_dir_files(source.root());
        }
        if let Ok(snapshot) = snapshot_path() {
            if let Ok(meta) = fs::metadata(&snapshot) {
                if fs::remove_file(&snapshot).is_ok() {
                    freed += meta.len();
                }
            }
        }
        println!(
            "{} Fair data and enrichment snapshot cleared ({} freed)",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            format_bytes(freed),
        );
    }
    true
}

/// Delete the plain files in `dir`, returning the bytes freed.
fn remove_dir_files(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let mut freed = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if fs::remove_file(&path).is_ok() {
            freed += size;
        }
    }
    freed
}

// -- config --

fn run_config_show() -> bool {
    let path = settings_path();
    let settings = Settings::load();

    println!(
        "{}",
        "meeple-scout configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();
    if path.exists() {
        println!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        println!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found, using defaults)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    println!();
    println!(
        "  {} {:.2}",
        "publisher_threshold:".if_supports_color(Stdout, |t| t.cyan()),
        settings.publisher_threshold,
    );
    println!(
        "  {} {:.2}",
        "product_threshold:  ".if_supports_color(Stdout, |t| t.cyan()),
        settings.product_threshold,
    );
    println!(
        "  {} {:.1}s",
        "delay_min:          ".if_supports_color(Stdout, |t| t.cyan()),
        settings.delay_min,
    );
    println!(
        "  {} {:.1}s",
        "delay_max:          ".if_supports_color(Stdout, |t| t.cyan()),
        settings.delay_max,
    );
    match &settings.collection_path {
        Some(p) => println!(
            "  {} {}",
            "collection_path:    ".if_supports_color(Stdout, |t| t.cyan()),
            p.display(),
        ),
        None => println!(
            "  {} {}",
            "collection_path:    ".if_supports_color(Stdout, |t| t.cyan()),
            "not set".if_supports_color(Stdout, |t| t.yellow()),
        ),
    }
    true
}

fn run_config_setup() -> bool {
    println!(
        "{}",
        "meeple-scout setup".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();

    let existing = Settings::load();

    let read_line = |prompt: &str, default: &str| -> String {
        print!("  {} [{}]: ", prompt, default);
        std::io::stdout().flush().unwrap();

        let mut input = String::new();
        std::io::stdin().read_line(&mut input).unwrap();
        let trimmed = input.trim().to_string();
        if trimmed.is_empty() {
            default.to_string()
        } else {
            trimmed
        }
    };

    let read_f64 = |prompt: &str, current: f64| -> f64 {
        let raw = read_line(prompt, &current.to_string());
        match raw.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                println!(
                    "    {}",
                    format!("Not a number, keeping {current}")
                        .if_supports_color(Stdout, |t| t.yellow()),
                );
                current
            }
        }
    };

    let publisher_threshold = read_f64("publisher_threshold", existing.publisher_threshold);
    let product_threshold = read_f64("product_threshold", existing.product_threshold);
    let delay_min = read_f64("delay_min", existing.delay_min);
    let delay_max = read_f64("delay_max", existing.delay_max);

    let collection_default = existing
        .collection_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    let collection_raw = read_line("collection_path", &collection_default);
    let collection_path = if collection_raw == "none" {
        None
    } else {
        Some(PathBuf::from(collection_raw))
    };

    let settings = Settings {
        publisher_threshold,
        product_threshold,
        delay_min,
        delay_max,
        collection_path,
    };

    match settings.save() {
        Ok(()) => {
            println!();
            println!(
                "{} Settings saved to {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                settings_path().display().if_supports_color(Stdout, |t| t.cyan()),
            );
            true
        }
        Err(e) => {
            eprintln!();
            fail(format!("Failed to save settings: {e}"))
        }
    }
}

fn run_config_path() -> bool {
    println!("{}", settings_path().display());
    true
}

// -- shared loaders --

/// Load the enrichment snapshot or explain how to create one.
fn load_snapshot() -> Option<EnrichedCollection> {
    let path = match snapshot_path() {
        Ok(p) => p,
        Err(e) => {
            fail(e);
            return None;
        }
    };
    match EnrichedCollection::load(&path) {
        Ok(c) => Some(c),
        Err(e) => {
            fail(format!("Failed to load the enrichment snapshot: {e}"));
            eprintln!();
            eprintln!("Run 'meeple-scout enrich' first.");
            None
        }
    }
}

/// Load fair data behind a spinner, printing the exhibitor count.
fn load_fair(source: &FairSource, refresh: bool) -> Option<meeple_scout_fair::FairData> {
    let pb = spinner(format!("Loading spiel{} exhibitor data...", source.year()));
    match source.load(refresh) {
        Ok(data) => {
            pb.finish_and_clear();
            println!(
                "{} {} exhibitors, {} products (spiel{})",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                data.exhibitors.len(),
                data.products.len(),
                source.year(),
            );
            println!();
            Some(data)
        }
        Err(e) => {
            pb.finish_and_clear();
            fail(format!("Failed to load fair data: {e}"));
            None
        }
    }
}
