//! Pulls game details out of a fetched catalog page.
//!
//! Page markup shifts over time, so extraction runs a fixed list of
//! independent strategies and folds their results together. Earlier
//! strategies win for single values; name lists take the union.

use regex::Regex;
use scraper::{Html, Selector};

const PUBLISHER_RELATION: &str = "boardgamepublisher";
const TAG_RELATIONS: [&str; 2] = ["boardgamemechanic", "boardgamecategory"];

const STRATEGIES: [fn(&str) -> GameRecord; 3] =
    [extract_from_preload, extract_from_links, extract_from_credits];

/// Everything one page can tell us about a game. Fields a strategy could
/// not recover stay `None`/empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRecord {
    pub name: Option<String>,
    pub publishers: Vec<String>,
    pub tags: Vec<String>,
    pub average_rating: Option<f32>,
    pub complexity_weight: Option<f32>,
    pub playing_time: Option<u32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
}

impl GameRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.publishers.is_empty()
            && self.tags.is_empty()
            && self.average_rating.is_none()
            && self.complexity_weight.is_none()
            && self.playing_time.is_none()
            && self.min_players.is_none()
            && self.max_players.is_none()
    }

    /// Fold a later attempt into this one. Present scalars are kept; name
    /// lists are unioned with case-insensitive dedup.
    fn merge_from(&mut self, other: GameRecord) {
        if self.name.is_none() {
            self.name = other.name;
        }
        merge_names(&mut self.publishers, other.publishers);
        merge_names(&mut self.tags, other.tags);
        if self.average_rating.is_none() {
            self.average_rating = other.average_rating;
        }
        if self.complexity_weight.is_none() {
            self.complexity_weight = other.complexity_weight;
        }
        if self.playing_time.is_none() {
            self.playing_time = other.playing_time;
        }
        if self.min_players.is_none() {
            self.min_players = other.min_players;
        }
        if self.max_players.is_none() {
            self.max_players = other.max_players;
        }
    }
}

/// Run every extraction strategy over the page and merge what they found.
/// Never fails; a page nothing matched yields an empty record.
pub fn extract_game_record(html: &str) -> GameRecord {
    let mut record = GameRecord::default();
    for strategy in STRATEGIES {
        record.merge_from(strategy(html));
    }
    record
}

/// Primary strategy: the `GEEK.geekitemPreload` JSON blob embedded in a
/// script tag carries the full item, including stats the visible markup
/// only renders client-side.
fn extract_from_preload(html: &str) -> GameRecord {
    let mut record = GameRecord::default();
    let Some(preload) = preload_block(html) else {
        return record;
    };
    let item = &preload["item"];

    record.name = item["name"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    record.publishers = link_names(item, PUBLISHER_RELATION);
    for relation in TAG_RELATIONS {
        for name in link_names(item, relation) {
            push_unique(&mut record.tags, &name);
        }
    }
    record.average_rating = number_field(&item["stats"]["average"]);
    record.complexity_weight = number_field(&item["stats"]["avgweight"]);
    record.playing_time = int_field(&item["minplaytime"]);
    record.min_players = int_field(&item["minplayers"]);
    record.max_players = int_field(&item["maxplayers"]);
    record
}

fn preload_block(html: &str) -> Option<serde_json::Value> {
    let re = Regex::new(r"(?s)GEEK\.geekitemPreload\s*=\s*(\{.*?\});").ok()?;
    let caps = re.captures(html)?;
    serde_json::from_str(caps.get(1)?.as_str()).ok()
}

fn link_names(item: &serde_json::Value, relation: &str) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(links) = item["links"][relation].as_array() {
        for link in links {
            if let Some(name) = link["name"].as_str() {
                let name = name.trim();
                if !name.is_empty() {
                    push_unique(&mut names, name);
                }
            }
        }
    }
    names
}

/// Secondary strategy: anchors whose href routes through a relation path,
/// e.g. `/boardgamepublisher/157/asmodee`.
fn extract_from_links(html: &str) -> GameRecord {
    let mut record = GameRecord::default();
    let doc = Html::parse_document(html);

    record.publishers = relation_link_texts(&doc, PUBLISHER_RELATION);
    for relation in TAG_RELATIONS {
        for name in relation_link_texts(&doc, relation) {
            push_unique(&mut record.tags, &name);
        }
    }
    record
}

fn relation_link_texts(doc: &Html, relation: &str) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(selector) = Selector::parse(&format!(r#"a[href*="/{relation}/"]"#)) else {
        return names;
    };
    for link in doc.select(&selector) {
        let text = link.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() {
            push_unique(&mut names, text);
        }
    }
    names
}

/// Last-resort strategy: publisher anchors inside the header credits
/// block, for pages where the relation hrefs are rewritten.
fn extract_from_credits(html: &str) -> GameRecord {
    let mut record = GameRecord::default();
    let doc = Html::parse_document(html);
    let Ok(rows) = Selector::parse("div.game-header-credits li") else {
        return record;
    };
    let Ok(anchor) = Selector::parse("a") else {
        return record;
    };

    for row in doc.select(&rows) {
        let row_text = row.text().collect::<String>();
        if !row_text.contains("Publisher") {
            continue;
        }
        for link in row.select(&anchor) {
            let name = link.text().collect::<String>();
            let name = name.trim();
            if name.is_empty() || name.eq_ignore_ascii_case("publishers") {
                continue;
            }
            push_unique(&mut record.publishers, name);
        }
    }
    record
}

fn push_unique(names: &mut Vec<String>, candidate: &str) {
    let key = candidate.to_lowercase();
    if !names.iter().any(|n| n.to_lowercase() == key) {
        names.push(candidate.to_string());
    }
}

fn merge_names(into: &mut Vec<String>, from: Vec<String>) {
    for name in from {
        push_unique(into, &name);
    }
}

fn number_field(value: &serde_json::Value) -> Option<f32> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n > 0.0).then_some(n as f32)
}

fn int_field(value: &serde_json::Value) -> Option<u32> {
    let n: u64 = match value {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if n == 0 { None } else { u32::try_from(n).ok() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRELOAD_PAGE: &str = r#"<html><head><script>
GEEK.geekitemPreload = {"item":{"name":"Ark Nova","links":{"boardgamepublisher":[{"name":"Feuerland Spiele"},{"name":"Capstone Games"}],"boardgamemechanic":[{"name":"Hand Management"}],"boardgamecategory":[{"name":"Animals"}]},"stats":{"average":"8.5","avgweight":3.5},"minplaytime":"90","minplayers":1,"maxplayers":"4"}};
</script></head><body></body></html>"#;

    const LINKS_PAGE: &str = r#"<html><body>
<a href="/boardgamepublisher/123/feuerland-spiele">Feuerland Spiele</a>
<a href="/boardgamepublisher/456/capstone-games">Capstone Games</a>
<a href="/boardgamemechanic/2040/hand-management">Hand Management</a>
<a href="/boardgamecategory/1089/animals">Animals</a>
<a href="/boardgamedesigner/9/wigge">Mathias Wigge</a>
</body></html>"#;

    const CREDITS_PAGE: &str = r##"<html><body>
<div class="game-header-credits"><ul>
<li><strong>Designer:</strong> <a href="#">Mathias Wigge</a></li>
<li><strong>Publisher:</strong> <a href="#">Feuerland Spiele</a> <a href="#">Capstone Games</a></li>
</ul></div>
</body></html>"##;

    #[test]
    fn test_preload_strategy() {
        let record = extract_from_preload(PRELOAD_PAGE);
        assert_eq!(record.name.as_deref(), Some("Ark Nova"));
        assert_eq!(record.publishers, vec!["Feuerland Spiele", "Capstone Games"]);
        assert_eq!(record.tags, vec!["Hand Management", "Animals"]);
        assert_eq!(record.average_rating, Some(8.5));
        assert_eq!(record.complexity_weight, Some(3.5));
        assert_eq!(record.playing_time, Some(90));
        assert_eq!(record.min_players, Some(1));
        assert_eq!(record.max_players, Some(4));
    }

    #[test]
    fn test_links_strategy_skips_other_relations() {
        let record = extract_from_links(LINKS_PAGE);
        assert_eq!(record.publishers, vec!["Feuerland Spiele", "Capstone Games"]);
        assert_eq!(record.tags, vec!["Hand Management", "Animals"]);
        assert!(record.name.is_none());
    }

    #[test]
    fn test_credits_strategy_only_reads_publisher_rows() {
        let record = extract_from_credits(CREDITS_PAGE);
        assert_eq!(record.publishers, vec!["Feuerland Spiele", "Capstone Games"]);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_merge_prefers_earlier_strategy() {
        let mut first = GameRecord {
            name: Some("Ark Nova".to_string()),
            publishers: vec!["Feuerland Spiele".to_string()],
            average_rating: Some(8.5),
            ..Default::default()
        };
        first.merge_from(GameRecord {
            name: Some("Something Else".to_string()),
            publishers: vec!["FEUERLAND SPIELE".to_string(), "Capstone Games".to_string()],
            average_rating: Some(1.0),
            playing_time: Some(90),
            ..Default::default()
        });

        assert_eq!(first.name.as_deref(), Some("Ark Nova"));
        assert_eq!(first.publishers, vec!["Feuerland Spiele", "Capstone Games"]);
        assert_eq!(first.average_rating, Some(8.5));
        assert_eq!(first.playing_time, Some(90));
    }

    #[test]
    fn test_strategies_union_across_the_page() {
        let page = format!(
            r#"{PRELOAD_PAGE}<html><body><a href="/boardgamepublisher/7/extra">Extra Verlag</a></body></html>"#
        );
        let record = extract_game_record(&page);
        assert_eq!(
            record.publishers,
            vec!["Feuerland Spiele", "Capstone Games", "Extra Verlag"]
        );
        assert_eq!(record.name.as_deref(), Some("Ark Nova"));
    }

    #[test]
    fn test_unmatched_page_is_empty() {
        let record = extract_game_record("<html><body><p>maintenance</p></body></html>");
        assert!(record.is_empty());
    }

    #[test]
    fn test_numeric_field_coercion() {
        assert_eq!(number_field(&json!("7.25")), Some(7.25));
        assert_eq!(number_field(&json!(6.5)), Some(6.5));
        assert_eq!(number_field(&json!("0")), None);
        assert_eq!(number_field(&json!(null)), None);
        assert_eq!(int_field(&json!("45")), Some(45));
        assert_eq!(int_field(&json!(0)), None);
        assert_eq!(int_field(&json!("abc")), None);
    }
}
