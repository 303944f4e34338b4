//! Exhibitor and product rows from the fair's map service.
//!
//! Raw rows mirror the upstream column names and tolerate both numeric and
//! string ids. Processing turns them into clean records, expanding
//! exhibitors with several booths into one entry per hall.

use serde::{Deserialize, Serialize};

/// Exhibitor row as served upstream. Unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExhibitor {
    #[serde(rename = "ID")]
    pub id: serde_json::Value,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "LAND")]
    pub land: String,
    #[serde(rename = "WEB")]
    pub web: String,
    #[serde(rename = "EMAIL")]
    pub email: String,
    #[serde(rename = "INFO")]
    pub info: String,
    #[serde(rename = "STAND")]
    pub stand: String,
    #[serde(rename = "HALLE")]
    pub halle: String,
}

/// Product row as served upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    #[serde(rename = "TITEL")]
    pub titel: String,
    #[serde(rename = "FIRMA_ID")]
    pub firma_id: serde_json::Value,
    #[serde(rename = "UNTERTITEL")]
    pub untertitel: String,
    #[serde(rename = "INFO")]
    pub info: String,
}

/// One exhibitor at one booth. An exhibitor listed in several halls
/// appears once per hall, all sharing the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhibitor {
    pub id: String,
    pub name: String,
    pub hall: String,
    pub booth: String,
    pub country: String,
    pub website: String,
    pub email: String,
    pub info: String,
    pub is_multi_location: bool,
}

/// One product in the fair catalog, keyed to its exhibitor by company id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub company_id: String,
    pub subtitle: String,
    pub info: String,
}

/// Expand raw exhibitor rows into per-hall entries. Rows without a hall or
/// booth are dropped. `HALLE` and `STAND` are pipe-separated parallel
/// lists; when they are ragged the first booth stands in for the missing
/// positions.
pub fn process_exhibitors(raw: Vec<RawExhibitor>) -> Vec<Exhibitor> {
    let mut exhibitors = Vec::new();
    for row in raw {
        let Some(id) = id_key(&row.id) else {
            continue;
        };
        let halls = split_list(&row.halle);
        let booths = split_list(&row.stand);
        if halls.is_empty() || booths.is_empty() {
            continue;
        }
        let is_multi_location = halls.len() > 1;
        for (i, hall) in halls.iter().enumerate() {
            let booth = booths.get(i).unwrap_or(&booths[0]);
            exhibitors.push(Exhibitor {
                id: id.clone(),
                name: row.name.trim().to_string(),
                hall: clean_hall(hall),
                booth: booth.clone(),
                country: row.land.trim().to_string(),
                website: row.web.trim().to_string(),
                email: row.email.trim().to_string(),
                info: row.info.trim().to_string(),
                is_multi_location,
            });
        }
    }
    exhibitors
}

/// Keep products that have both a title and a company id.
pub fn process_products(raw: Vec<RawProduct>) -> Vec<Product> {
    let mut products = Vec::new();
    for row in raw {
        let Some(company_id) = id_key(&row.firma_id) else {
            continue;
        };
        let title = row.titel.trim();
        if title.is_empty() {
            continue;
        }
        products.push(Product {
            title: title.to_string(),
            company_id,
            subtitle: row.untertitel.trim().to_string(),
            info: row.info.trim().to_string(),
        });
    }
    products
}

/// Normalize a hall label: NBSP to plain space, leading "Hall " dropped.
pub fn clean_hall(text: &str) -> String {
    let cleaned = text.replace('\u{a0}', " ");
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_prefix("Hall ").unwrap_or(cleaned);
    cleaned.trim().to_string()
}

/// Upstream ids arrive as numbers or strings depending on the column.
fn id_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_exhibitor(id: serde_json::Value, name: &str, halle: &str, stand: &str) -> RawExhibitor {
        RawExhibitor {
            id,
            name: name.to_string(),
            halle: halle.to_string(),
            stand: stand.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_rows_accept_numeric_and_string_ids() {
        let rows: Vec<RawExhibitor> =
            serde_json::from_str(r#"[{"ID": 101, "NAME": "CGE"}, {"ID": "202", "NAME": "Feuerland"}]"#)
                .unwrap();
        assert_eq!(id_key(&rows[0].id).as_deref(), Some("101"));
        assert_eq!(id_key(&rows[1].id).as_deref(), Some("202"));
    }

    #[test]
    fn test_multi_hall_rows_expand() {
        let raw = vec![raw_exhibitor(json!(7), "Asmodee", "3|4", "B100|C200")];
        let exhibitors = process_exhibitors(raw);
        assert_eq!(exhibitors.len(), 2);
        assert_eq!(exhibitors[0].hall, "3");
        assert_eq!(exhibitors[0].booth, "B100");
        assert_eq!(exhibitors[1].hall, "4");
        assert_eq!(exhibitors[1].booth, "C200");
        assert!(exhibitors[0].is_multi_location);
        assert_eq!(exhibitors[0].id, exhibitors[1].id);
    }

    #[test]
    fn test_ragged_booth_list_falls_back_to_first() {
        let raw = vec![raw_exhibitor(json!(7), "Asmodee", "3|4|5", "B100")];
        let exhibitors = process_exhibitors(raw);
        assert_eq!(exhibitors.len(), 3);
        assert!(exhibitors.iter().all(|e| e.booth == "B100"));
    }

    #[test]
    fn test_rows_without_hall_or_booth_are_dropped() {
        let raw = vec![
            raw_exhibitor(json!(1), "No Hall", "", "B100"),
            raw_exhibitor(json!(2), "No Booth", "3", "  "),
            raw_exhibitor(serde_json::Value::Null, "No Id", "3", "B100"),
            raw_exhibitor(json!(4), "Kept", "3", "B100"),
        ];
        let exhibitors = process_exhibitors(raw);
        assert_eq!(exhibitors.len(), 1);
        assert_eq!(exhibitors[0].name, "Kept");
        assert!(!exhibitors[0].is_multi_location);
    }

    #[test]
    fn test_hall_labels_are_cleaned() {
        assert_eq!(clean_hall("Hall 3"), "3");
        assert_eq!(clean_hall("Hall\u{a0}6"), "6");
        assert_eq!(clean_hall("  Galeria  "), "Galeria");
    }

    #[test]
    fn test_products_need_title_and_company() {
        let raw = vec![
            RawProduct {
                titel: "Codenames".to_string(),
                firma_id: json!(101),
                untertitel: "Party game".to_string(),
                ..Default::default()
            },
            RawProduct {
                titel: "   ".to_string(),
                firma_id: json!(101),
                ..Default::default()
            },
            RawProduct {
                titel: "Orphan".to_string(),
                firma_id: serde_json::Value::Null,
                ..Default::default()
            },
        ];
        let products = process_products(raw);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Codenames");
        assert_eq!(products[0].company_id, "101");
        assert_eq!(products[0].subtitle, "Party game");
    }
}
