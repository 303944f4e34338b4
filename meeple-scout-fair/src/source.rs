//! Fetching and snapshotting the fair's exhibitor and product feeds.
//!
//! Raw documents are cached verbatim under the user cache dir, one file per
//! feed and year, so planning works offline once fetched. A fetch failure
//! falls back to the snapshot; only when neither exists does loading fail.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FairError;
use crate::types::{Exhibitor, Product, process_exhibitors, process_products};

const BASE_URL: &str = "https://maps.eyeled-services.de/en";

// Column lists match what the official fair app requests.
const EXHIBITOR_COLUMNS: &str = r#"["ID","NAME","ADRESSE","LAND","LOGO","PLZ","STADT","WEB","EMAIL","INFO","TELEFON","S_ORDER","STAND","HALLE"]"#;
const PRODUCT_COLUMNS: &str = r#"["INFO","S_ORDER","TITEL","FIRMA_ID","UNTERTITEL","BILDER","BILDER_VERSIONEN","BILDER_TEXTE"]"#;

/// Two-digit year of the current fair edition.
pub fn fair_year() -> String {
    chrono::Local::now().format("%y").to_string()
}

/// Everything the fair feeds provide for one edition.
#[derive(Debug, Clone, Default)]
pub struct FairData {
    pub exhibitors: Vec<Exhibitor>,
    pub products: Vec<Product>,
}

impl FairData {
    pub fn exhibitor_by_id(&self, id: &str) -> Option<&Exhibitor> {
        self.exhibitors.iter().find(|e| e.id == id)
    }

    /// Hall labels with exhibitor counts, busiest hall first.
    pub fn hall_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for exhibitor in &self.exhibitors {
            *counts.entry(exhibitor.hall.clone()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

/// Loader for one fair edition, rooted at a snapshot directory.
#[derive(Debug, Clone)]
pub struct FairSource {
    root: PathBuf,
    year: String,
}

impl FairSource {
    /// Source for the default snapshot location under the user cache dir.
    pub fn open(year: Option<String>) -> Result<Self, FairError> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| FairError::cache("Could not determine cache directory"))?;
        Ok(Self::at(dir.join("meeple-scout").join("fair"), year))
    }

    /// Source rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>, year: Option<String>) -> Self {
        Self {
            root: root.into(),
            year: year.unwrap_or_else(fair_year),
        }
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load both feeds. With `refresh`, fetch fresh copies even when a
    /// snapshot exists.
    pub fn load(&self, refresh: bool) -> Result<FairData, FairError> {
        let exhibitors_doc = self.load_document("exhibitors", EXHIBITOR_COLUMNS, refresh)?;
        let products_doc = self.load_document("products", PRODUCT_COLUMNS, refresh)?;

        let exhibitors = process_exhibitors(parse_rows(&exhibitors_doc, "exhibitors")?);
        let products = process_products(parse_rows(&products_doc, "products")?);
        log::debug!(
            "Fair spiel{}: {} exhibitors, {} products",
            self.year,
            exhibitors.len(),
            products.len()
        );
        Ok(FairData {
            exhibitors,
            products,
        })
    }

    pub fn document_path(&self, kind: &str) -> PathBuf {
        self.root.join(format!("{kind}-{}.json", self.year))
    }

    fn load_document(&self, kind: &str, columns: &str, refresh: bool) -> Result<String, FairError> {
        let path = self.document_path(kind);
        if !refresh {
            match fs::read_to_string(&path) {
                Ok(contents) => return Ok(contents),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        match self.fetch_document(kind, columns) {
            Ok(text) => {
                store_document(&path, &text)?;
                Ok(text)
            }
            Err(e) => {
                log::warn!("Could not fetch fair {kind}: {e}");
                // A stale snapshot beats nothing at all.
                match fs::read_to_string(&path) {
                    Ok(contents) => Ok(contents),
                    Err(_) => Err(FairError::unavailable(format!(
                        "no {kind} data for spiel{}: fetch failed and no snapshot exists",
                        self.year
                    ))),
                }
            }
        }
    }

    fn fetch_document(&self, kind: &str, columns: &str) -> Result<String, FairError> {
        let url = format!("{BASE_URL}/spiel{}/{kind}?columns={columns}", self.year);
        log::info!("Fetching {url}");
        let resp = reqwest::blocking::get(&url)?.error_for_status()?;
        Ok(resp.text()?)
    }
}

/// Commit a raw document atomically next to any previous snapshot.
fn store_document(path: &Path, contents: &str) -> Result<(), FairError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Accept both payload shapes: a bare JSON array, or an object wrapping the
/// array under the feed name. Malformed rows are skipped with a warning.
fn parse_rows<T: serde::de::DeserializeOwned>(text: &str, key: &str) -> Result<Vec<T>, FairError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    let rows = match doc {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => {
                return Err(FairError::unavailable(format!(
                    "unexpected shape in {key} payload"
                )));
            }
        },
        _ => {
            return Err(FairError::unavailable(format!(
                "unexpected shape in {key} payload"
            )));
        }
    };

    let mut parsed = Vec::new();
    for row in rows {
        match serde_json::from_value(row) {
            Ok(value) => parsed.push(value),
            Err(e) => log::warn!("Skipping malformed {key} row: {e}"),
        }
    }
    Ok(parsed)
}
