use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::cache::{CachedPage, PageCache};
use crate::error::ScrapeError;

const BASE_URL: &str = "https://boardgamegeek.com";
// BGG rejects clients without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Randomized pause between requests, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min: f64,
    max: f64,
}

impl DelayRange {
    /// Build a range, clamping negatives to zero and forcing `max >= min`.
    pub fn new(min: f64, max: f64) -> Self {
        let min = min.max(0.0);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn max_secs(&self) -> f64 {
        self.max
    }

    fn sample(&self) -> Duration {
        let secs = if self.max <= self.min {
            self.min
        } else {
            rand::thread_rng().gen_range(self.min..=self.max)
        };
        Duration::from_secs_f64(secs)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(1.0, 3.0)
    }
}

/// HTTP client for the BoardGameGeek site with request pacing and a
/// durable page cache.
pub struct BggClient {
    http: reqwest::Client,
    cache: PageCache,
    delay: DelayRange,
    last_request: Arc<Mutex<Instant>>,
}

impl BggClient {
    pub fn new(cache: PageCache, delay: DelayRange) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            cache,
            delay,
            last_request: Arc::new(Mutex::new(
                Instant::now() - Duration::from_secs_f64(delay.max_secs()),
            )),
        })
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Fetch a game page, serving from cache when possible. A cached 404
    /// sentinel short-circuits to [`ScrapeError::NotFound`] without touching
    /// the network.
    pub async fn fetch_game_page(&self, game_id: u64) -> Result<String, ScrapeError> {
        match self.cache.get(game_id)? {
            Some(CachedPage::Found { body, .. }) => {
                log::debug!("Cache hit for game {game_id}");
                return Ok(body);
            }
            Some(CachedPage::NotFound { .. }) => {
                log::debug!("Cached not-found for game {game_id}");
                return Err(ScrapeError::NotFound);
            }
            None => {}
        }

        self.pace().await;

        let url = format!("{BASE_URL}/boardgame/{game_id}");
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            self.cache.put(game_id, &CachedPage::not_found())?;
            return Err(ScrapeError::NotFound);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(ScrapeError::Server {
                status: status.as_u16(),
            });
        }
        let body = resp.error_for_status()?.text().await?;

        self.cache.put(game_id, &CachedPage::found(body.clone()))?;
        Ok(body)
    }

    /// Enforce pacing: wait until a freshly sampled delay has passed since
    /// the previous request. The sample happens before taking the lock so
    /// the rng guard never lives across an await.
    async fn pace(&self) {
        let wait = self.delay.sample();
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < wait {
            tokio::time::sleep(wait - elapsed).await;
        }
        *last = Instant::now();
    }
}
