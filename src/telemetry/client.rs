use crate::config::TelemetryConfig;
use crate::error::{AppError, Result};
use crate::telemetry::models::{FeedEntry, FeedResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Source of the most recent sensor reading
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the latest feed entry
    async fn latest_reading(&self) -> Result<FeedEntry>;
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Done(FeedResponse),
    Retry(AppError),
    Fail(AppError),
}

/// ThingSpeak channel feed client
#[derive(Clone)]
pub struct ThingSpeakClient {
    client: Client,
    feed_url: Url,
    channel_id: String,
    timeout_secs: u64,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ThingSpeakClient {
    /// Create a new client from validated configuration
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        if config.channel_id.trim().is_empty() {
            return Err(AppError::Configuration(
                "Telemetry channel id cannot be empty".to_string(),
            ));
        }

        let feed_url = Self::build_feed_url(config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("vitals-predictor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            feed_url,
            channel_id: config.channel_id.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// `{base}/channels/{id}/feeds.json?api_key={key}&results=1`
    fn build_feed_url(config: &TelemetryConfig) -> Result<Url> {
        let raw = format!(
            "{}/channels/{}/feeds.json",
            config.base_url.trim_end_matches('/'),
            config.channel_id.trim()
        );
        let mut url = Url::parse(&raw).map_err(|e| {
            AppError::Configuration(format!("Invalid telemetry URL {}: {}", raw, e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
                query.append_pair("api_key", key);
            }
            query.append_pair("results", "1");
        }

        Ok(url)
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    async fn attempt(&self) -> Attempt {
        let response = match self.client.get(self.feed_url.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Retry(AppError::Timeout(format!(
                    "Telemetry request timed out after {} seconds",
                    self.timeout_secs
                )))
            }
            Err(e) if e.is_connect() => {
                return Attempt::Retry(AppError::Network(format!(
                    "Failed to connect to telemetry provider: {}",
                    e
                )))
            }
            Err(e) => {
                return Attempt::Retry(AppError::Network(format!(
                    "Telemetry request failed: {}",
                    e
                )))
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error = AppError::Network(format!(
                "Telemetry provider returned status {}",
                status
            ));
            return if status.is_server_error() {
                Attempt::Retry(error)
            } else {
                Attempt::Fail(error)
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Attempt::Retry(AppError::Timeout(format!(
                    "Telemetry response body timed out after {} seconds",
                    self.timeout_secs
                )))
            }
            Err(e) => {
                return Attempt::Retry(AppError::Network(format!(
                    "Failed to read telemetry response: {}",
                    e
                )))
            }
        };

        match serde_json::from_str::<FeedResponse>(&body) {
            Ok(feed) => Attempt::Done(feed),
            Err(e) => Attempt::Fail(AppError::MalformedInput(format!(
                "Telemetry response is not a channel feed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl TelemetrySource for ThingSpeakClient {
    async fn latest_reading(&self) -> Result<FeedEntry> {
        let mut attempts: u32 = 0;

        let feed = loop {
            if attempts > 0 {
                // Exponential backoff
                let delay = self
                    .retry_backoff
                    .saturating_mul(2_u32.saturating_pow(attempts - 1));
                sleep(delay).await;
            }
            attempts += 1;

            match self.attempt().await {
                Attempt::Done(feed) => break feed,
                Attempt::Fail(error) => return Err(error),
                Attempt::Retry(error) if attempts > self.max_retries => return Err(error),
                Attempt::Retry(error) => {
                    warn!(
                        channel_id = %self.channel_id,
                        attempt = attempts,
                        max_retries = self.max_retries,
                        error = %error,
                        "Telemetry fetch failed, retrying"
                    );
                }
            }
        };

        debug!(
            channel_id = %self.channel_id,
            attempts,
            entries = feed.feeds.len(),
            "Telemetry feed fetched"
        );

        feed.feeds.into_iter().next().ok_or_else(|| {
            AppError::MalformedInput(format!(
                "Channel {} returned no feed entries",
                self.channel_id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> TelemetryConfig {
        TelemetryConfig {
            base_url: "https://api.thingspeak.com/".to_string(),
            channel_id: "2574220".to_string(),
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 10,
        }
    }

    #[test]
    fn test_feed_url_with_key() {
        let client = ThingSpeakClient::new(&config(Some("READKEY"))).unwrap();
        assert_eq!(
            client.feed_url().as_str(),
            "https://api.thingspeak.com/channels/2574220/feeds.json?api_key=READKEY&results=1"
        );
    }

    #[test]
    fn test_feed_url_public_channel() {
        let client = ThingSpeakClient::new(&config(None)).unwrap();
        assert_eq!(
            client.feed_url().as_str(),
            "https://api.thingspeak.com/channels/2574220/feeds.json?results=1"
        );
    }

    #[test]
    fn test_empty_channel_rejected() {
        let mut cfg = config(None);
        cfg.channel_id = "  ".to_string();
        assert!(matches!(
            ThingSpeakClient::new(&cfg),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut cfg = config(None);
        cfg.base_url = "not a url".to_string();
        assert!(matches!(
            ThingSpeakClient::new(&cfg),
            Err(AppError::Configuration(_))
        ));
    }
}
