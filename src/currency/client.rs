use std::time::Duration;

use tracing::debug;

use crate::currency::{error::CurrencyError, models::RatesFeed};

const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound client for the public exchange-rate feed
#[derive(Clone)]
pub struct RatesClient {
    http: reqwest::Client,
    url: String,
}

impl RatesClient {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<RatesFeed, CurrencyError> {
        debug!("Fetching exchange rates from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CurrencyError::Upstream(format!("rate feed request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CurrencyError::Upstream(format!(
                "rate feed returned status {status}"
            )));
        }

        response
            .json::<RatesFeed>()
            .await
            .map_err(|e| CurrencyError::Upstream(format!("rate feed body unreadable: {e}")))
    }
}
