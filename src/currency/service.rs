use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::currency::{
    client::RatesClient,
    error::CurrencyError,
    models::{CreateRateRequest, CurrencyRate, PinRequest, SyncResponse, UpdateRateRequest},
    repository::CurrencyRepository,
    sync::{RateSync, BASE_CURRENCY},
};

/// Exchange rates: manual maintenance plus feed sync
#[derive(Clone)]
pub struct CurrencyService {
    repo: CurrencyRepository,
    client: RatesClient,
}

impl CurrencyService {
    pub fn new(repo: CurrencyRepository, client: RatesClient) -> Self {
        Self { repo, client }
    }

    pub async fn list(&self) -> Result<Vec<CurrencyRate>, CurrencyError> {
        self.repo.list().await
    }

    pub async fn get(&self, code: &str) -> Result<CurrencyRate, CurrencyError> {
        let code = normalize(code);
        self.repo
            .find(&code)
            .await?
            .ok_or(CurrencyError::NotFound(code))
    }

    pub async fn create(&self, req: CreateRateRequest) -> Result<CurrencyRate, CurrencyError> {
        let rate = self
            .repo
            .insert(&req.currency_code, req.rate_to_gbp, req.is_pinned)
            .await?
            .ok_or_else(|| CurrencyError::AlreadyExists(req.currency_code.clone()))?;
        info!("Created rate {} = {}", rate.currency_code, rate.rate_to_gbp);
        Ok(rate)
    }

    pub async fn update(
        &self,
        code: &str,
        req: UpdateRateRequest,
    ) -> Result<CurrencyRate, CurrencyError> {
        let code = normalize(code);
        let rate = self
            .repo
            .update(&code, req.rate_to_gbp, req.is_pinned)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(code.clone()))?;
        info!("Updated rate {} = {}", rate.currency_code, rate.rate_to_gbp);
        Ok(rate)
    }

    pub async fn set_pinned(
        &self,
        code: &str,
        req: PinRequest,
    ) -> Result<CurrencyRate, CurrencyError> {
        let code = normalize(code);
        self.repo
            .set_pinned(&code, req.is_pinned)
            .await?
            .ok_or(CurrencyError::NotFound(code))
    }

    pub async fn delete(&self, code: &str) -> Result<(), CurrencyError> {
        let code = normalize(code);
        if !self.repo.delete(&code).await? {
            return Err(CurrencyError::NotFound(code));
        }
        info!("Deleted rate {}", code);
        Ok(())
    }

    /// Pull the feed and upsert every usable rate in one transaction
    pub async fn sync(&self) -> Result<SyncResponse, CurrencyError> {
        let feed = self.client.fetch().await?;
        if !feed.base.eq_ignore_ascii_case(BASE_CURRENCY) {
            warn!("Rate feed quoted against {}, expected {}", feed.base, BASE_CURRENCY);
        }

        let now = Utc::now();
        let mut tx = self.repo.pool().begin().await?;

        let existing: HashMap<String, CurrencyRate> = CurrencyRepository::lock_all(&mut tx)
            .await?
            .into_iter()
            .map(|rate| (rate.currency_code.clone(), rate))
            .collect();

        let writes = RateSync::plan(&feed, &existing);
        for write in &writes {
            CurrencyRepository::upsert_synced(&mut tx, write, now).await?;
        }

        tx.commit().await?;

        info!(
            "Synced {} rates from {} (feed date {:?})",
            writes.len(),
            self.client.url(),
            feed.date
        );

        Ok(SyncResponse {
            updated_count: writes.len(),
            sync_date: now,
        })
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
