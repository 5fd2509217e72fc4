//! Scryfall API client
//!
//! Uses async reqwest. Every request goes through one client configured with
//! the run's timeout and User-Agent.

use super::{CatalogClient, LookupOutcome};
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use async_trait::async_trait;
use mtg_common::{
    CardIdentifier, CatalogError, CollectionRequest, CollectionResponse, FallbackId, ScryfallCard,
    ScryfallError,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

pub struct ScryfallCatalog {
    client: Client,
    base_url: String,
}

impl ScryfallCatalog {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ImportError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.catalog_url.trim_end_matches('/').to_string(),
        })
    }

    fn card_url(&self, id: &FallbackId) -> String {
        match id {
            FallbackId::CatalogId(id) => {
                format!("{}/cards/{}", self.base_url, urlencoding::encode(id))
            }
            FallbackId::ExternalId(id) => format!("{}/cards/tcgplayer/{}", self.base_url, id),
        }
    }
}

/// Sort a response into found / not found / failed
async fn classify<T: DeserializeOwned>(
    sent: reqwest::Result<reqwest::Response>,
) -> LookupOutcome<T> {
    let response = match sent {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return LookupOutcome::TimedOut,
        Err(e) => return LookupOutcome::Failed(CatalogError::Network(e)),
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) if e.is_timeout() => return LookupOutcome::TimedOut,
        Err(e) => return LookupOutcome::Failed(CatalogError::Network(e)),
    };

    if status.is_success() {
        return match serde_json::from_str::<T>(&body) {
            Ok(value) => LookupOutcome::Found(value),
            Err(e) => LookupOutcome::Failed(CatalogError::Parse(e)),
        };
    }

    if status == StatusCode::NOT_FOUND {
        let details = serde_json::from_str::<ScryfallError>(&body)
            .map(|error| format!("{}: {}", error.code, error.details))
            .unwrap_or(body);
        return LookupOutcome::NotFound(details);
    }

    match serde_json::from_str::<ScryfallError>(&body) {
        Ok(error) => LookupOutcome::Failed(CatalogError::ApiResponse {
            code: error.code,
            details: error.details,
        }),
        Err(_) => LookupOutcome::Failed(CatalogError::HttpStatus { status, body }),
    }
}

#[async_trait]
impl CatalogClient for ScryfallCatalog {
    async fn fetch_collection(
        &self,
        identifiers: &[CardIdentifier],
    ) -> LookupOutcome<CollectionResponse> {
        let url = format!("{}/cards/collection", self.base_url);
        log::debug!("POST {} with {} identifiers", url, identifiers.len());

        let sent = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&CollectionRequest { identifiers })
            .send()
            .await;
        classify(sent).await
    }

    async fn fetch_card(&self, id: &FallbackId) -> LookupOutcome<ScryfallCard> {
        let url = self.card_url(id);
        log::debug!("Fetching card from Scryfall: {}", url);

        let sent = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await;
        classify(sent).await
    }
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
