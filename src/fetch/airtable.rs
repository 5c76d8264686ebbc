// Schedule table client
// Issues the single bearer-authenticated GET and classifies the outcome

use crate::config::ScheduleConfig;
use crate::error::{AppError, AppResult, FetchError};
use crate::fetch::{wire, ActivitySource};
use crate::http_config::HttpConfig;
use crate::models::ActivityRecord;
use crate::utils::logging;
use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::time::Instant;
use url::Url;

pub struct ActivityFetcher {
    client: Client,
    endpoint: Url,
    api_token: String,
}

impl ActivityFetcher {
    pub fn new(config: &ScheduleConfig) -> AppResult<Self> {
        let client = HttpConfig::schedule_api(config.timeout)
            .build_client()
            .map_err(|e| AppError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.endpoint.clone(), config.api_token.clone()))
    }

    pub fn with_client(client: Client, endpoint: Url, api_token: String) -> Self {
        Self {
            client,
            endpoint,
            api_token,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ActivitySource for ActivityFetcher {
    async fn fetch(&self) -> Result<Vec<ActivityRecord>, FetchError> {
        let started = Instant::now();
        debug!("[Fetch] GET {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::from(e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            debug!("[Fetch] HTTP {} body: {}", status, text);
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        // A body cut short by the timeout is a transport failure, not bad JSON
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(format!("failed to read response body: {}", e.without_url())))?;

        let records = wire::decode_envelope(&body)?;
        logging::log_fetch_completed(records.len(), started.elapsed().as_millis() as u64);
        Ok(records)
    }
}
