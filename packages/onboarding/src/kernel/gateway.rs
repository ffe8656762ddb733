// Onboarding API client: duplicate registry-number check and client create/update

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::traits::{
    BaseClientGateway, BaseDuplicateCheck, GatewayError, PersistedClient, RemoteFieldError,
};
use crate::domains::onboarding::SubmissionPayload;

#[derive(Debug, Serialize)]
struct RegistryCheckRequest<'a> {
    registry_numbers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RegistryCheckResponse {
    #[serde(default)]
    existing: Vec<String>,
}

/// Body of a 400/409/422 response.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<RemoteFieldError>,
}

pub struct HttpClientGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClientGateway {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build onboarding API client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_payload(&self, request: RequestBuilder) -> Result<PersistedClient, GatewayError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            error!(error = %e, "Onboarding API request failed");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<PersistedClient>()
                .await
                .map_err(|e| GatewayError::Transport(format!("Invalid response body: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let rejection: RejectionBody =
                    serde_json::from_str(&body).unwrap_or_else(|_| RejectionBody {
                        message: body.clone(),
                        errors: Vec::new(),
                    });
                warn!(
                    status = status.as_u16(),
                    field_errors = rejection.errors.len(),
                    "Onboarding API rejected submission"
                );
                Err(GatewayError::Rejected {
                    message: rejection.message,
                    field_errors: rejection.errors,
                })
            }
            _ => {
                error!(status = status.as_u16(), body = %body, "Onboarding API error");
                Err(GatewayError::Transport(format!("HTTP {}: {}", status.as_u16(), body)))
            }
        }
    }
}

#[async_trait]
impl BaseDuplicateCheck for HttpClientGateway {
    #[instrument(skip(self))]
    async fn check_existing(&self, registry_numbers: &[String]) -> Result<Vec<String>> {
        if registry_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/clients/registry-check", self.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(&RegistryCheckRequest { registry_numbers })
            .send()
            .await
            .context("Registry check request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Registry check failed ({}): {}", status.as_u16(), body));
        }

        let body: RegistryCheckResponse = response
            .json()
            .await
            .context("Failed to parse registry check response")?;
        debug!(existing = body.existing.len(), "Registry check complete");
        Ok(body.existing)
    }
}

#[async_trait]
impl BaseClientGateway for HttpClientGateway {
    async fn create(&self, payload: &SubmissionPayload) -> Result<PersistedClient, GatewayError> {
        let url = format!("{}/clients", self.base_url);
        self.send_payload(self.client.post(&url).json(payload)).await
    }

    async fn update(
        &self,
        client_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<PersistedClient, GatewayError> {
        let url = format!("{}/clients/{}", self.base_url, client_id);
        self.send_payload(self.client.put(&url).json(payload)).await
    }
}
