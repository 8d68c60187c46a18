//! # HTTP Adapter for the Certification Provider
//!
//! Production implementation of [`PacAdapter`] against the provider's REST
//! API. Wraps a `reqwest::Client` with bearer authentication and maps the
//! provider's response shapes onto the domain verdict types.
//!
//! ## Protocol
//!
//! - `POST {base}/stamps` with the canonical payload. `2xx` carries a
//!   certification record, `422` carries a rejection body with the
//!   authority code. Anything else is a protocol failure.
//! - `POST {base}/stamps/{uuid}/cancel`. `2xx` carries the cancellation
//!   acknowledgment, `409` a refusal body.
//!
//! ## Timeout & Retry
//!
//! Requests use the configured per-request timeout. Connection failures
//! and timeouts retry on the configured [`RetryPolicy`] schedule; any
//! response at all is the provider's answer and is never retried here,
//! the caller owns resubmission policy.

use serde::Deserialize;
use uuid::Uuid;

use porteo_core::Timestamp;

use crate::adapter::{
    CancelOutcome, CancelRequest, CertificationRecord, PacAdapter, PacError, Rejection,
    StampOutcome, StampRequest,
};
use crate::config::{PacConfig, PacEnvironment};
use crate::retry::{transport_is_transient, RetryPolicy};

/// HTTP client for the certification provider.
#[derive(Debug)]
pub struct HttpPacAdapter {
    client: reqwest::Client,
    base_url: String,
    environment: PacEnvironment,
    retry: RetryPolicy,
}

impl HttpPacAdapter {
    /// Build an adapter from configuration.
    pub fn new(config: PacConfig) -> Result<Self, PacError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_token))
                .map_err(|_| PacError::Config(crate::config::ConfigError::InvalidToken))?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| PacError::Http {
                endpoint: "client".to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            environment: config.environment,
            retry: config.retry,
        })
    }
}

// Provider response bodies. The provider reports verdicts in the body with
// the HTTP status as the coarse discriminator.

#[derive(Deserialize)]
struct StampedBody {
    uuid: Uuid,
    seal: String,
    cadena_original: String,
    qr_payload: String,
    stamped_at: Timestamp,
}

#[derive(Deserialize)]
struct RejectionBody {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct CancelledBody {
    cancelled_at: Timestamp,
}

async fn read_body(resp: reqwest::Response) -> String {
    resp.text().await.unwrap_or_default()
}

#[async_trait::async_trait]
impl PacAdapter for HttpPacAdapter {
    async fn stamp(&self, request: &StampRequest) -> Result<StampOutcome, PacError> {
        let url = format!("{}/stamps", self.base_url);
        let body = serde_json::json!({
            "document_id": request.document,
            "content_digest": request.content_digest.to_hex(),
            "environment": self.environment,
            "payload": request.canonical_payload,
        });

        let resp = self
            .retry
            .run(transport_is_transient, || {
                self.client.post(&url).json(&body).send()
            })
            .await
            .map_err(|e| PacError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if status.is_success() {
            let stamped: StampedBody =
                resp.json().await.map_err(|e| PacError::Deserialization {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                })?;
            tracing::info!(
                document = %request.document,
                uuid_fiscal = %stamped.uuid,
                environment = %self.environment,
                "document stamped"
            );
            return Ok(StampOutcome::Stamped(CertificationRecord {
                uuid_fiscal: stamped.uuid,
                seal: stamped.seal,
                cadena_original: stamped.cadena_original,
                qr_payload: stamped.qr_payload,
                environment: self.environment,
                stamped_at: stamped.stamped_at,
            }));
        }

        if status.as_u16() == 422 {
            let rejection: RejectionBody =
                resp.json().await.map_err(|e| PacError::Deserialization {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                })?;
            tracing::warn!(
                document = %request.document,
                code = %rejection.code,
                "provider rejected stamping request"
            );
            return Ok(StampOutcome::Rejected(Rejection::new(
                rejection.code,
                rejection.description,
            )));
        }

        Err(PacError::UnexpectedStatus {
            endpoint: url,
            status: status.as_u16(),
            body: read_body(resp).await,
        })
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<CancelOutcome, PacError> {
        let url = format!("{}/stamps/{}/cancel", self.base_url, request.uuid_fiscal);
        let body = serde_json::json!({
            "reason_code": request.reason_code,
            "replacement": request.replacement,
        });

        let resp = self
            .retry
            .run(transport_is_transient, || {
                self.client.post(&url).json(&body).send()
            })
            .await
            .map_err(|e| PacError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if status.is_success() {
            let cancelled: CancelledBody =
                resp.json().await.map_err(|e| PacError::Deserialization {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                })?;
            tracing::info!(uuid_fiscal = %request.uuid_fiscal, "stamp cancelled");
            return Ok(CancelOutcome::Accepted {
                cancelled_at: cancelled.cancelled_at,
            });
        }

        if status.as_u16() == 409 {
            let refusal: RejectionBody =
                resp.json().await.map_err(|e| PacError::Deserialization {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                })?;
            return Ok(CancelOutcome::Refused {
                code: refusal.code,
                description: refusal.description,
            });
        }

        Err(PacError::UnexpectedStatus {
            endpoint: url,
            status: status.as_u16(),
            body: read_body(resp).await,
        })
    }
}
