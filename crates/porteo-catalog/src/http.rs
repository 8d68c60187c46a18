//! # HTTP Catalog — Remote Lookup Backend
//!
//! Queries a catalog distribution service over HTTP. Each lookup carries two
//! time bounds: the reqwest client timeout and an outer
//! `tokio::time::timeout`, so a stalled connection surfaces as
//! [`CatalogError::Timeout`] instead of hanging the validation stage that
//! issued it.
//!
//! Paths:
//! - `GET {base}/catalogs/{kind}/codes/{code}` — 204 if the code exists,
//!   404 if not.
//! - `GET {base}/catalogs/{kind}/codes?prefix=P&limit=N` — JSON array of
//!   `{code, description}` rows.

use std::time::Duration;

use url::Url;

use crate::store::{CatalogEntry, CatalogError, CatalogKind, CatalogStore};

/// Configuration for the HTTP catalog backend.
#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    /// Base URL of the catalog service.
    pub base_url: Url,
    /// Per-lookup time budget in milliseconds (default 2000).
    ///
    /// Deliberately short: validation runs several catalog lookups per draft
    /// and the engine degrades a timeout to a warning rather than waiting.
    pub timeout_ms: u64,
}

impl HttpCatalogConfig {
    /// Configuration with the default lookup budget.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_ms: 2_000,
        }
    }
}

/// Catalog backend querying a remote distribution service.
pub struct HttpCatalog {
    client: reqwest::Client,
    config: HttpCatalogConfig,
}

impl HttpCatalog {
    /// Build the backend. Fails only if the HTTP client cannot be constructed.
    pub fn new(config: HttpCatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CatalogError::Unavailable {
                kind: CatalogKind::PostalCodes,
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn code_url(&self, kind: CatalogKind, code: &str) -> Result<Url, CatalogError> {
        self.config
            .base_url
            .join(&format!("catalogs/{}/codes/{}", kind.as_str(), code))
            .map_err(|e| CatalogError::Unavailable {
                kind,
                reason: format!("invalid catalog URL: {e}"),
            })
    }

    async fn bounded<T>(
        &self,
        kind: CatalogKind,
        fut: impl std::future::Future<Output = Result<T, CatalogError>>,
    ) -> Result<T, CatalogError> {
        let budget = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(budget, fut).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout {
                kind,
                elapsed_ms: self.config.timeout_ms,
            }),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for HttpCatalog {
    async fn exists(&self, kind: CatalogKind, code: &str) -> Result<bool, CatalogError> {
        let url = self.code_url(kind, code)?;
        self.bounded(kind, async {
            let resp = self.client.get(url.clone()).send().await.map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout {
                        kind,
                        elapsed_ms: self.config.timeout_ms,
                    }
                } else {
                    CatalogError::Unavailable {
                        kind,
                        reason: format!("GET {url}: {e}"),
                    }
                }
            })?;
            match resp.status() {
                s if s.is_success() => Ok(true),
                reqwest::StatusCode::NOT_FOUND => Ok(false),
                s => Err(CatalogError::Unavailable {
                    kind,
                    reason: format!("GET {url} returned {s}"),
                }),
            }
        })
        .await
    }

    async fn search(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut url =
            self.config
                .base_url
                .join(&format!("catalogs/{}/codes", kind.as_str()))
                .map_err(|e| CatalogError::Unavailable {
                    kind,
                    reason: format!("invalid catalog URL: {e}"),
                })?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("limit", &limit.to_string());

        self.bounded(kind, async {
            let resp = self.client.get(url.clone()).send().await.map_err(|e| {
                CatalogError::Unavailable {
                    kind,
                    reason: format!("GET {url}: {e}"),
                }
            })?;
            if !resp.status().is_success() {
                return Err(CatalogError::Unavailable {
                    kind,
                    reason: format!("GET {url} returned {}", resp.status()),
                });
            }
            resp.json::<Vec<CatalogEntry>>()
                .await
                .map_err(|e| CatalogError::Unavailable {
                    kind,
                    reason: format!("failed to deserialize catalog response: {e}"),
                })
        })
        .await
    }
}
