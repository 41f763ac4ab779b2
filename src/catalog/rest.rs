//! CAST AI Node Templates REST Client
//!
//! Native REST implementation of [`TemplateCatalog`] against the CAST AI
//! cluster API. Uses reqwest (rustls) and authenticates every call with the
//! `X-API-Key` header.
//!
//! - `GET  {base}/{clusterId}/node-templates?includeDefault=true`
//! - `PUT  {base}/{clusterId}/node-templates/{templateName}`

use crate::catalog::types::{NodeTemplate, NodeTemplateList};
use crate::catalog::TemplateCatalog;
use crate::config::ApiKey;
use crate::constants::API_KEY_HEADER;
use crate::error::{FetchError, UpdateError};
use crate::observability::metrics;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

/// CAST AI node template client
pub struct CastAiCatalog {
    http_client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl std::fmt::Debug for CastAiCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastAiCatalog")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CastAiCatalog {
    /// Create a client for the cluster API rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, api_key: ApiKey, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn templates_url(&self, cluster_id: &str) -> String {
        format!("{}/{}/node-templates", self.base_url, cluster_id)
    }

    fn make_request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("accept", "application/json")
    }
}

fn record(operation: &str, outcome: &str, start: Instant) {
    metrics::record_api_operation(operation, outcome, start.elapsed().as_secs_f64());
}

#[async_trait]
impl TemplateCatalog for CastAiCatalog {
    async fn list_templates(&self, cluster_id: &str) -> Result<Vec<NodeTemplate>, FetchError> {
        let span = info_span!("castai.node_templates.list", cluster.id = cluster_id);
        let url = self.templates_url(cluster_id);

        async move {
            let start = Instant::now();
            info!("Fetching node templates for cluster ID: {}", cluster_id);

            let response = self
                .make_request(Method::GET, &url)
                .query(&[("includeDefault", "true")])
                .send()
                .await
                .map_err(|source| {
                    record("list", "error", start);
                    FetchError::Request {
                        cluster_id: cluster_id.to_string(),
                        source,
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                record("list", "error", start);
                return Err(FetchError::Status {
                    cluster_id: cluster_id.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let list: NodeTemplateList = response.json().await.map_err(|e| {
                record("list", "error", start);
                FetchError::Decode {
                    cluster_id: cluster_id.to_string(),
                    message: e.to_string(),
                }
            })?;

            let templates = list.into_templates();
            record("list", "success", start);
            info!(
                "Successfully retrieved {} node templates for cluster ID {}",
                templates.len(),
                cluster_id
            );
            Ok(templates)
        }
        .instrument(span)
        .await
    }

    async fn update_template(
        &self,
        cluster_id: &str,
        template_name: &str,
        template: &NodeTemplate,
    ) -> Result<NodeTemplate, UpdateError> {
        let span = info_span!(
            "castai.node_templates.update",
            cluster.id = cluster_id,
            template.name = template_name
        );
        let url = format!("{}/{}", self.templates_url(cluster_id), template_name);

        async move {
            let start = Instant::now();
            debug!("PUT {}", url);

            let response = self
                .make_request(Method::PUT, &url)
                .json(template)
                .send()
                .await
                .map_err(|source| {
                    record("update", "error", start);
                    UpdateError::Request {
                        template: template_name.to_string(),
                        source,
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                record("update", "error", start);
                return Err(UpdateError::Status {
                    template: template_name.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let updated: NodeTemplate = response.json().await.map_err(|e| {
                record("update", "error", start);
                UpdateError::Decode {
                    template: template_name.to_string(),
                    message: e.to_string(),
                }
            })?;

            record("update", "success", start);
            info!(
                "Successfully updated node template '{}' for cluster '{}'",
                template_name, cluster_id
            );
            Ok(updated)
        }
        .instrument(span)
        .await
    }
}
