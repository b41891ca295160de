//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cert::CertificateValidation,
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::OpenSearchConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::bulk::{build_bulk_body, parse_bulk_response};
use crate::opensearch::index_config::get_index_settings;
use crate::types::BulkResult;
use news_indexer_shared::IndexDocument;

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// use news_indexer_repository::{OpenSearchClient, OpenSearchConfig};
///
/// let config = OpenSearchConfig::new("http://localhost:9200", "news");
/// let client = OpenSearchClient::new(&config)?;
/// client.ensure_index().await?;
/// let result = client.bulk_upsert(&documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_name: String,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for the configured cluster and index.
    ///
    /// No request is sent; an unreachable cluster surfaces on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError::ValidationError)` - If the URL is invalid
    /// * `Err(SearchIndexError::ConnectionError)` - If the transport cannot be built
    pub fn new(config: &OpenSearchConfig) -> Result<Self, SearchIndexError> {
        let parsed_url = Url::parse(&config.url).map_err(|e| {
            SearchIndexError::validation(format!("Invalid OpenSearch URL {}: {}", config.url, e))
        })?;

        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(SearchIndexError::validation(format!(
                "Unsupported OpenSearch URL scheme: {}",
                parsed_url.scheme()
            )));
        }

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.timeout);

        if let Some(credentials) = &config.credentials {
            builder = builder.auth(Credentials::Basic(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }

        if !config.verify_certs {
            warn!("TLS certificate validation is disabled for OpenSearch");
            builder = builder.cert_validation(CertificateValidation::None);
        }

        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            index = %config.index_name,
            authenticated = config.credentials.is_some(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            index_name: config.index_name.clone(),
        })
    }

    /// The destination index name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Map a transport-level failure to a transient error.
    fn send_error(e: opensearch::Error) -> SearchIndexError {
        if e.is_timeout() {
            SearchIndexError::timeout(e.to_string())
        } else {
            SearchIndexError::connection(e.to_string())
        }
    }

    /// Whether a failed create call only lost a race against another creator.
    fn is_already_exists(status: u16, body: &str) -> bool {
        status == 400 && body.contains("resource_already_exists_exception")
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    /// Create the index with the article mappings unless it already exists.
    #[instrument(skip(self), fields(index = %self.index_name))]
    async fn ensure_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_name.as_str()]))
            .send()
            .await
            .map_err(Self::send_error)?;

        match response.status_code().as_u16() {
            200 => {
                debug!("Index already exists");
                return Ok(());
            }
            404 => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(SearchIndexError::from_status(
                    status,
                    body,
                    SearchIndexError::IndexCreationError,
                ));
            }
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(Self::send_error)?;

        let status = response.status_code();
        if status.is_success() {
            info!("Created search index");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if Self::is_already_exists(status.as_u16(), &body) {
            debug!("Index was created concurrently");
            return Ok(());
        }

        error!(status = %status, body = %body, "Index creation failed");
        Err(SearchIndexError::from_status(
            status.as_u16(),
            body,
            SearchIndexError::IndexCreationError,
        ))
    }

    /// Upsert documents through the `_bulk` API using their ids as `_id`.
    ///
    /// A non-success HTTP status fails the whole batch; item-level errors are
    /// reported in the returned summary.
    #[instrument(skip(self, documents), fields(index = %self.index_name, count = documents.len()))]
    async fn bulk_upsert(&self, documents: &[IndexDocument]) -> Result<BulkResult, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BulkResult::empty());
        }

        let body = build_bulk_body(&self.index_name, documents);

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_name))
            .body(body)
            .send()
            .await
            .map_err(Self::send_error)?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::from_status(
                status.as_u16(),
                error_body,
                SearchIndexError::BulkOperationError,
            ));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let result = parse_bulk_response(documents, &response_body)?;

        debug!(
            succeeded = result.succeeded,
            failed = result.failed,
            "Bulk upsert completed"
        );
        Ok(result)
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(Self::send_error)?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::from_status(
                status.as_u16(),
                body,
                SearchIndexError::ConnectionError,
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let cluster_status = body.get("status").and_then(Value::as_str).unwrap_or("red");
        debug!(cluster_status = %cluster_status, "Cluster health");

        Ok(cluster_status != "red")
    }
}
