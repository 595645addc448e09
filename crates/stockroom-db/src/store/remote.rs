//! # Remote Store
//!
//! HTTP client for the remote JSON document API. One document per entity.
//!
//! ## Endpoints
//! ```text
//! GET    /collections/{c}/documents          → { "documents": [...] }
//! GET    /collections/{c}/documents/{id}     → document | 404
//! POST   /collections/{c}/documents          → document (server stamps createdAt)
//! PUT    /collections/{c}/documents/{id}     → document (server stamps updatedAt) | 404
//! DELETE /collections/{c}/documents/{id}     → 204 | 404
//! POST   /collections/{c}/query              → { "documents": [...] }
//! POST   /batch                              → 204 (all writes or none) | 404
//! ```
//!
//! No retries. A failed request surfaces once as [`DbError::Transport`] or
//! [`DbError::Remote`] and the caller decides what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Collection, DocumentStore, Query, Record, WriteBatch};
use crate::error::{DbError, DbResult};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the document API, e.g. `https://docs.example.com/v1/`.
    pub base_url: String,

    /// Per-request timeout.
    /// Default: 10 seconds
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        RemoteConfig {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Body of list and query responses.
#[derive(Debug, Deserialize)]
struct Documents {
    documents: Vec<Record>,
}

// =============================================================================
// Remote Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base: Url,
}

impl RemoteStore {
    /// Builds the HTTP client. Does not contact the server.
    ///
    /// ## Returns
    /// * `Err(DbError::ConnectionFailed)` - the base URL is not a usable
    ///   http(s) URL
    pub fn new(config: &RemoteConfig) -> DbResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| DbError::ConnectionFailed(format!("invalid remote URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DbError::ConnectionFailed(format!(
                "invalid remote URL: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(base_url = %base, "Remote document store configured");
        Ok(RemoteStore { client, base })
    }

    /// Base URL with `segments` appended.
    fn url(&self, segments: &[&str]) -> DbResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DbError::Internal("remote URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn documents_url(&self, collection: Collection) -> DbResult<Url> {
        self.url(&["collections", collection.name(), "documents"])
    }

    fn document_url(&self, collection: Collection, id: &str) -> DbResult<Url> {
        self.url(&["collections", collection.name(), "documents", id])
    }
}

/// Passes 2xx responses through and turns everything else into `Remote`.
async fn check(response: Response) -> DbResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(DbError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for RemoteStore {
    fn backend(&self) -> &'static str {
        "remote"
    }

    async fn list(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let response = self.client.get(self.documents_url(collection)?).send().await?;
        let body: Documents = check(response).await?.json().await?;
        debug!(collection = collection.name(), count = body.documents.len(), "Fetched documents");
        Ok(body.documents)
    }

    async fn get(&self, collection: Collection, id: &str) -> DbResult<Option<Record>> {
        let response = self.client.get(self.document_url(collection, id)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn insert(&self, collection: Collection, record: Record) -> DbResult<Record> {
        let response = self
            .client
            .post(self.documents_url(collection)?)
            .json(&record)
            .send()
            .await?;
        let stored: Record = check(response).await?.json().await?;
        debug!(collection = collection.name(), "Created document");
        Ok(stored)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        record: Record,
    ) -> DbResult<Option<Record>> {
        let response = self
            .client
            .put(self.document_url(collection, id)?)
            .json(&record)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let stored: Record = check(response).await?.json().await?;
        debug!(collection = collection.name(), id = %id, "Updated document");
        Ok(Some(stored))
    }

    async fn delete(&self, collection: Collection, id: &str) -> DbResult<bool> {
        let response = self.client.delete(self.document_url(collection, id)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        debug!(collection = collection.name(), id = %id, "Deleted document");
        Ok(true)
    }

    async fn query(&self, collection: Collection, query: &Query) -> DbResult<Vec<Record>> {
        let url = self.url(&["collections", collection.name(), "query"])?;
        let response = self.client.post(url).json(query).send().await?;
        let body: Documents = check(response).await?.json().await?;
        Ok(body.documents)
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let response = self.client.post(self.url(&["batch"])?).json(&batch).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            let message = response.text().await.unwrap_or_default();
            return Err(DbError::not_found("Document", message));
        }
        check(response).await?;
        debug!(writes = batch.len(), "Committed write batch");
        Ok(())
    }

    async fn close(&self) {
        debug!("Remote store has no connections to release");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            RemoteStore::new(&RemoteConfig::new("not a url")),
            Err(DbError::ConnectionFailed(_))
        ));
        assert!(RemoteStore::new(&RemoteConfig::new("mailto:someone@example.com")).is_err());
    }

    #[test]
    fn test_url_building_with_and_without_trailing_slash() {
        for base in ["http://localhost:9000/api", "http://localhost:9000/api/"] {
            let store = RemoteStore::new(&RemoteConfig::new(base)).unwrap();
            let url = store.document_url(Collection::Sales, "s-1").unwrap();
            assert_eq!(
                url.as_str(),
                "http://localhost:9000/api/collections/sales/documents/s-1"
            );
        }
    }
}
