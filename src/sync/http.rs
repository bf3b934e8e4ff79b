//! HTTP backend for the remote recipe-list service.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::SyncError;
use crate::models::RemoteDocument;

use super::backend::RemoteBackend;

/// Talks to the recipe-list service over JSON REST.
///
/// Documents live at `GET`/`PUT /v1/owners/{owner}/recipe-lists`; a 404 on
/// read means the owner has no document yet.
pub struct HttpRemoteBackend {
    client: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl HttpRemoteBackend {
    /// Creates a new backend with explicit parameters.
    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url,
            api_key,
        }
    }

    /// Builds the document URL for an owner.
    fn document_url(&self, owner_id: &str) -> String {
        let base = if self.server_url.starts_with("http://")
            || self.server_url.starts_with("https://")
        {
            self.server_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.server_url.trim_end_matches('/'))
        };

        format!("{}/v1/owners/{}/recipe-lists", base, owner_id)
    }

    fn status_error(status: StatusCode) -> SyncError {
        if status.is_server_error() {
            SyncError::RemoteUnreachable(format!("server returned status {}", status))
        } else {
            SyncError::RemoteRejected(format!("server returned status {}", status))
        }
    }
}

#[async_trait]
impl RemoteBackend for HttpRemoteBackend {
    async fn fetch(&self, owner_id: &str) -> Result<Option<RemoteDocument>, SyncError> {
        let response = self
            .client
            .get(self.document_url(owner_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnreachable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let doc = response.json::<RemoteDocument>().await.map_err(|e| {
                    SyncError::RemoteRejected(format!("malformed document body: {}", e))
                })?;
                Ok(Some(doc))
            }
            status => Err(Self::status_error(status)),
        }
    }

    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError> {
        let response = self
            .client
            .put(self.document_url(&doc.user_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(doc)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status))
        }
    }
}
