//! Document store over the `quotenest-server` REST API.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

use super::wire::{ListResponse, SetDocumentRequest, UpdateFieldRequest};
use super::{build_client, read_error, trim_base_url};
use crate::store::{
    DocumentPath, DocumentStore, FieldMutation, Fields, Snapshot, StoreError, StoredDocument,
};

/// [`DocumentStore`] that forwards every call to the server.
///
/// Requests carry the principal's bearer token; the server only allows
/// paths under `users/{uid}` of that principal.
pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            token: None,
            client: build_client(timeout),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds `{base}/{root}/{path}` with each segment percent-encoded.
    pub fn url(&self, root: &str, path: &DocumentPath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}/{}", self.base_url, root, encoded.join("/"))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        path: &DocumentPath,
    ) -> Result<Response, StoreError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = read_error(response).await;
        tracing::debug!(%path, %status, error = %body.error, "store request failed");
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::PermissionDenied(path.to_string())
            }
            StatusCode::BAD_REQUEST => StoreError::InvalidPath(body.message),
            _ => StoreError::Unavailable(format!("{} ({})", body.message, status)),
        })
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Snapshot, StoreError> {
        let response = self
            .send(self.client.get(self.url("documents", path)), path)
            .await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let request = self
            .client
            .put(self.url("documents", path))
            .json(&SetDocumentRequest { fields });
        self.send(request, path).await?;
        Ok(())
    }

    async fn update_field(
        &self,
        path: &DocumentPath,
        field: &str,
        mutation: FieldMutation,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.url("documents", path))
            .json(&UpdateFieldRequest {
                field: field.to_string(),
                mutation,
            });
        self.send(request, path).await?;
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.send(self.client.delete(self.url("documents", path)), path)
            .await?;
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &DocumentPath,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let response = self
            .send(
                self.client.get(self.url("collections", collection)),
                collection,
            )
            .await?;
        let listing: ListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(listing.documents)
    }
}
