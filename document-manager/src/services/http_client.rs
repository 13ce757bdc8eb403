//! reqwest implementation of the file service boundary.
//!
//! Routes, relative to the configured base URL:
//!
//! | Operation | Route |
//! |-----------|-------|
//! | list | `GET /files/{entity_type}/{entity_id}?limit&offset&sort` |
//! | upload | `POST /files/{entity_type}/{entity_id}` (multipart `file`) |
//! | replace | `PUT /files/{entity_type}/{entity_id}/{uuid}` (multipart `file`) |
//! | edit metadata | `PATCH /files/{entity_type}/{entity_id}/{uuid}/metadata` |
//! | delete | `DELETE /files/{entity_type}/{entity_id}/{uuid}` |

use crate::config::ManagerConfig;
use crate::models::{DocumentPage, DocumentRecord, EntityRef, FilePayload, ListQuery, MetadataPatch};
use crate::services::transport::{DocumentTransport, TokenProvider, UploadEvent, UploadStream};
use async_trait::async_trait;
use bytes::Bytes;
use client_core::error::TransportError;
use client_core::observability::{new_request_id, RequestIdExt};
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Response header carrying the total number of records across all pages.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

type EventSender = mpsc::Sender<Result<UploadEvent, TransportError>>;

#[derive(Clone)]
pub struct HttpDocumentClient {
    client: Client,
    base_url: String,
    chunk_size: usize,
}

impl HttpDocumentClient {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        chunk_size: usize,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self, TransportError> {
        Self::new(
            config.base_url.clone(),
            config.request_timeout(),
            config.upload_chunk_size,
        )
    }

    fn collection_url(&self, entity: &EntityRef) -> String {
        format!("{}/files/{}/{}", self.base_url, entity.entity_type, entity.id)
    }

    fn file_url(&self, entity: &EntityRef, file_uuid: &str) -> String {
        format!("{}/{}", self.collection_url(entity), file_uuid)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<Response, TransportError> {
        let request_id = new_request_id();

        let response = request
            .with_request_id(&request_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, request_id = %request_id, error = %e, "Request to file service failed");
                TransportError::from(e)
            })?;

        ensure_success(response).await.map_err(|e| {
            tracing::warn!(operation, request_id = %request_id, error = %e, "File service rejected request");
            e
        })
    }
}

#[async_trait]
impl DocumentTransport for HttpDocumentClient {
    async fn list(
        &self,
        entity: &EntityRef,
        query: &ListQuery,
    ) -> Result<DocumentPage, TransportError> {
        let request = self.client.get(self.collection_url(entity)).query(query);
        let response = self.execute(request, "list").await?;

        let total_count = total_count(response.headers());
        let body = response.bytes().await?;
        let items: Vec<DocumentRecord> = serde_json::from_slice(&body)?;

        tracing::debug!(
            entity_id = %entity.id,
            entity_type = %entity.entity_type,
            count = items.len(),
            total_count,
            "Listed documents"
        );

        Ok(DocumentPage { items, total_count })
    }

    fn upload(&self, entity: &EntityRef, file: FilePayload) -> UploadStream {
        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let url = self.collection_url(entity);
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let watcher = tx.clone();
            tokio::select! {
                _ = watcher.closed() => {
                    tracing::debug!(url = %url, "Upload stream dropped, transfer aborted");
                }
                _ = run_upload(client, url.clone(), file, chunk_size, tx) => {}
            }
        });

        ReceiverStream::new(rx).boxed()
    }

    async fn delete(&self, entity: &EntityRef, file_uuid: &str) -> Result<(), TransportError> {
        let request = self.client.delete(self.file_url(entity, file_uuid));
        self.execute(request, "delete").await?;
        Ok(())
    }

    async fn replace(
        &self,
        entity: &EntityRef,
        file_uuid: &str,
        file: FilePayload,
    ) -> Result<(), TransportError> {
        let form = multipart_form(file, self.chunk_size, None)?;
        let request = self.client.put(self.file_url(entity, file_uuid)).multipart(form);
        self.execute(request, "replace").await?;
        Ok(())
    }

    async fn edit_metadata(
        &self,
        entity: &EntityRef,
        file_uuid: &str,
        patch: &MetadataPatch,
    ) -> Result<(), TransportError> {
        let url = format!("{}/metadata", self.file_url(entity, file_uuid));
        let request = self.client.patch(url).json(patch);
        self.execute(request, "edit_metadata").await?;
        Ok(())
    }
}

async fn run_upload(
    client: Client,
    url: String,
    file: FilePayload,
    chunk_size: usize,
    events: EventSender,
) {
    let request_id = new_request_id();

    let form = match multipart_form(file, chunk_size, Some(events.clone())) {
        Ok(form) => form,
        Err(e) => {
            let _ = events.send(Err(e)).await;
            return;
        }
    };

    let response = match client
        .post(&url)
        .multipart(form)
        .with_request_id(&request_id)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upload request failed");
            let _ = events.send(Err(e.into())).await;
            return;
        }
    };

    let status = response.status().as_u16();
    if events
        .send(Ok(UploadEvent::ResponseHeader { status }))
        .await
        .is_err()
    {
        return;
    }

    let outcome = match ensure_success(response).await {
        Ok(response) => response
            .bytes()
            .await
            .map(|_| UploadEvent::Response { status })
            .map_err(TransportError::from),
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        tracing::warn!(request_id = %request_id, error = %e, "Upload rejected");
    }
    let _ = events.send(outcome).await;
}

fn multipart_form(
    file: FilePayload,
    chunk_size: usize,
    progress: Option<EventSender>,
) -> Result<Form, TransportError> {
    let total = file.size();
    let body = reqwest::Body::wrap_stream(progress_stream(file.bytes, chunk_size, progress));
    let part = Part::stream_with_length(body, total)
        .file_name(file.name)
        .mime_str(&file.content_type)?;

    Ok(Form::new().part("file", part))
}

/// Split the payload into chunks, reporting each one as it is pulled by the
/// connection.
fn progress_stream(
    bytes: Bytes,
    chunk_size: usize,
    progress: Option<EventSender>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(chunk_size)
        .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
        .collect();

    let mut loaded = 0u64;
    futures::stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        if let Some(events) = &progress {
            // Lossy: a full channel drops the tick instead of stalling the body.
            let _ = events.try_send(Ok(UploadEvent::Progress {
                loaded,
                total: Some(total),
            }));
        }
        Ok(chunk)
    })
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(TransportError::from_status(status, message))
}

fn total_count(headers: &HeaderMap) -> u64 {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Fetches the download API key from a JSON endpoint returning `{"token": "..."}`.
#[derive(Clone)]
pub struct HttpTokenProvider {
    client: Client,
    url: String,
}

impl HttpTokenProvider {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self, TransportError> {
        Self::new(config.token_url.clone(), config.request_timeout())
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn get_token(&self) -> Result<String, TransportError> {
        let request_id = new_request_id();
        let response = self
            .client
            .get(&self.url)
            .with_request_id(&request_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(request_id = %request_id, error = %e, "Token request failed");
                TransportError::from(e)
            })?;

        let body: TokenResponse = ensure_success(response).await?.json().await?;
        Ok(body.token)
    }
}
