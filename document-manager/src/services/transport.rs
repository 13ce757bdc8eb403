//! Boundary to the remote file service.

use crate::models::{DocumentPage, EntityRef, FilePayload, ListQuery, MetadataPatch};
use async_trait::async_trait;
use client_core::error::TransportError;
use futures::stream::BoxStream;

/// Event emitted while an upload is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent {
    /// Bytes handed to the connection so far.
    Progress { loaded: u64, total: Option<u64> },
    /// Status line received; the body may still be pending.
    ResponseHeader { status: u16 },
    /// Response fully received.
    Response { status: u16 },
}

impl UploadEvent {
    pub fn is_success_status(status: u16) -> bool {
        (200..300).contains(&status)
    }
}

/// Upload event stream. Dropping it aborts the transfer.
pub type UploadStream = BoxStream<'static, Result<UploadEvent, TransportError>>;

#[async_trait]
pub trait DocumentTransport: Send + Sync {
    async fn list(&self, entity: &EntityRef, query: &ListQuery)
        -> Result<DocumentPage, TransportError>;

    fn upload(&self, entity: &EntityRef, file: FilePayload) -> UploadStream;

    async fn delete(&self, entity: &EntityRef, file_uuid: &str) -> Result<(), TransportError>;

    async fn replace(
        &self,
        entity: &EntityRef,
        file_uuid: &str,
        file: FilePayload,
    ) -> Result<(), TransportError>;

    async fn edit_metadata(
        &self,
        entity: &EntityRef,
        file_uuid: &str,
        patch: &MetadataPatch,
    ) -> Result<(), TransportError>;
}

/// Source of the API key appended to download links.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, TransportError>;
}
