//! Upload, replace, delete and metadata-edit operations.
//!
//! Every kind owns a [`TaskSlot`]: a new call of the same kind supersedes the
//! previous one, which then publishes nothing. Kinds run independently of
//! each other. The current task of a kind always returns its busy flag (and,
//! for uploads, the progress value) to rest in a single update, whichever way
//! it ends.

use crate::error::DocumentError;
use crate::models::{EntityRef, FilePayload, MetadataPatch};
use crate::services::{
    DocumentTransport, ErrorContext, ErrorHandler, Notification, Notifier, UploadEvent,
};
use crate::store::cancel::CancellationChannel;
use crate::store::list_resource::ListResource;
use crate::store::progress::UploadProgressTracker;
use crate::store::slot::{TaskSlot, Ticket};
use crate::store::state::{MutationKind, StateStore};
use client_core::error::TransportError;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const FILE_TOO_BIG: &str = "Your file is too big";
pub const UPLOAD_SUCCEEDED: &str = "File uploaded successfully!";
pub const DELETE_SUCCEEDED: &str = "File deleted successfully!";

/// How an operation ended, as seen by its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(TransportError),
    /// Aborted through [`MutationCoordinator::cancel_upload`].
    Cancelled,
    /// Replaced by a newer call of the same kind before it settled.
    Superseded,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Failed(_) => "failed",
            Outcome::Cancelled => "cancelled",
            Outcome::Superseded => "superseded",
        }
    }
}

/// Handle to a spawned operation.
#[derive(Debug)]
pub struct OperationHandle {
    kind: MutationKind,
    handle: JoinHandle<Outcome>,
}

impl OperationHandle {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Wait for the operation to settle.
    pub async fn outcome(self) -> Outcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Outcome::Superseded,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

struct MutationSlots {
    upload: TaskSlot,
    delete: TaskSlot,
    replace: TaskSlot,
    edit_metadata: TaskSlot,
}

impl MutationSlots {
    fn new() -> Self {
        Self {
            upload: TaskSlot::new("upload"),
            delete: TaskSlot::new("delete"),
            replace: TaskSlot::new("replace"),
            edit_metadata: TaskSlot::new("edit_metadata"),
        }
    }

    fn get(&self, kind: MutationKind) -> &TaskSlot {
        match kind {
            MutationKind::Upload => &self.upload,
            MutationKind::Delete => &self.delete,
            MutationKind::Replace => &self.replace,
            MutationKind::EditMetadata => &self.edit_metadata,
        }
    }
}

/// Terminal state of an upload transfer.
enum Transfer {
    Completed(Result<(), TransportError>),
    Cancelled,
    Superseded,
}

#[derive(Clone)]
pub struct MutationCoordinator {
    store: StateStore,
    transport: Arc<dyn DocumentTransport>,
    notifier: Arc<dyn Notifier>,
    errors: Arc<dyn ErrorHandler>,
    list: ListResource,
    slots: Arc<MutationSlots>,
    cancel: Arc<CancellationChannel>,
    max_file_size: u64,
    read_only: bool,
}

impl MutationCoordinator {
    pub(crate) fn new(
        store: StateStore,
        transport: Arc<dyn DocumentTransport>,
        notifier: Arc<dyn Notifier>,
        errors: Arc<dyn ErrorHandler>,
        list: ListResource,
        max_file_size: u64,
        read_only: bool,
    ) -> Self {
        Self {
            store,
            transport,
            notifier,
            errors,
            list,
            slots: Arc::new(MutationSlots::new()),
            cancel: Arc::new(CancellationChannel::new()),
            max_file_size,
            read_only,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upload a new file to the current entity.
    ///
    /// Oversized files are rejected with an error notification before any
    /// transfer starts and do not disturb an upload already in flight.
    pub fn upload_file(&self, file: FilePayload) -> Result<OperationHandle, DocumentError> {
        self.ensure_writable(MutationKind::Upload)?;

        let size = file.size();
        if size > self.max_file_size {
            tracing::warn!(
                file_name = %file.name,
                size,
                limit = self.max_file_size,
                "Rejecting oversized upload"
            );
            self.notifier.notify(Notification::error(FILE_TOO_BIG));
            return Err(DocumentError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let (ticket, cancel, entity) = self.store.update(|state| {
            let ticket = self.slots.upload.begin();
            let cancel = self.cancel.arm(ticket.generation);
            state.busy.upload = true;
            state.progress_percent = None;
            (ticket, cancel, state.params.entity())
        });

        tracing::info!(
            entity_id = %entity.id,
            file_name = %file.name,
            size,
            generation = ticket.generation,
            "Starting upload"
        );

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let generation = ticket.generation;
            let transfer = this.transfer(ticket, cancel, &entity, file).await;
            this.settle_upload(generation, transfer)
        });

        Ok(OperationHandle {
            kind: MutationKind::Upload,
            handle,
        })
    }

    /// Abort the upload in flight. Returns false when there was none.
    pub fn cancel_upload(&self) -> bool {
        self.cancel.signal()
    }

    pub fn delete_file(&self, file_uuid: impl Into<String>) -> Result<OperationHandle, DocumentError> {
        self.ensure_writable(MutationKind::Delete)?;
        let file_uuid = file_uuid.into();

        let (ticket, entity) = self.begin(MutationKind::Delete);
        tracing::info!(entity_id = %entity.id, file_uuid = %file_uuid, "Deleting file");

        let transport = self.transport.clone();
        let request = async move { transport.delete(&entity, &file_uuid).await };
        Ok(self.spawn_request(MutationKind::Delete, ticket, request))
    }

    /// Replace the content of an existing file.
    pub fn update_file(
        &self,
        file_uuid: impl Into<String>,
        file: FilePayload,
    ) -> Result<OperationHandle, DocumentError> {
        self.ensure_writable(MutationKind::Replace)?;
        let file_uuid = file_uuid.into();

        let (ticket, entity) = self.begin(MutationKind::Replace);
        tracing::info!(
            entity_id = %entity.id,
            file_uuid = %file_uuid,
            file_name = %file.name,
            "Replacing file"
        );

        let transport = self.transport.clone();
        let request = async move { transport.replace(&entity, &file_uuid, file).await };
        Ok(self.spawn_request(MutationKind::Replace, ticket, request))
    }

    pub fn update_metadata(
        &self,
        file_uuid: impl Into<String>,
        patch: MetadataPatch,
    ) -> Result<OperationHandle, DocumentError> {
        self.ensure_writable(MutationKind::EditMetadata)?;
        let file_uuid = file_uuid.into();

        let (ticket, entity) = self.begin(MutationKind::EditMetadata);
        tracing::info!(entity_id = %entity.id, file_uuid = %file_uuid, "Editing file metadata");

        let transport = self.transport.clone();
        let request = async move { transport.edit_metadata(&entity, &file_uuid, &patch).await };
        Ok(self.spawn_request(MutationKind::EditMetadata, ticket, request))
    }

    pub(crate) fn shutdown(&self) {
        for kind in [
            MutationKind::Upload,
            MutationKind::Delete,
            MutationKind::Replace,
            MutationKind::EditMetadata,
        ] {
            self.slots.get(kind).shutdown();
        }
    }

    fn ensure_writable(&self, kind: MutationKind) -> Result<(), DocumentError> {
        if self.read_only {
            tracing::warn!(operation = kind.as_str(), "Mutation rejected, manager is read-only");
            return Err(DocumentError::ReadOnly);
        }
        Ok(())
    }

    fn begin(&self, kind: MutationKind) -> (Ticket, EntityRef) {
        self.store.update(|state| {
            let ticket = self.slots.get(kind).begin();
            state.busy.set(kind, true);
            (ticket, state.params.entity())
        })
    }

    /// Return the kind to rest if `generation` still owns the slot.
    fn settle(&self, kind: MutationKind, generation: u64) -> bool {
        let slot = self.slots.get(kind);
        let settled = self.store.update_if(|state| {
            if !slot.is_current(generation) {
                return false;
            }
            state.busy.set(kind, false);
            if kind == MutationKind::Upload {
                state.progress_percent = None;
                self.cancel.disarm(generation);
            }
            true
        });
        if settled {
            slot.finish(generation);
        }
        settled
    }

    fn record(&self, kind: MutationKind, outcome: Outcome) -> Outcome {
        metrics::counter!(
            "document_manager_mutations_total",
            "kind" => kind.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        outcome
    }

    async fn transfer(
        &self,
        ticket: Ticket,
        cancel: CancellationToken,
        entity: &EntityRef,
        file: FilePayload,
    ) -> Transfer {
        let generation = ticket.generation;
        let mut events = self.transport.upload(entity, file);
        let mut tracker = UploadProgressTracker::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = ticket.token.cancelled() => return Transfer::Superseded,
                _ = cancel.cancelled() => return Transfer::Cancelled,
                next = events.next() => next,
            };

            match next {
                Some(Ok(UploadEvent::Progress { loaded, total })) => {
                    if let Some(percent) = tracker.observe(loaded, total) {
                        self.store.update_if(|state| {
                            if !self.slots.upload.is_current(generation) {
                                return false;
                            }
                            state.progress_percent = Some(percent);
                            true
                        });
                    }
                }
                Some(Ok(UploadEvent::ResponseHeader { status })) => {
                    if !UploadEvent::is_success_status(status) {
                        tracing::warn!(status, generation, "Upload answered with failure status");
                        tracker.halt();
                        self.store.update_if(|state| {
                            if !self.slots.upload.is_current(generation) {
                                return false;
                            }
                            state.progress_percent = None;
                            true
                        });
                    }
                }
                Some(Ok(UploadEvent::Response { status })) => {
                    if UploadEvent::is_success_status(status) {
                        return Transfer::Completed(Ok(()));
                    }
                    let status = http_status(status);
                    return Transfer::Completed(Err(TransportError::from_status(
                        status,
                        "Upload rejected",
                    )));
                }
                Some(Err(e)) => return Transfer::Completed(Err(e)),
                None => return Transfer::Completed(Err(TransportError::Incomplete)),
            }
        }
    }

    fn settle_upload(&self, generation: u64, transfer: Transfer) -> Outcome {
        let kind = MutationKind::Upload;
        if matches!(transfer, Transfer::Superseded) || !self.settle(kind, generation) {
            tracing::debug!(generation, "Upload superseded");
            return self.record(kind, Outcome::Superseded);
        }

        let result = match transfer {
            Transfer::Completed(result) => result,
            Transfer::Cancelled => {
                tracing::info!(generation, "Upload cancelled");
                return self.record(kind, Outcome::Cancelled);
            }
            Transfer::Superseded => return self.record(kind, Outcome::Superseded),
        };

        self.list.reload();
        match result {
            Ok(()) => {
                tracing::info!(generation, "Upload finished");
                self.notifier.notify(Notification::success(UPLOAD_SUCCEEDED));
                self.record(kind, Outcome::Succeeded)
            }
            Err(e) => {
                tracing::error!(generation, error = %e, "Upload failed");
                self.errors.handle(ErrorContext::Upload, &e);
                self.record(kind, Outcome::Failed(e))
            }
        }
    }

    fn spawn_request<F>(&self, kind: MutationKind, ticket: Ticket, request: F) -> OperationHandle
    where
        F: Future<Output = Result<(), TransportError>> + Send + 'static,
    {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let generation = ticket.generation;
            let result = tokio::select! {
                biased;
                _ = ticket.token.cancelled() => None,
                result = request => Some(result),
            };

            let Some(result) = result else {
                return this.record(kind, Outcome::Superseded);
            };
            if !this.settle(kind, generation) {
                tracing::debug!(operation = kind.as_str(), generation, "Discarding superseded result");
                return this.record(kind, Outcome::Superseded);
            }

            match result {
                Ok(()) => {
                    this.list.reload();
                    if kind == MutationKind::Delete {
                        this.notifier.notify(Notification::success(DELETE_SUCCEEDED));
                    }
                    this.record(kind, Outcome::Succeeded)
                }
                Err(e) => {
                    tracing::error!(operation = kind.as_str(), generation, error = %e, "File operation failed");
                    this.errors.handle(error_context(kind), &e);
                    this.record(kind, Outcome::Failed(e))
                }
            }
        });

        OperationHandle { kind, handle }
    }
}

fn error_context(kind: MutationKind) -> ErrorContext {
    match kind {
        MutationKind::Upload => ErrorContext::Upload,
        MutationKind::Delete => ErrorContext::Delete,
        MutationKind::Replace => ErrorContext::Replace,
        MutationKind::EditMetadata => ErrorContext::EditMetadata,
    }
}

fn http_status(status: u16) -> reqwest::StatusCode {
    reqwest::StatusCode::from_u16(status).unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}
