#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use client_core::error::TransportError;
use document_manager::models::{
    DocumentPage, DocumentRecord, EntityRef, FilePayload, ListQuery, MetadataPatch,
};
use document_manager::services::{
    DocumentTransport, ErrorContext, ErrorHandler, Notification, NotificationKind, Notifier,
    StaticPermissions, TokenProvider, UploadEvent, UploadStream,
};
use document_manager::view::DownloadLinks;
use document_manager::{Collaborators, DocumentManager, ManagerOptions, ManagerState};
use futures::StreamExt;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const TEST_ENTITY_ID: &str = "site-42";
pub const TEST_ENTITY_TYPE: &str = "site";
pub const TEST_TOKEN: &str = "token-1";
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn record(uuid: &str, file_type: &str) -> DocumentRecord {
    let at = NaiveDate::from_ymd_opt(2025, 3, 11)
        .unwrap()
        .and_hms_opt(9, 44, 32)
        .unwrap();
    DocumentRecord {
        uuid: uuid.to_string(),
        name: format!("{uuid}-name"),
        description: None,
        file_type: file_type.to_string(),
        size: 1024,
        creation_time: at,
        last_modified_time: at,
        file_url: format!("https://api.example.com/download/files/{TEST_ENTITY_TYPE}/{TEST_ENTITY_ID}/{uuid}"),
        preferred_file_name: format!("{uuid}.{file_type}"),
    }
}

/// Two records per page, named after the offset they were requested with.
pub fn page_for(query: &ListQuery) -> DocumentPage {
    DocumentPage {
        items: vec![
            record(&format!("doc-{}-a", query.offset), "pdf"),
            record(&format!("doc-{}-b", query.offset), "docx"),
        ],
        total_count: 42,
    }
}

pub fn payload(size: usize) -> FilePayload {
    FilePayload::new("report.pdf", "application/pdf", vec![7u8; size])
}

/// Reply to a fake call: immediate, or held until the test releases it.
pub enum Reply<T> {
    Ready(Result<T, TransportError>),
    Held(oneshot::Receiver<Result<T, TransportError>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, TransportError> {
        match self {
            Reply::Ready(result) => result,
            Reply::Held(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Http("reply dropped".to_string()))),
        }
    }
}

fn hold<T>(queue: &Mutex<VecDeque<Reply<T>>>) -> oneshot::Sender<Result<T, TransportError>> {
    let (tx, rx) = oneshot::channel();
    queue.lock().unwrap().push_back(Reply::Held(rx));
    tx
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Delete(String),
    Replace { file_uuid: String, file_name: String },
    EditMetadata { file_uuid: String, patch: MetadataPatch },
}

type UploadScript = mpsc::UnboundedSender<Result<UploadEvent, TransportError>>;

#[derive(Default)]
pub struct FakeTransport {
    list_calls: Mutex<Vec<(EntityRef, ListQuery)>>,
    list_replies: Mutex<VecDeque<Reply<DocumentPage>>>,
    uploads: Mutex<Vec<String>>,
    upload_scripts: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<UploadEvent, TransportError>>>>,
    calls: Mutex<Vec<Call>>,
    mutation_replies: Mutex<VecDeque<Reply<()>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn list_calls(&self) -> Vec<(EntityRef, ListQuery)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.list_calls.lock().unwrap().last().map(|(_, q)| q.clone())
    }

    /// Hold the next list call until the returned sender is used.
    pub fn hold_list(&self) -> oneshot::Sender<Result<DocumentPage, TransportError>> {
        hold(&self.list_replies)
    }

    pub fn fail_next_list(&self, error: TransportError) {
        self.list_replies
            .lock()
            .unwrap()
            .push_back(Reply::Ready(Err(error)));
    }

    /// Script the next upload: the test pushes its events by hand.
    pub fn script_upload(&self) -> UploadScript {
        let (tx, rx) = mpsc::unbounded_channel();
        self.upload_scripts.lock().unwrap().push_back(rx);
        tx
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hold_mutation(&self) -> oneshot::Sender<Result<(), TransportError>> {
        hold(&self.mutation_replies)
    }

    pub fn fail_next_mutation(&self, error: TransportError) {
        self.mutation_replies
            .lock()
            .unwrap()
            .push_back(Reply::Ready(Err(error)));
    }

    async fn mutation_reply(&self, call: Call) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(call);
        let reply = self.mutation_replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentTransport for FakeTransport {
    async fn list(
        &self,
        entity: &EntityRef,
        query: &ListQuery,
    ) -> Result<DocumentPage, TransportError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((entity.clone(), query.clone()));
        let reply = self.list_replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(page_for(query)),
        }
    }

    fn upload(&self, _entity: &EntityRef, file: FilePayload) -> UploadStream {
        self.uploads.lock().unwrap().push(file.name.clone());

        if let Some(rx) = self.upload_scripts.lock().unwrap().pop_front() {
            return UnboundedReceiverStream::new(rx).boxed();
        }

        let total = file.size();
        futures::stream::iter(vec![
            Ok(UploadEvent::Progress {
                loaded: total / 2,
                total: Some(total),
            }),
            Ok(UploadEvent::Progress {
                loaded: total,
                total: Some(total),
            }),
            Ok(UploadEvent::ResponseHeader { status: 201 }),
            Ok(UploadEvent::Response { status: 201 }),
        ])
        .boxed()
    }

    async fn delete(&self, _entity: &EntityRef, file_uuid: &str) -> Result<(), TransportError> {
        self.mutation_reply(Call::Delete(file_uuid.to_string())).await
    }

    async fn replace(
        &self,
        _entity: &EntityRef,
        file_uuid: &str,
        file: FilePayload,
    ) -> Result<(), TransportError> {
        self.mutation_reply(Call::Replace {
            file_uuid: file_uuid.to_string(),
            file_name: file.name,
        })
        .await
    }

    async fn edit_metadata(
        &self,
        _entity: &EntityRef,
        file_uuid: &str,
        patch: &MetadataPatch,
    ) -> Result<(), TransportError> {
        self.mutation_reply(Call::EditMetadata {
            file_uuid: file_uuid.to_string(),
            patch: patch.clone(),
        })
        .await
    }
}

#[derive(Default)]
pub struct FakeTokens {
    calls: Mutex<usize>,
    replies: Mutex<VecDeque<Reply<String>>>,
}

impl FakeTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn reply_next(&self, result: Result<String, TransportError>) {
        self.replies.lock().unwrap().push_back(Reply::Ready(result));
    }

    pub fn hold_next(&self) -> oneshot::Sender<Result<String, TransportError>> {
        hold(&self.replies)
    }
}

#[async_trait]
impl TokenProvider for FakeTokens {
    async fn get_token(&self) -> Result<String, TransportError> {
        *self.calls.lock().unwrap() += 1;
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(TEST_TOKEN.to_string()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.of_kind(NotificationKind::Success)
    }

    pub fn errors(&self) -> Vec<String> {
        self.of_kind(NotificationKind::Error)
    }

    fn of_kind(&self, kind: NotificationKind) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingErrors {
    seen: Mutex<Vec<(ErrorContext, TransportError)>>,
}

impl RecordingErrors {
    pub fn all(&self) -> Vec<(ErrorContext, TransportError)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<ErrorContext> {
        self.seen.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }
}

impl ErrorHandler for RecordingErrors {
    fn handle(&self, context: ErrorContext, error: &TransportError) {
        self.seen.lock().unwrap().push((context, error.clone()));
    }
}

pub struct TestManager {
    pub manager: DocumentManager,
    pub transport: Arc<FakeTransport>,
    pub tokens: Arc<FakeTokens>,
    pub notifier: Arc<RecordingNotifier>,
    pub errors: Arc<RecordingErrors>,
}

impl TestManager {
    /// Manager with write access whose initial list fetch has completed.
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeTransport::new(), &["BASIC_READ", "BASIC_WRITE"]).await
    }

    pub async fn spawn_read_only() -> Self {
        Self::spawn_with(FakeTransport::new(), &["BASIC_READ"]).await
    }

    pub async fn spawn_with(transport: Arc<FakeTransport>, roles: &[&str]) -> Self {
        let app = Self::start(transport, FakeTokens::new(), roles);
        app.wait_for(|s| !s.documents.is_loading && s.token.token.is_some())
            .await;
        app
    }

    /// Construct without waiting for the initial fetches.
    pub fn start(transport: Arc<FakeTransport>, tokens: Arc<FakeTokens>, roles: &[&str]) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let errors = Arc::new(RecordingErrors::default());

        let options = ManagerOptions {
            links: Some(
                DownloadLinks::new("https://api.example.com", "https://app.example.com").unwrap(),
            ),
            ..ManagerOptions::default()
        };
        let collaborators = Collaborators {
            transport: transport.clone(),
            tokens: tokens.clone(),
            permissions: Arc::new(StaticPermissions::new(roles.iter().copied())),
            notifier: notifier.clone(),
            errors: errors.clone(),
        };

        let manager = DocumentManager::new(
            EntityRef::new(TEST_ENTITY_ID, TEST_ENTITY_TYPE),
            options,
            collaborators,
        );

        Self {
            manager,
            transport,
            tokens,
            notifier,
            errors,
        }
    }

    pub async fn wait_for(&self, predicate: impl FnMut(&ManagerState) -> bool) -> ManagerState {
        within(self.manager.wait_for(predicate)).await
    }

    pub async fn wait_for_lists(&self, count: usize) {
        eventually(|| self.transport.list_count() >= count).await;
        self.wait_for(|s| !s.documents.is_loading).await;
    }
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT_TIMEOUT, future)
        .await
        .expect("Timed out waiting for condition")
}

/// Poll `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// Give spawned tasks a chance to run before asserting that nothing happened.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
