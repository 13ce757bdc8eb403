//! Published view state and the store that serializes every transition.

use crate::error::DocumentError;
use crate::models::{DocumentRecord, ViewParameters, ViewPatch};
use crate::store::request_key::RequestKey;
use client_core::error::TransportError;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResourceState {
    pub items: Vec<DocumentRecord>,
    pub total_count: u64,
    pub is_loading: bool,
    pub error: Option<TransportError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    pub token: Option<String>,
    pub is_loading: bool,
    pub error: Option<TransportError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UploadState {
    pub busy: bool,
    pub progress_percent: Option<f64>,
}

impl UploadState {
    pub fn in_progress(&self) -> bool {
        self.progress_percent.is_some()
    }
}

/// Mutation kinds, each with its own in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Upload,
    Delete,
    Replace,
    EditMetadata,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Upload => "upload",
            MutationKind::Delete => "delete",
            MutationKind::Replace => "replace",
            MutationKind::EditMetadata => "edit_metadata",
        }
    }
}

/// Per-kind in-flight flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyState {
    pub upload: bool,
    pub delete: bool,
    pub replace: bool,
    pub edit_metadata: bool,
}

impl BusyState {
    pub fn get(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::Upload => self.upload,
            MutationKind::Delete => self.delete,
            MutationKind::Replace => self.replace,
            MutationKind::EditMetadata => self.edit_metadata,
        }
    }

    pub(crate) fn set(&mut self, kind: MutationKind, busy: bool) {
        match kind {
            MutationKind::Upload => self.upload = busy,
            MutationKind::Delete => self.delete = busy,
            MutationKind::Replace => self.replace = busy,
            MutationKind::EditMetadata => self.edit_metadata = busy,
        }
    }

    pub fn count(&self) -> usize {
        [self.upload, self.delete, self.replace, self.edit_metadata]
            .iter()
            .filter(|busy| **busy)
            .count()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

/// Snapshot of everything an observer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerState {
    pub params: ViewParameters,
    /// Key of the most recently issued list fetch.
    pub request_key: RequestKey,
    pub selected_preview: Option<DocumentRecord>,
    pub documents: ListResourceState,
    pub token: TokenState,
    pub busy: BusyState,
    pub progress_percent: Option<f64>,
}

impl ManagerState {
    pub fn new(params: ViewParameters) -> Self {
        let request_key = RequestKey::derive(&params);
        Self {
            params,
            request_key,
            selected_preview: None,
            documents: ListResourceState::default(),
            token: TokenState::default(),
            busy: BusyState::default(),
            progress_percent: None,
        }
    }

    /// True while the list is loading or any mutation is in flight.
    pub fn is_loading(&self) -> bool {
        self.documents.is_loading || self.busy.any()
    }

    pub fn upload(&self) -> UploadState {
        UploadState {
            busy: self.busy.upload,
            progress_percent: self.progress_percent,
        }
    }

    pub fn upload_in_progress(&self) -> bool {
        self.upload().in_progress()
    }

    pub fn offset(&self) -> u64 {
        self.params.offset()
    }

    /// Apply a view patch. Validation happens first so a rejected patch
    /// leaves the state untouched.
    pub(crate) fn apply_patch(&mut self, patch: ViewPatch) -> Result<(), DocumentError> {
        if patch.page == Some(0) {
            return Err(DocumentError::InvalidPage);
        }
        if patch.limit == Some(0) {
            return Err(DocumentError::InvalidLimit);
        }

        if let Some(sort) = patch.sort {
            self.params.sort = sort;
        }
        if let Some(file_type) = patch.file_type {
            self.params.file_type = file_type;
        }
        if let Some(name) = patch.name {
            self.params.name = name;
        }
        if let Some(page) = patch.page {
            self.params.page = page;
        }
        if let Some(limit) = patch.limit {
            self.params.limit = limit;
        }
        if let Some(selected) = patch.selected_preview {
            self.selected_preview = selected;
        }
        Ok(())
    }
}

/// Owner of the published state. Every transition is one exclusive update,
/// so observers never see a half-applied change.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<ManagerState>>,
}

impl StateStore {
    pub fn new(initial: ManagerState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> ManagerState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.tx.subscribe()
    }

    /// Run `f` with exclusive access and notify observers.
    ///
    /// `f` must not call back into the store.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ManagerState) -> R) -> R {
        let mut output = None;
        self.tx.send_modify(|state| output = Some(f(state)));
        match output {
            Some(value) => value,
            None => unreachable!("send_modify runs its closure exactly once"),
        }
    }

    /// Like [`update`](Self::update), but observers are only notified when
    /// `f` returns true.
    pub(crate) fn update_if(&self, f: impl FnOnce(&mut ManagerState) -> bool) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            applied = f(state);
            applied
        });
        applied
    }
}
