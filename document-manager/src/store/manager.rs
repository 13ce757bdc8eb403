//! Facade wiring the list, token and mutation controllers to one state store.

use crate::config::ManagerConfig;
use crate::error::DocumentError;
use crate::models::{
    DocumentRecord, EntityRef, FilePayload, MetadataPatch, ViewParameters, ViewPatch,
};
use crate::services::{DocumentTransport, ErrorHandler, Notifier, PermissionChecker, TokenProvider};
use crate::store::list_resource::ListResource;
use crate::store::mutations::{MutationCoordinator, OperationHandle};
use crate::store::state::{ManagerState, StateStore};
use crate::store::token_resource::TokenResource;
use crate::view::{ClickDecision, ClickTarget, DocumentRow, DownloadLinks, RowAction};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// External services the manager depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn DocumentTransport>,
    pub tokens: Arc<dyn TokenProvider>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub notifier: Arc<dyn Notifier>,
    pub errors: Arc<dyn ErrorHandler>,
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub max_file_size: u64,
    pub default_limit: u32,
    pub default_sort: String,
    pub write_role: String,
    pub links: Option<DownloadLinks>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        let config = ManagerConfig::default();
        Self {
            max_file_size: config.max_file_size,
            default_limit: config.default_limit,
            default_sort: config.default_sort,
            write_role: config.write_role,
            links: None,
        }
    }
}

impl ManagerOptions {
    pub fn from_config(config: &ManagerConfig) -> Result<Self, DocumentError> {
        Ok(Self {
            max_file_size: config.max_file_size,
            default_limit: config.default_limit,
            default_sort: config.default_sort.clone(),
            write_role: config.write_role.clone(),
            links: Some(DownloadLinks::from_config(config)?),
        })
    }
}

/// Document list and file operations for one entity.
///
/// Construction starts the first list fetch and the token fetch, so it must
/// happen inside a Tokio runtime. Dropping the manager cancels everything
/// still in flight.
pub struct DocumentManager {
    store: StateStore,
    list: ListResource,
    token: TokenResource,
    mutations: MutationCoordinator,
    links: Option<DownloadLinks>,
}

impl DocumentManager {
    pub fn new(entity: EntityRef, options: ManagerOptions, collaborators: Collaborators) -> Self {
        let Collaborators {
            transport,
            tokens,
            permissions,
            notifier,
            errors,
        } = collaborators;

        let read_only = !permissions.has_role(&options.write_role);

        let mut params = ViewParameters::new(&entity);
        params.sort = options.default_sort;
        params.limit = options.default_limit.max(1);

        let store = StateStore::new(ManagerState::new(params));
        let list = ListResource::new(store.clone(), transport.clone(), errors.clone());
        let token = TokenResource::new(store.clone(), tokens, errors.clone());
        let mutations = MutationCoordinator::new(
            store.clone(),
            transport,
            notifier,
            errors,
            list.clone(),
            options.max_file_size,
            read_only,
        );

        tracing::info!(
            entity_id = %entity.id,
            entity_type = %entity.entity_type,
            read_only,
            "Document manager started"
        );

        list.reload();
        token.reload();

        Self {
            store,
            list,
            token,
            mutations,
            links: options.links,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.store.subscribe()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&ManagerState) -> bool) -> ManagerState {
        let mut rx = self.store.subscribe();
        let state = match rx.wait_for(|state| predicate(state)).await {
            Ok(state) => state.clone(),
            // The manager holds the sender, so the channel outlives this call.
            Err(_) => self.store.snapshot(),
        };
        state
    }

    pub fn is_read_only(&self) -> bool {
        self.mutations.is_read_only()
    }

    pub fn mutations(&self) -> MutationCoordinator {
        self.mutations.clone()
    }

    pub fn update_entity_id(&self, entity_id: impl Into<String>) {
        let entity_id = entity_id.into();
        let pending = self.store.update(|state| {
            state.params.entity_id = entity_id;
            self.list.sync_key(state)
        });
        if let Some(pending) = pending {
            self.list.spawn(pending);
        }
    }

    pub fn update_entity_type(&self, entity_type: impl Into<String>) {
        let entity_type = entity_type.into();
        let pending = self.store.update(|state| {
            state.params.entity_type = entity_type;
            self.list.sync_key(state)
        });
        if let Some(pending) = pending {
            self.list.spawn(pending);
        }
    }

    /// Apply a view patch in one update. A fetch is issued only when the
    /// patch changes the request key.
    pub fn patch(&self, patch: ViewPatch) -> Result<(), DocumentError> {
        let pending = self.store.update(|state| {
            state.apply_patch(patch)?;
            Ok::<_, DocumentError>(self.list.sync_key(state))
        });

        match pending {
            Ok(Some(pending)) => {
                self.list.spawn(pending);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected view patch");
                Err(e)
            }
        }
    }

    pub fn open_preview(&self, record: DocumentRecord) {
        self.store.update(|state| state.selected_preview = Some(record));
    }

    pub fn close_preview(&self) {
        self.store.update_if(|state| state.selected_preview.take().is_some());
    }

    /// Fetch the current page again.
    pub fn load_documents(&self) -> JoinHandle<()> {
        self.list.reload()
    }

    pub fn reload_token(&self) -> JoinHandle<()> {
        self.token.reload()
    }

    pub fn upload_file(&self, file: FilePayload) -> Result<OperationHandle, DocumentError> {
        self.mutations.upload_file(file)
    }

    pub fn cancel_upload(&self) -> bool {
        self.mutations.cancel_upload()
    }

    pub fn delete_file(&self, file_uuid: impl Into<String>) -> Result<OperationHandle, DocumentError> {
        self.mutations.delete_file(file_uuid)
    }

    pub fn update_file(
        &self,
        file_uuid: impl Into<String>,
        file: FilePayload,
    ) -> Result<OperationHandle, DocumentError> {
        self.mutations.update_file(file_uuid, file)
    }

    pub fn update_metadata(
        &self,
        file_uuid: impl Into<String>,
        patch: MetadataPatch,
    ) -> Result<OperationHandle, DocumentError> {
        self.mutations.update_metadata(file_uuid, patch)
    }

    pub fn dispatch(&self, action: RowAction) -> Result<OperationHandle, DocumentError> {
        match action {
            RowAction::Delete { file_uuid } => self.delete_file(file_uuid),
            RowAction::Replace { file_uuid, file } => self.update_file(file_uuid, file),
            RowAction::EditMetadata { file_uuid, patch } => self.update_metadata(file_uuid, patch),
        }
    }

    /// Route a click on a row, opening the preview when the click asks for it.
    pub fn handle_click(&self, row: &DocumentRow, target: ClickTarget) -> ClickDecision {
        let decision = row.click(target);
        if decision.open_preview {
            self.open_preview(row.record().clone());
        }
        decision
    }

    /// Download link for `record`, available once the token has loaded.
    pub fn download_url(&self, record: &DocumentRecord) -> Option<Url> {
        let links = self.links.as_ref()?;
        let token = self.store.snapshot().token.token?;
        links.download_url(record, &token)
    }

    pub fn preview_url(&self) -> Option<Url> {
        let state = self.store.snapshot();
        let record = state.selected_preview?;
        let token = state.token.token?;
        self.links.as_ref()?.download_url(&record, &token)
    }
}

impl Drop for DocumentManager {
    fn drop(&mut self) {
        self.list.shutdown();
        self.token.shutdown();
        self.mutations.shutdown();
    }
}
