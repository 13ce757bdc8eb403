//! Paged document list bound to the derived request key.

use crate::services::{DocumentTransport, ErrorContext, ErrorHandler};
use crate::store::request_key::RequestKey;
use crate::store::slot::{TaskSlot, Ticket};
use crate::store::state::{ManagerState, StateStore};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A fetch that has been registered in state but not yet started.
#[derive(Debug)]
pub(crate) struct PendingFetch {
    ticket: Ticket,
    key: RequestKey,
}

#[derive(Clone)]
pub struct ListResource {
    store: StateStore,
    transport: Arc<dyn DocumentTransport>,
    errors: Arc<dyn ErrorHandler>,
    slot: Arc<TaskSlot>,
}

impl ListResource {
    pub(crate) fn new(
        store: StateStore,
        transport: Arc<dyn DocumentTransport>,
        errors: Arc<dyn ErrorHandler>,
    ) -> Self {
        Self {
            store,
            transport,
            errors,
            slot: Arc::new(TaskSlot::new("list")),
        }
    }

    /// Re-derive the key from the current parameters and register a fetch if
    /// it changed. Runs inside a store update.
    pub(crate) fn sync_key(&self, state: &mut ManagerState) -> Option<PendingFetch> {
        let key = RequestKey::derive(&state.params);
        if key == state.request_key {
            return None;
        }
        state.request_key = key;
        Some(self.register(state))
    }

    /// Supersede any in-flight fetch and mark the list as loading. Runs
    /// inside a store update.
    pub(crate) fn register(&self, state: &mut ManagerState) -> PendingFetch {
        let ticket = self.slot.begin();
        state.documents.is_loading = true;
        PendingFetch {
            ticket,
            key: state.request_key.clone(),
        }
    }

    /// Fetch again for the current key, even if it is unchanged.
    pub fn reload(&self) -> JoinHandle<()> {
        let pending = self.store.update(|state| self.register(state));
        self.spawn(pending)
    }

    pub(crate) fn spawn(&self, pending: PendingFetch) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(pending).await })
    }

    pub(crate) fn shutdown(&self) {
        self.slot.shutdown();
    }

    async fn run(self, pending: PendingFetch) {
        let PendingFetch { ticket, key } = pending;
        let entity = key.entity();
        let query = key.query();

        tracing::debug!(
            entity_id = %entity.id,
            entity_type = %entity.entity_type,
            limit = query.limit,
            offset = query.offset,
            sort = %query.sort,
            generation = ticket.generation,
            "Fetching documents"
        );

        let result = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => {
                tracing::debug!(generation = ticket.generation, "Document fetch superseded");
                return;
            }
            result = self.transport.list(&entity, &query) => result,
        };

        let generation = ticket.generation;
        match result {
            Ok(page) => {
                let applied = self.store.update_if(|state| {
                    if !self.slot.is_current(generation) {
                        return false;
                    }
                    state.documents.items = page.items;
                    state.documents.total_count = page.total_count;
                    state.documents.error = None;
                    state.documents.is_loading = false;
                    true
                });
                if !applied {
                    tracing::debug!(generation, "Discarding stale document page");
                    return;
                }
                self.slot.finish(generation);
                metrics::counter!("document_manager_list_fetch_total", "outcome" => "succeeded")
                    .increment(1);
            }
            Err(e) => {
                let applied = self.store.update_if(|state| {
                    if !self.slot.is_current(generation) {
                        return false;
                    }
                    state.documents.error = Some(e.clone());
                    state.documents.is_loading = false;
                    true
                });
                if !applied {
                    tracing::debug!(generation, error = %e, "Discarding stale fetch failure");
                    return;
                }
                self.slot.finish(generation);
                metrics::counter!("document_manager_list_fetch_total", "outcome" => "failed")
                    .increment(1);

                tracing::error!(
                    entity_id = %entity.id,
                    entity_type = %entity.entity_type,
                    error = %e,
                    "Failed to load documents"
                );
                self.errors.handle(ErrorContext::ListDocuments, &e);
            }
        }
    }
}
