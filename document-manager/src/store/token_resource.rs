use crate::services::{ErrorContext, ErrorHandler, TokenProvider};
use crate::store::slot::TaskSlot;
use crate::store::state::StateStore;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Download API key, fetched once and independent of the view parameters.
#[derive(Clone)]
pub struct TokenResource {
    store: StateStore,
    provider: Arc<dyn TokenProvider>,
    errors: Arc<dyn ErrorHandler>,
    slot: Arc<TaskSlot>,
}

impl TokenResource {
    pub(crate) fn new(
        store: StateStore,
        provider: Arc<dyn TokenProvider>,
        errors: Arc<dyn ErrorHandler>,
    ) -> Self {
        Self {
            store,
            provider,
            errors,
            slot: Arc::new(TaskSlot::new("token")),
        }
    }

    pub fn reload(&self) -> JoinHandle<()> {
        let ticket = self.store.update(|state| {
            state.token.is_loading = true;
            self.slot.begin()
        });

        let this = self.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = ticket.token.cancelled() => return,
                result = this.provider.get_token() => result,
            };

            let generation = ticket.generation;
            let failure = result.as_ref().err().cloned();
            let applied = this.store.update_if(|state| {
                if !this.slot.is_current(generation) {
                    return false;
                }
                state.token.is_loading = false;
                match result {
                    Ok(token) => {
                        state.token.token = Some(token);
                        state.token.error = None;
                    }
                    Err(e) => state.token.error = Some(e),
                }
                true
            });
            if !applied {
                return;
            }
            this.slot.finish(generation);

            if let Some(e) = failure {
                tracing::error!(error = %e, "Failed to fetch download token");
                this.errors.handle(ErrorContext::FetchToken, &e);
            }
        })
    }

    pub(crate) fn shutdown(&self) {
        self.slot.shutdown();
    }
}
