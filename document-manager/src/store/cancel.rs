use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// User-triggered abort signal for the upload currently in flight.
///
/// Each upload arms a fresh token; `signal` only ever reaches the upload that
/// armed last, and later uploads start with a clean token.
#[derive(Debug, Default)]
pub struct CancellationChannel {
    armed: Mutex<Option<(u64, CancellationToken)>>,
}

impl CancellationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn arm(&self, generation: u64) -> CancellationToken {
        let token = CancellationToken::new();
        *self.armed.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((generation, token.clone()));
        token
    }

    /// Abort the armed upload. Returns false when nothing was armed.
    pub fn signal(&self) -> bool {
        match self.armed.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some((generation, token)) => {
                tracing::debug!(generation, "Upload cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn disarm(&self, generation: u64) {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(armed.as_ref(), Some((armed_generation, _)) if *armed_generation == generation) {
            armed.take();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
