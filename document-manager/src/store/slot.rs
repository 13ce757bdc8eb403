use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Handle given to the task that owns a slot generation.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Cancel-and-replace slot for one kind of async task.
///
/// Starting a task cancels the previous holder and bumps the generation.
/// Results are only applied while their generation is still current, which
/// gives switch-to-latest semantics without relying on cancellation being
/// observed in time. Generations are read and bumped inside `StateStore`
/// updates, so checks and writes cannot interleave.
#[derive(Debug)]
pub(crate) struct TaskSlot {
    name: &'static str,
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            tracing::debug!(slot = self.name, generation, "Superseding in-flight task");
            previous.cancel();
        }

        Ticket { generation, token }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Release the slot once the current task has settled.
    pub fn finish(&self, generation: u64) {
        if self.is_current(generation) {
            self.current
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
    }

    /// Cancel whatever is in flight and invalidate its generation.
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}
