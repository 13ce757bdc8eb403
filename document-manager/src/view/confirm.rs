//! Delete confirmation: ask first, delete only on an explicit confirm.

use crate::error::DocumentError;
use crate::store::mutations::{MutationCoordinator, OperationHandle};
use crate::view::row::DocumentRow;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Confirm,
    Dismiss,
}

/// Confirmation surface shown to the user.
pub trait ConfirmDialog: Send + Sync {
    /// Present the dialog for the named records. The stream yields the
    /// user's answers; only the first one counts.
    fn open(&self, names: Vec<String>) -> BoxStream<'static, DialogOutcome>;
}

/// Lifetime of the view that owns pending confirmations.
#[derive(Debug, Clone, Default)]
pub struct ViewLifetime {
    token: CancellationToken,
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }

    pub fn is_destroyed(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
pub enum ConfirmationResult {
    Deleted(OperationHandle),
    Dismissed,
    /// The view went away before the user answered.
    Abandoned,
    Rejected(DocumentError),
}

impl ConfirmationResult {
    pub fn delete_issued(&self) -> bool {
        matches!(self, ConfirmationResult::Deleted(_))
    }
}

pub struct DeleteConfirmation {
    dialog: Arc<dyn ConfirmDialog>,
    lifetime: ViewLifetime,
}

impl DeleteConfirmation {
    pub fn new(dialog: Arc<dyn ConfirmDialog>, lifetime: ViewLifetime) -> Self {
        Self { dialog, lifetime }
    }

    pub fn request(&self, mutations: MutationCoordinator, row: &DocumentRow) -> JoinHandle<ConfirmationResult> {
        let file_uuid = row.file_uuid().to_string();
        let mut answers = self.dialog.open(vec![row.record().name.clone()]);
        let lifetime = self.lifetime.token.clone();

        tokio::spawn(async move {
            let answer = tokio::select! {
                biased;
                _ = lifetime.cancelled() => None,
                answer = answers.next() => Some(answer),
            };

            match answer {
                None => {
                    tracing::debug!(file_uuid = %file_uuid, "View closed before delete was confirmed");
                    ConfirmationResult::Abandoned
                }
                Some(Some(DialogOutcome::Confirm)) => match mutations.delete_file(file_uuid) {
                    Ok(handle) => ConfirmationResult::Deleted(handle),
                    Err(e) => ConfirmationResult::Rejected(e),
                },
                Some(Some(DialogOutcome::Dismiss)) | Some(None) => ConfirmationResult::Dismissed,
            }
        })
    }
}
