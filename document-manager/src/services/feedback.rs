//! User-facing notifications and the error continuation for failed calls.

use client_core::error::TransportError;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget delivery of a notification to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(text = %notification.message, "Notification"),
            NotificationKind::Error => tracing::warn!(text = %notification.message, "Notification"),
        }
    }
}

/// The call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorContext {
    ListDocuments,
    FetchToken,
    Upload,
    Delete,
    Replace,
    EditMetadata,
}

impl ErrorContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorContext::ListDocuments => "list_documents",
            ErrorContext::FetchToken => "fetch_token",
            ErrorContext::Upload => "upload",
            ErrorContext::Delete => "delete",
            ErrorContext::Replace => "replace",
            ErrorContext::EditMetadata => "edit_metadata",
        }
    }
}

/// Continuation for failed remote calls. Must not panic; the caller carries
/// on accepting new operations after it returns.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, context: ErrorContext, error: &TransportError);
}

/// Logs the failure and tells the user about it.
#[derive(Clone)]
pub struct NotifyingErrorHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyingErrorHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ErrorHandler for NotifyingErrorHandler {
    fn handle(&self, context: ErrorContext, error: &TransportError) {
        tracing::error!(operation = context.as_str(), error = %error, "File service call failed");

        let message = match error {
            TransportError::Forbidden(_) | TransportError::Unauthorized(_) => {
                "You are not allowed to do that".to_string()
            }
            TransportError::NotFound(_) => "The file no longer exists".to_string(),
            other => other.to_string(),
        };
        self.notifier.notify(Notification::error(message));
    }
}
