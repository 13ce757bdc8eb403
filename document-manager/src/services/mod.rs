pub mod feedback;
pub mod http_client;
pub mod permissions;
pub mod transport;

pub use feedback::{
    ErrorContext, ErrorHandler, Notification, NotificationKind, Notifier, NotifyingErrorHandler,
    TracingNotifier,
};
pub use http_client::{HttpDocumentClient, HttpTokenProvider};
pub use permissions::{PermissionChecker, StaticPermissions};
pub use transport::{DocumentTransport, TokenProvider, UploadEvent, UploadStream};
