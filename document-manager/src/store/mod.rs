pub mod cancel;
pub mod list_resource;
pub mod manager;
pub mod mutations;
pub mod progress;
pub mod request_key;
pub mod slot;
pub mod state;
pub mod token_resource;

pub use cancel::CancellationChannel;
pub use list_resource::ListResource;
pub use manager::{Collaborators, DocumentManager, ManagerOptions};
pub use mutations::{MutationCoordinator, OperationHandle, Outcome};
pub use progress::UploadProgressTracker;
pub use request_key::RequestKey;
pub use state::{
    BusyState, ListResourceState, ManagerState, MutationKind, StateStore, TokenState, UploadState,
};
pub use token_resource::TokenResource;
