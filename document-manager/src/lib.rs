pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod view;

pub use config::ManagerConfig;
pub use error::DocumentError;
pub use store::{Collaborators, DocumentManager, ManagerOptions, ManagerState, Outcome};
