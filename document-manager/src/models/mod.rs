pub mod document;
pub mod view;

pub use document::{DocumentPage, DocumentRecord, FilePayload, MetadataPatch};
pub use view::{EntityRef, ListQuery, ViewParameters, ViewPatch};
