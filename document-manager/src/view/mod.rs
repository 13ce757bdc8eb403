pub mod confirm;
pub mod links;
pub mod row;

pub use confirm::{ConfirmDialog, ConfirmationResult, DeleteConfirmation, DialogOutcome, ViewLifetime};
pub use links::DownloadLinks;
pub use row::{
    classify_click, rows, ClickDecision, ClickElement, ClickTarget, DocumentRow,
    MetadataDraft, RowAction,
};
