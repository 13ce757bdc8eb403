//! Per-record helpers for a rendered document list.

use crate::models::{DocumentRecord, FilePayload, MetadataPatch};

/// Element a pointer click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickElement {
    Input,
    Button,
    TextArea,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTarget {
    pub element: ClickElement,
    /// Whether the click landed inside the row's action menu.
    pub inside_action_menu: bool,
}

impl ClickTarget {
    pub fn new(element: ClickElement) -> Self {
        Self {
            element,
            inside_action_menu: false,
        }
    }

    pub fn in_action_menu(mut self) -> Self {
        self.inside_action_menu = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickDecision {
    pub open_preview: bool,
    pub select: bool,
}

/// Decide what a click on a row means.
///
/// Clicks on form controls belong to the control. Any other click selects
/// the record, and opens the preview for PDFs unless it came from the
/// action menu.
pub fn classify_click(record: &DocumentRecord, target: ClickTarget) -> ClickDecision {
    match target.element {
        ClickElement::Input | ClickElement::Button | ClickElement::TextArea => {
            ClickDecision::default()
        }
        ClickElement::Other => ClickDecision {
            open_preview: record.is_pdf() && !target.inside_action_menu,
            select: true,
        },
    }
}

/// A row action, bound to the uuid of the row that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Delete { file_uuid: String },
    Replace { file_uuid: String, file: FilePayload },
    EditMetadata { file_uuid: String, patch: MetadataPatch },
}

impl RowAction {
    pub fn file_uuid(&self) -> &str {
        match self {
            RowAction::Delete { file_uuid }
            | RowAction::Replace { file_uuid, .. }
            | RowAction::EditMetadata { file_uuid, .. } => file_uuid,
        }
    }
}

/// One rendered record. The uuid is captured when the row is built, so every
/// action it emits targets that record and no other.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    file_uuid: String,
    record: DocumentRecord,
}

impl DocumentRow {
    pub fn new(record: DocumentRecord) -> Self {
        Self {
            file_uuid: record.uuid.clone(),
            record,
        }
    }

    pub fn file_uuid(&self) -> &str {
        &self.file_uuid
    }

    pub fn record(&self) -> &DocumentRecord {
        &self.record
    }

    pub fn delete(&self) -> RowAction {
        RowAction::Delete {
            file_uuid: self.file_uuid.clone(),
        }
    }

    pub fn replace(&self, file: FilePayload) -> RowAction {
        RowAction::Replace {
            file_uuid: self.file_uuid.clone(),
            file,
        }
    }

    pub fn edit_metadata(&self, patch: MetadataPatch) -> RowAction {
        RowAction::EditMetadata {
            file_uuid: self.file_uuid.clone(),
            patch,
        }
    }

    pub fn click(&self, target: ClickTarget) -> ClickDecision {
        classify_click(&self.record, target)
    }

    pub fn draft(&self) -> MetadataDraft {
        MetadataDraft::from_record(&self.record)
    }
}

pub fn rows(records: &[DocumentRecord]) -> Vec<DocumentRow> {
    records.iter().cloned().map(DocumentRow::new).collect()
}

/// Editable name and description of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDraft {
    pub name: String,
    pub description: String,
}

impl MetadataDraft {
    pub fn from_record(record: &DocumentRecord) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone().unwrap_or_default(),
        }
    }

    /// The patch to submit, or `None` when the draft is invalid or unchanged.
    /// A missing description compares equal to an empty one.
    pub fn to_patch(&self, record: &DocumentRecord) -> Option<MetadataPatch> {
        if self.name.trim().is_empty() {
            return None;
        }

        let current_description = record.description.as_deref().unwrap_or_default();
        if self.name == record.name && self.description == current_description {
            return None;
        }

        Some(MetadataPatch {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            file_type: Some(record.file_type.clone()),
        })
    }
}
