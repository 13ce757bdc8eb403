use super::DocumentRecord;
use serde::Serialize;

pub const DEFAULT_SORT: &str = "name";
pub const DEFAULT_LIMIT: u32 = 10;

/// The owner a document collection is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: String,
    pub entity_type: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// Query half of a list call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u64,
    pub sort: String,
}

/// Mutable view parameters. `page` and `limit` are always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParameters {
    pub entity_id: String,
    pub entity_type: String,
    pub sort: String,
    pub page: u32,
    pub limit: u32,
    pub file_type: Option<String>,
    pub name: Option<String>,
}

impl ViewParameters {
    pub fn new(entity: &EntityRef) -> Self {
        Self {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type.clone(),
            sort: DEFAULT_SORT.to_string(),
            page: 1,
            limit: DEFAULT_LIMIT,
            file_type: None,
            name: None,
        }
    }

    /// Zero-based offset of the first record on the current page.
    pub fn offset(&self) -> u64 {
        let limit = u64::from(self.limit);
        (u64::from(self.page) * limit).saturating_sub(limit)
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_id.clone(), self.entity_type.clone())
    }
}

/// Externally settable subset of the view state, applied as one update.
///
/// `None` leaves a field untouched; the nested options clear a value with
/// `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewPatch {
    pub sort: Option<String>,
    pub file_type: Option<Option<String>>,
    pub name: Option<Option<String>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub selected_preview: Option<Option<DocumentRecord>>,
}

impl ViewPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn file_type(mut self, file_type: Option<String>) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn selected_preview(mut self, record: Option<DocumentRecord>) -> Self {
        self.selected_preview = Some(record);
        self
    }
}
