use contentmart_catalog::{ContentFile, ContentPackage, PropertyState};
use contentmart_core::PropertyId;
use contentmart_storage::FileUpload;

/// A value chosen for one facet. A blank value means "not chosen".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub property_id: PropertyId,
    pub value: String,
}

impl Selection {
    pub fn new(property_id: PropertyId, value: impl Into<String>) -> Self {
        Self {
            property_id,
            value: value.into(),
        }
    }

    pub(crate) fn chosen(&self) -> Option<&str> {
        let value = self.value.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Everything needed to publish a package.
#[derive(Debug)]
pub struct UploadRequest {
    pub caption: String,
    pub description: String,
    pub price: i64,
    pub selections: Vec<Selection>,
    pub files: Vec<FileUpload>,
}

impl UploadRequest {
    pub fn new(caption: impl Into<String>, price: i64) -> Self {
        Self {
            caption: caption.into(),
            description: String::new(),
            price,
            selections: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn select(mut self, property_id: PropertyId, value: impl Into<String>) -> Self {
        self.selections.push(Selection::new(property_id, value));
        self
    }

    pub fn file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }
}

/// A published package with its tags and file records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPackage {
    pub package: ContentPackage,
    pub states: Vec<PropertyState>,
    pub files: Vec<ContentFile>,
}
