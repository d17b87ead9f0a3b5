use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use contentmart_core::{
    ContentFileId, Entity, PackageId, PackageStateId, PropertyId, PropertyStateId, UserId,
};

/// A facet definition (e.g. "Country").
///
/// `order` fixes the narrowing sequence: lower orders are chosen first and
/// appear first in storage paths. Orders start at 1 and may have gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub order: u32,
    /// Highest state index ever handed out for this property.
    pub last_state_index: u32,
}

impl Property {
    pub fn new(id: PropertyId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            last_state_index: 0,
        }
    }
}

impl Entity for Property {
    type Id = PropertyId;

    fn id(&self) -> PropertyId {
        self.id
    }
}

/// One discrete value of a [`Property`].
///
/// `index` is unique within the owning property and never reused; it is the
/// stable token storage paths are built from, so renaming `value` never moves
/// files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyState {
    pub id: PropertyStateId,
    pub property_id: PropertyId,
    pub value: String,
    pub index: u32,
}

impl Entity for PropertyState {
    type Id = PropertyStateId;

    fn id(&self) -> PropertyStateId {
        self.id
    }
}

/// An uploaded, priced bundle of files.
///
/// The facet values tagging a package live in the [`PackageState`] table, not
/// on the package itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPackage {
    pub id: PackageId,
    pub caption: String,
    pub description: String,
    pub price: i64,
    pub owner: UserId,
    /// Storage directory relative to the storage root (empty = root).
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl ContentPackage {
    pub fn new(
        id: PackageId,
        caption: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        owner: UserId,
    ) -> Self {
        Self {
            id,
            caption: caption.into(),
            description: description.into(),
            price,
            owner,
            path: PathBuf::new(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for ContentPackage {
    type Id = PackageId;

    fn id(&self) -> PackageId {
        self.id
    }
}

/// Association row: `package_id` is tagged with `state_id`.
///
/// Neither side owns the other; removing a row never removes the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageState {
    pub id: PackageStateId,
    pub package_id: PackageId,
    pub state_id: PropertyStateId,
}

impl Entity for PackageState {
    type Id = PackageStateId;

    fn id(&self) -> PackageStateId {
        self.id
    }
}

/// One physical file belonging to a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    pub id: ContentFileId,
    pub package_id: PackageId,
    pub name: String,
    pub is_preview: bool,
}

impl Entity for ContentFile {
    type Id = ContentFileId;

    fn id(&self) -> ContentFileId {
        self.id
    }
}

/// The slice of a `(Property, PropertyState)` pair that storage paths need.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Facet {
    pub property_id: PropertyId,
    pub order: u32,
    pub state_index: u32,
}

impl Facet {
    pub fn of(property: &Property, state: &PropertyState) -> Self {
        Self {
            property_id: property.id,
            order: property.order,
            state_index: state.index,
        }
    }
}
