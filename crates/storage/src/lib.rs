//! `contentmart-storage`: physical file storage for content packages.
//!
//! Packages are laid out by their facets:
//! ```text
//! {root}/
//! ├── 1_1/
//! │   ├── -/
//! │   │   └── 3_2/
//! │   │       └── lecture.pdf
//! │   └── 2_1/
//! │       └── notes.txt
//! └── untagged.zip
//! ```
//! Each directory level is one property order slot: `{property_id}_{state_index}`
//! when the package has a value for that property, `-` when it skips it.

pub mod error;
pub mod manager;
pub mod provider;

pub use error::StorageError;
pub use manager::{FileStorageManager, FileUpload, StoredFile, MISSING_SEGMENT};
pub use provider::{FileStorageProvider, InMemoryFileStorage, LocalFileStorage};
