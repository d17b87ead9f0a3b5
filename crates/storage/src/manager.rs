//! Facet-derived package directories.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use contentmart_catalog::{ContentFile, ContentPackage, Facet};
use contentmart_core::{DomainError, DomainResult};

use crate::error::StorageError;
use crate::provider::FileStorageProvider;

/// Path segment for an order slot the package has no value for.
pub const MISSING_SEGMENT: &str = "-";

/// A file as it arrives with an upload. The content is read exactly once.
pub struct FileUpload {
    pub name: String,
    pub is_preview: bool,
    pub content: Box<dyn Read + Send>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, content: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            is_preview: false,
            content: Box::new(content),
        }
    }

    pub fn from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(content.into()))
    }

    /// Mark the file as a freely downloadable preview.
    pub fn preview(mut self) -> Self {
        self.is_preview = true;
        self
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("is_preview", &self.is_preview)
            .finish_non_exhaustive()
    }
}

/// What was written for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub is_preview: bool,
    pub size: u64,
}

/// Places package files under facet-derived directories of a provider.
#[derive(Debug, Clone)]
pub struct FileStorageManager<P> {
    provider: P,
}

impl<P: FileStorageProvider> FileStorageManager<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Directory for a package tagged with `facets`, relative to the root.
    ///
    /// One segment per order slot from 1 up to the highest order present:
    /// `{property_id}_{state_index}` for a filled slot, [`MISSING_SEGMENT`] for a
    /// skipped one. The input order of `facets` is irrelevant. No facets means
    /// the storage root (empty path).
    pub fn directory_path(facets: &[Facet]) -> DomainResult<PathBuf> {
        let Some(max_order) = facets.iter().map(|f| f.order).max() else {
            return Ok(PathBuf::new());
        };

        let mut path = PathBuf::new();
        for order in 1..=max_order {
            let mut in_slot = facets.iter().filter(|f| f.order == order);
            let segment = match (in_slot.next(), in_slot.next()) {
                (None, _) => MISSING_SEGMENT.to_string(),
                (Some(facet), None) => format!("{}_{}", facet.property_id, facet.state_index),
                (Some(a), Some(b)) => {
                    return Err(DomainError::invariant(format!(
                        "properties {} and {} share order {order}",
                        a.property_id, b.property_id
                    )));
                }
            };
            path.push(segment);
        }
        Ok(path)
    }

    /// Write every upload under the package's facet directory.
    ///
    /// Sets `package.path` once every file is written. Names are validated,
    /// and existing files at the targets refused with `Conflict`, before the
    /// first write. The provider never overwrites, so a target taken after
    /// that check is a `Conflict` too. On any failure the files this call
    /// already wrote are removed and `package` is left as it was.
    pub fn store(
        &self,
        package: &mut ContentPackage,
        facets: &[Facet],
        uploads: Vec<FileUpload>,
    ) -> Result<Vec<StoredFile>, StorageError> {
        let directory = Self::directory_path(facets)?;
        Self::validate_uploads(&uploads)?;

        // Packages with equal facets share a directory.
        if let Some(taken) = uploads
            .iter()
            .find(|u| self.provider.exists(&directory.join(&u.name)))
        {
            return Err(taken_conflict(&directory.join(&taken.name)).into());
        }

        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let path = directory.join(&upload.name);
            let size = match self.provider.write(&path, upload.content) {
                Ok(size) => size,
                Err(e) => {
                    let removed = self.remove(&directory, &stored);
                    warn!(path = %path.display(), error = %e, removed, "package write failed");
                    return Err(match e.kind() {
                        io::ErrorKind::AlreadyExists => taken_conflict(&path).into(),
                        _ => e.into(),
                    });
                }
            };
            debug!(path = %path.display(), size, "package file written");
            stored.push(StoredFile {
                name: upload.name,
                is_preview: upload.is_preview,
                size,
            });
        }

        package.path = directory;
        info!(
            package_id = %package.id,
            directory = %package.path.display(),
            files = stored.len(),
            "package stored"
        );
        Ok(stored)
    }

    /// Names must be plain file names, unique within the upload.
    pub fn validate_uploads(uploads: &[FileUpload]) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for upload in uploads {
            validate_file_name(&upload.name)?;
            if !seen.insert(upload.name.as_str()) {
                return Err(DomainError::validation(format!(
                    "file {:?} appears twice in one package",
                    upload.name
                )));
            }
        }
        Ok(())
    }

    /// Open one of a package's files for reading.
    pub fn file_stream(
        &self,
        package: &ContentPackage,
        file: &ContentFile,
    ) -> Result<Box<dyn Read + Send>, StorageError> {
        if file.package_id != package.id {
            return Err(DomainError::invariant(format!(
                "file {} belongs to package {}, not {}",
                file.id, file.package_id, package.id
            ))
            .into());
        }
        Ok(self.provider.read(&Self::file_path(package, &file.name))?)
    }

    /// Best-effort removal of files a successful [`store`](Self::store)
    /// wrote for `package`; returns how many were deleted.
    pub fn discard(&self, package: &ContentPackage, stored: &[StoredFile]) -> usize {
        self.remove(&package.path, stored)
    }

    fn remove(&self, directory: &Path, stored: &[StoredFile]) -> usize {
        let mut removed = 0;
        for file in stored {
            let path = directory.join(&file.name);
            match self.provider.delete(&path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to discard file"),
            }
        }
        removed
    }

    fn file_path(package: &ContentPackage, name: &str) -> PathBuf {
        package.path.join(name)
    }
}

fn taken_conflict(path: &Path) -> DomainError {
    DomainError::conflict(format!("file already exists at {}", path.display()))
}

/// A stored name must be a single plain path component.
fn validate_file_name(name: &str) -> DomainResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || Path::new(name).is_absolute();
    if invalid {
        return Err(DomainError::validation(format!(
            "invalid file name {name:?}"
        )));
    }
    Ok(())
}
