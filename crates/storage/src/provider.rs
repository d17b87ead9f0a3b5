//! Storage collaborators: where package bytes actually live.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

/// Byte store addressed by paths relative to its root.
pub trait FileStorageProvider: Send + Sync {
    /// Persist `source` at `path`, creating parent directories as needed.
    ///
    /// The source is fully consumed and dropped before this returns. Returns the
    /// number of bytes written. Never overwrites: an occupied `path` fails with
    /// `ErrorKind::AlreadyExists`. A failed write leaves nothing at `path`.
    fn write(&self, path: &Path, source: Box<dyn Read + Send>) -> io::Result<u64>;

    /// Open `path` for reading. Missing paths fail with `ErrorKind::NotFound`.
    fn read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    fn exists(&self, path: &Path) -> bool;

    /// `true` if something was removed.
    fn delete(&self, path: &Path) -> io::Result<bool>;
}

impl<S> FileStorageProvider for Arc<S>
where
    S: FileStorageProvider + ?Sized,
{
    fn write(&self, path: &Path, source: Box<dyn Read + Send>) -> io::Result<u64> {
        (**self).write(path, source)
    }

    fn read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        (**self).read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        (**self).delete(path)
    }
}

/// Files on the local disk under a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// The root directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileStorageProvider for LocalFileStorage {
    fn write(&self, path: &Path, mut source: Box<dyn Read + Send>) -> io::Result<u64> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().write(true).create_new(true).open(&full)?;
        let copied = io::copy(&mut source, &mut file).and_then(|written| {
            file.sync_all()?;
            Ok(written)
        });
        drop(source);
        drop(file);

        if copied.is_err() {
            // create_new above makes the partial file ours.
            if let Err(e) = fs::remove_file(&full) {
                warn!(path = %full.display(), error = %e, "failed to remove partial file");
            }
        }
        copied
    }

    fn read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// In-memory byte store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = match self.files.read() {
            Ok(files) => files.keys().cloned().collect(),
            Err(_) => return vec![],
        };
        paths.sort();
        paths
    }

    fn poisoned() -> io::Error {
        io::Error::other("in-memory storage lock poisoned")
    }
}

impl FileStorageProvider for InMemoryFileStorage {
    fn write(&self, path: &Path, mut source: Box<dyn Read + Send>) -> io::Result<u64> {
        let mut content = Vec::new();
        source.read_to_end(&mut content)?;
        drop(source);

        let written = content.len() as u64;
        let mut files = self.files.write().map_err(|_| Self::poisoned())?;
        match files.entry(path.to_path_buf()) {
            Entry::Occupied(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file already stored at {}", path.display()),
            )),
            Entry::Vacant(slot) => {
                slot.insert(content);
                Ok(written)
            }
        }
    }

    fn read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let files = self.files.read().map_err(|_| Self::poisoned())?;
        match files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no stored file at {}", path.display()),
            )),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        let mut files = self.files.write().map_err(|_| Self::poisoned())?;
        Ok(files.remove(path).is_some())
    }
}
