//! Filesystem backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use keepsake_core::{BackendLabel, CacheEntry, Raw, ResourceAddress};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::{Backend, BackendResult, DeleteStatus};

const ENTRY_EXTENSION: &str = "entry";
const TMP_EXTENSION: &str = "tmp";

/// Disk-based cache backend storing one file per address.
///
/// File names are the hex SHA-256 of the address, so arbitrary URLs map to
/// safe, fixed-length names. Writes land in a temporary sibling first and
/// are renamed over the entry, which keeps half-written payloads invisible
/// to readers. The file's modification time is the entry timestamp.
///
/// ```no_run
/// use keepsake_backend::FsBackend;
///
/// let backend = FsBackend::builder()
///     .path("/var/cache/myapp/api")
///     .build()?;
/// # Ok::<(), std::io::Error>(())
/// ```
///
/// Cloning is cheap; clones share the directory and the temp-file counter.
#[derive(Clone, Debug)]
pub struct FsBackend {
    inner: Arc<FsBackendInner>,
}

#[derive(Debug)]
struct FsBackendInner {
    root: PathBuf,
    label: BackendLabel,
    tmp_counter: AtomicU64,
}

impl FsBackend {
    /// Starts building a new backend.
    pub fn builder() -> FsBackendBuilder {
        FsBackendBuilder::default()
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Path of the entry file for `address`.
    pub fn entry_path(&self, address: &ResourceAddress) -> PathBuf {
        let digest = Sha256::digest(address.as_str().as_bytes());
        self.inner
            .root
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION))
    }

    fn tmp_path(&self, entry_path: &Path) -> PathBuf {
        let n = self.inner.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = entry_path.as_os_str().to_owned();
        name.push(format!(".{}.{}.{}", std::process::id(), n, TMP_EXTENSION));
        PathBuf::from(name)
    }
}

/// Builder for [`FsBackend`].
#[derive(Debug, Default)]
pub struct FsBackendBuilder {
    path: Option<PathBuf>,
    label: Option<BackendLabel>,
}

impl FsBackendBuilder {
    /// Directory for entry files. Created on [`build`](Self::build) if missing.
    ///
    /// Defaults to `keepsake` inside the system temp directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Identifies this backend in logs and metrics.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Creates the backend.
    ///
    /// Fails if the directory can't be created.
    pub fn build(self) -> std::io::Result<FsBackend> {
        let root = self
            .path
            .unwrap_or_else(|| std::env::temp_dir().join("keepsake"));
        std::fs::create_dir_all(&root)?;

        Ok(FsBackend {
            inner: Arc::new(FsBackendInner {
                root,
                label: self.label.unwrap_or(BackendLabel::FS),
                tmp_counter: AtomicU64::new(0),
            }),
        })
    }
}

#[async_trait]
impl Backend for FsBackend {
    async fn read(&self, address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>> {
        let path = self.entry_path(address);

        // One handle pins one inode, so payload and mtime always match.
        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        let modified = DateTime::<Utc>::from(meta.modified()?);
        let mut data = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
        file.read_to_end(&mut data).await?;

        Ok(Some(CacheEntry::new(Bytes::from(data), modified)))
    }

    async fn write(&self, address: &ResourceAddress, payload: Raw) -> BackendResult<()> {
        let path = self.entry_path(address);
        let tmp = self.tmp_path(&path);

        if let Err(e) = fs::write(&tmp, &payload).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        match fs::remove_file(self.entry_path(address)).await {
            Ok(()) => Ok(DeleteStatus::Deleted(1)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteStatus::Missing),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> BackendResult<u64> {
        let mut removed = 0;
        let mut dir = fs::read_dir(&self.inner.root).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_entry = path
                .extension()
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TMP_EXTENSION);
            if !is_entry || !item.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                        removed += 1;
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    fn label(&self) -> BackendLabel {
        self.inner.label.clone()
    }
}
