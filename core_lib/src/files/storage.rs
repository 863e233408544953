use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::models::StoredFile;
use crate::error::{AppError, Result};

/// Flat directory of uploaded files.
///
/// Names are never reused: every upload gets a fresh v4 UUID, so writers do
/// not need to coordinate. Deletes and downloads of the same name are not
/// serialized against each other.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_file_size: u64,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub async fn ensure_root(&self) -> Result<()> {
        async_fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Opens a new file for an upload. The caller streams chunks through the
    /// returned writer and must either `finish` or `abort` it.
    pub async fn create(&self, original_name: &str, mimetype: &str) -> Result<FileWriter> {
        self.ensure_root().await?;

        let filename = generate_name(original_name);
        let path = self.root.join(&filename);

        let file = async_fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| map_io_error(e, &filename))?;

        tracing::debug!(filename = %filename, original_name = %original_name, "created upload target");

        Ok(FileWriter {
            file,
            stored: StoredFile {
                filename,
                original_name: original_name.to_string(),
                size: 0,
                mimetype: mimetype.to_string(),
                path,
            },
            limit: self.max_file_size,
            settled: false,
        })
    }

    pub async fn store(&self, original_name: &str, mimetype: &str, data: &[u8]) -> Result<StoredFile> {
        let mut writer = self.create(original_name, mimetype).await?;
        if let Err(e) = writer.write(data).await {
            writer.abort().await;
            return Err(e);
        }
        writer.finish().await
    }

    pub async fn stat(&self, name: &str) -> Result<u64> {
        let path = self.resolve(name)?;
        let metadata = async_fs::metadata(&path)
            .await
            .map_err(|e| map_io_error(e, name))?;

        if !metadata.is_file() {
            return Err(AppError::FileNotFound(name.to_string()));
        }

        Ok(metadata.len())
    }

    /// Removes the file and returns the size it had.
    pub async fn delete(&self, name: &str) -> Result<u64> {
        let size = self.stat(name).await?;
        let path = self.resolve(name)?;

        async_fs::remove_file(&path)
            .await
            .map_err(|e| map_io_error(e, name))?;

        tracing::info!(filename = %name, size, "deleted file");
        Ok(size)
    }

    pub async fn open(&self, name: &str) -> Result<(async_fs::File, u64)> {
        let size = self.stat(name).await?;
        let path = self.resolve(name)?;

        let file = async_fs::File::open(&path)
            .await
            .map_err(|e| map_io_error(e, name))?;

        Ok((file, size))
    }

    /// Joins a single caller-supplied segment onto the root.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Streams one upload to disk. Dropping the writer before `finish` succeeds
/// removes the partial file, so a cancelled request leaves nothing behind.
pub struct FileWriter {
    file: async_fs::File,
    stored: StoredFile,
    limit: u64,
    settled: bool,
}

impl FileWriter {
    pub fn filename(&self) -> &str {
        &self.stored.filename
    }

    pub fn size(&self) -> u64 {
        self.stored.size
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        let size = self.stored.size + chunk.len() as u64;
        if size > self.limit {
            return Err(AppError::UploadTooLarge { limit: self.limit });
        }

        self.file.write_all(chunk).await?;
        self.stored.size = size;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile> {
        let synced = flush_and_sync(&mut self.file).await;
        if let Err(e) = synced {
            self.abort().await;
            return Err(e.into());
        }
        self.settled = true;

        tracing::info!(
            filename = %self.stored.filename,
            original_name = %self.stored.original_name,
            size = self.stored.size,
            mimetype = %self.stored.mimetype,
            "stored file"
        );

        Ok(self.stored.clone())
    }

    /// Drops the partially written file.
    pub async fn abort(mut self) {
        self.settled = true;
        if let Err(e) = async_fs::remove_file(&self.stored.path).await {
            warn_partial_left(&self.stored.path, &e);
        }
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        tracing::debug!(filename = %self.stored.filename, "upload dropped before finish");
        if let Err(e) = std::fs::remove_file(&self.stored.path) {
            warn_partial_left(&self.stored.path, &e);
        }
    }
}

fn warn_partial_left(path: &Path, err: &std::io::Error) {
    if err.kind() != ErrorKind::NotFound {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to remove partial upload"
        );
    }
}

async fn flush_and_sync(file: &mut async_fs::File) -> std::io::Result<()> {
    file.flush().await?;
    file.sync_all().await
}

/// `<uuid v4><.ext>`, keeping the original extension's case.
pub fn generate_name(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match Path::new(original_name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if is_safe_extension(ext) => format!("{}.{}", id, ext),
        _ => id.to_string(),
    }
}

/// False for extensions that would leave the generated name unreachable
/// through the delete or download routes.
fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.trim() == ext && !ext.contains(['\\', '\0'])
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(AppError::InvalidParameter(format!(
            "Invalid filename: {}",
            name
        )));
    }
    Ok(())
}

fn map_io_error(err: std::io::Error, name: &str) -> AppError {
    match err.kind() {
        ErrorKind::NotFound => AppError::FileNotFound(name.to_string()),
        ErrorKind::PermissionDenied => AppError::PermissionDenied(name.to_string()),
        _ => err.into(),
    }
}
