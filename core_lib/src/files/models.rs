use serde::Serialize;
use std::path::PathBuf;

/// A file persisted under the storage root, addressed only by its generated name.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub filename: String,
    pub originalname: String,
    pub size: u64,
    pub mimetype: String,
}

impl UploadResponse {
    pub fn new(file: StoredFile, file_path: String) -> Self {
        Self {
            file_path,
            filename: file.filename,
            originalname: file.original_name,
            size: file.size,
            mimetype: file.mimetype,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub filename: String,
    pub size: u64,
}
