pub mod models;
pub mod storage;
pub mod validation;

pub use models::{DeleteResponse, StoredFile, UploadResponse};
pub use storage::{generate_name, FileStorage, FileWriter};
pub use validation::{UploadValidationConfig, UploadValidator};
