use std::collections::HashSet;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct UploadValidationConfig {
    pub field_name: String,
    pub max_files: usize,
    pub allowed_content_types: HashSet<String>,
}

impl From<&StorageConfig> for UploadValidationConfig {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            field_name: FILE_FIELD.to_string(),
            max_files: storage.max_files,
            allowed_content_types: storage
                .allowed_mime_types
                .iter()
                .map(|mime| mime.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Default for UploadValidationConfig {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

/// Checks applied to the parts of an upload before and after they are written.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    config: UploadValidationConfig,
}

impl UploadValidator {
    pub fn new(config: UploadValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(UploadValidationConfig::default())
    }

    pub fn check_field(&self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) if name == self.config.field_name => Ok(()),
            other => Err(AppError::UnexpectedField(other.unwrap_or("").to_string())),
        }
    }

    /// `accepted` is the number of files already taken from this request.
    pub fn check_count(&self, accepted: usize) -> Result<()> {
        if accepted >= self.config.max_files {
            return Err(AppError::TooManyFiles {
                max: self.config.max_files,
            });
        }
        Ok(())
    }

    /// Matches on the mime essence, so parameters such as `charset` are
    /// ignored. Returns the lowercased essence that was accepted.
    pub fn check_content_type(&self, content_type: &str) -> Result<String> {
        let essence = content_type
            .parse::<mime::Mime>()
            .map(|mime| mime.essence_str().to_ascii_lowercase())
            .map_err(|_| AppError::UnsupportedFileType(content_type.to_string()))?;

        if !self.config.allowed_content_types.contains(&essence) {
            return Err(AppError::UnsupportedFileType(content_type.to_string()));
        }
        Ok(essence)
    }

    pub fn require_file<T>(&self, file: Option<T>) -> Result<T> {
        file.ok_or(AppError::NoFileUploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_field() {
        let validator = UploadValidator::with_default_config();

        assert!(validator.check_field(Some("file")).is_ok());
        assert!(matches!(
            validator.check_field(Some("avatar")),
            Err(AppError::UnexpectedField(name)) if name == "avatar"
        ));
        assert!(matches!(
            validator.check_field(None),
            Err(AppError::UnexpectedField(_))
        ));
    }

    #[test]
    fn test_check_count() {
        let validator = UploadValidator::with_default_config();

        assert!(validator.check_count(0).is_ok());
        assert!(matches!(
            validator.check_count(1),
            Err(AppError::TooManyFiles { max: 1 })
        ));
    }

    #[test]
    fn test_check_content_type() {
        let validator = UploadValidator::with_default_config();

        for allowed in crate::config::DEFAULT_ALLOWED_MIME_TYPES {
            assert!(validator.check_content_type(allowed).is_ok(), "{}", allowed);
        }

        assert_eq!(
            validator.check_content_type("text/plain; charset=utf-8").unwrap(),
            "text/plain"
        );
        assert_eq!(validator.check_content_type("IMAGE/PNG").unwrap(), "image/png");

        assert!(matches!(
            validator.check_content_type("application/x-msdownload"),
            Err(AppError::UnsupportedFileType(_))
        ));
        assert!(validator.check_content_type("image/svg+xml").is_err());
        assert!(validator.check_content_type("application/octet-stream").is_err());
        assert!(validator.check_content_type("not a mime").is_err());
    }

    #[test]
    fn test_require_file() {
        let validator = UploadValidator::with_default_config();

        assert_eq!(validator.require_file(Some(7)).unwrap(), 7);
        assert!(matches!(
            validator.require_file::<u8>(None),
            Err(AppError::NoFileUploaded)
        ));
    }

    #[test]
    fn test_custom_limits() {
        let validator = UploadValidator::new(UploadValidationConfig {
            field_name: "document".to_string(),
            max_files: 3,
            allowed_content_types: ["application/pdf".to_string()].into_iter().collect(),
        });

        assert!(validator.check_field(Some("document")).is_ok());
        assert!(validator.check_field(Some("file")).is_err());
        assert!(validator.check_count(2).is_ok());
        assert!(validator.check_count(3).is_err());
        assert!(validator.check_content_type("image/png").is_err());
    }
}
