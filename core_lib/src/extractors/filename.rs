//! Filenames taken from the request: the `filename` query parameter and the
//! download path segment

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use std::collections::HashMap;

use crate::error::AppError;

pub const FILENAME_PARAM: &str = "filename";

/// The trimmed, non-empty `filename` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFilename(pub String);

impl RequiredFilename {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let raw = params
            .get(FILENAME_PARAM)
            .ok_or_else(|| AppError::MissingParameter(FILENAME_PARAM.to_string()))?;

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidParameter(format!(
                "Parameter '{}' cannot be empty",
                FILENAME_PARAM
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequiredFilename
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e)))?;

        Self::from_params(&params)
    }
}

/// The `:filename` path segment. Segments that do not decode to UTF-8 are
/// reported as `InvalidParameter` instead of the framework's plain-text
/// rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSegment(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for FileSegment
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(segment) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidParameter(e.body_text()))?;

        Ok(Self(segment))
    }
}
