use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;

use crate::{
    error::{AppError, Result},
    extractors::{FileSegment, RequiredFilename},
    files::{DeleteResponse, StoredFile, UploadResponse},
    AppState,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    // A body that is not multipart at all carries no file part.
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e.body_text(), "upload body is not multipart");
        AppError::NoFileUploaded
    })?;

    let mut accepted: Vec<StoredFile> = Vec::new();
    if let Err(e) = receive_files(&state, &mut multipart, &mut accepted).await {
        discard(&state, accepted).await;
        return Err(e);
    }

    let file = state.validator.require_file(accepted.into_iter().next())?;
    let file_path = state.config.public_file_url(&file.filename);

    Ok(Json(UploadResponse::new(file, file_path)))
}

/// Streams every file part to storage. Parts without a filename are plain
/// form fields and are skipped.
async fn receive_files(
    state: &AppState,
    multipart: &mut Multipart,
    accepted: &mut Vec<StoredFile>,
) -> Result<()> {
    let limit = state.storage.max_file_size();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, limit))?
    {
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        state.validator.check_field(field.name())?;
        state.validator.check_count(accepted.len())?;

        let mimetype = state
            .validator
            .check_content_type(field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE))?;

        let stored = write_field(state, field, &original_name, &mimetype).await?;
        accepted.push(stored);
    }

    Ok(())
}

async fn write_field(
    state: &AppState,
    mut field: Field<'_>,
    original_name: &str,
    mimetype: &str,
) -> Result<StoredFile> {
    let limit = state.storage.max_file_size();
    // Dropping the writer, including when the request is cancelled mid-stream,
    // removes the partial file.
    let mut writer = state.storage.create(original_name, mimetype).await?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                writer.abort().await;
                return Err(map_multipart_error(e, limit));
            }
        };

        if let Err(e) = writer.write(&chunk).await {
            writer.abort().await;
            return Err(e);
        }
    }

    writer.finish().await
}

async fn discard(state: &AppState, files: Vec<StoredFile>) {
    for file in files {
        if let Err(e) = state.storage.delete(&file.filename).await {
            tracing::warn!(filename = %file.filename, error = %e, "failed to discard rejected upload");
        }
    }
}

fn map_multipart_error(err: MultipartError, limit: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge { limit }
    } else {
        AppError::BadRequest(err.body_text())
    }
}

pub async fn delete_file(
    State(state): State<AppState>,
    RequiredFilename(filename): RequiredFilename,
) -> Result<Json<DeleteResponse>> {
    let size = state.storage.delete(&filename).await?;

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
        filename,
        size,
    }))
}

pub async fn download_file(
    State(state): State<AppState>,
    FileSegment(filename): FileSegment,
) -> Result<Response> {
    let (file, size) = state.storage.open(&filename).await?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "\\\"")
    );

    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));

    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((StatusCode::OK, headers, body).into_response())
}
