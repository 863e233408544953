//! Route table: public download, protected upload and delete

use crate::{
    error::AppError,
    handlers::{files, health},
    middleware::auth::bearer_auth_middleware,
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{Method, Uri},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let body_limit = state
        .storage
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let protected = Router::new()
        .route(
            "/upload",
            post(files::upload_file)
                .layer(DefaultBodyLimit::max(body_limit))
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/delete",
            delete(files::delete_file).fallback(handle_method_not_allowed),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    Router::new()
        .route(
            "/health",
            get(health::handle_health).fallback(handle_method_not_allowed),
        )
        .route(
            "/files/:filename",
            get(files::download_file).fallback(handle_method_not_allowed),
        )
        .merge(protected)
        .fallback(handle_not_found)
}

async fn handle_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

async fn handle_method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
