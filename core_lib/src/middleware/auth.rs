use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Compares the raw `Authorization` header against `Bearer <token>`.
///
/// A missing header is `Unauthorized`. Anything else that does not match
/// byte-for-byte, including a server with no token configured, is
/// `InvalidCredential`.
pub fn authenticate(header: Option<&[u8]>, token: Option<&str>) -> Result<(), AppError> {
    let header = header.ok_or(AppError::Unauthorized)?;
    let token = token.ok_or(AppError::InvalidCredential)?;

    let presented = header
        .strip_prefix(BEARER_PREFIX.as_bytes())
        .ok_or(AppError::InvalidCredential)?;

    if presented != token.as_bytes() {
        return Err(AppError::InvalidCredential);
    }

    Ok(())
}

/// Guards the upload and delete routes. Runs before the body is read, so a
/// rejected upload never reaches storage.
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.as_bytes());

    authenticate(header, state.config.auth.token())?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn test_state(token: Option<&str>) -> AppState {
        let mut config = AppConfig::default();
        config.auth.token = token.map(str::to_string);
        AppState::new(config)
    }

    fn check(header: Option<&str>, token: Option<&str>) -> Result<(), AppError> {
        authenticate(header.map(str::as_bytes), token)
    }

    async fn test_handler() -> &'static str {
        "success"
    }

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route("/protected", get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), bearer_auth_middleware))
            .with_state(state)
    }

    #[test]
    fn test_authenticate() {
        assert!(check(Some("Bearer abc"), Some("abc")).is_ok());

        assert!(matches!(
            check(None, Some("abc")),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            check(Some("Bearer abd"), Some("abc")),
            Err(AppError::InvalidCredential)
        ));
        assert!(matches!(
            check(Some("bearer abc"), Some("abc")),
            Err(AppError::InvalidCredential)
        ));
        assert!(matches!(
            check(Some("Bearer  abc"), Some("abc")),
            Err(AppError::InvalidCredential)
        ));
        assert!(matches!(
            check(Some("abc"), Some("abc")),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn test_authenticate_without_configured_token() {
        assert!(matches!(
            check(Some("Bearer "), None),
            Err(AppError::InvalidCredential)
        ));
        assert!(matches!(check(None, None), Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_bearer_auth_middleware_success() {
        let app = protected_app(test_state(Some("s3cret")));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .header("Authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bearer_auth_middleware_missing_header() {
        let app = protected_app(test_state(Some("s3cret")));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_auth_middleware_wrong_token() {
        let app = protected_app(test_state(Some("s3cret")));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .header("Authorization", "Bearer guess")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_auth_middleware_unconfigured_token() {
        let app = protected_app(test_state(None));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .header("Authorization", "Bearer ")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
