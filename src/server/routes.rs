//! HTTP routes of the QuoteNest server.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `POST /auth/signup`, `POST /auth/signin`: issue a session token (no auth)
//! - `POST /auth/signout`: revoke the caller's token
//! - `GET /me`: current account
//! - `GET|PUT|PATCH|DELETE /documents/{*path}`: one document
//! - `GET /collections/{*path}`: documents directly inside a collection
//!
//! Document routes only accept paths under `users/{uid}` of the caller.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use quote_nest_core::remote::wire::{
    AuthResponse, Credentials, ErrorBody, ListResponse, MeResponse, SetDocumentRequest,
    UpdateFieldRequest,
};
use quote_nest_core::{DocumentPath, DocumentStore, Snapshot, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::tokens::{AuthUser, TokenStore};
use super::users::{UserError, UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserRepository>,
    pub tokens: Arc<TokenStore>,
    pub documents: Arc<dyn DocumentStore>,
}

/// Error response with a JSON `{error, message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error, message)
    }

    fn forbidden(path: &DocumentPath) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("Access to {} is not allowed", path),
        )
    }

    fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!("internal error: {}", e);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.error.to_string(),
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidPath(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_path", e.to_string())
            }
            StoreError::NotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            StoreError::PermissionDenied(_) => {
                ApiError::new(StatusCode::FORBIDDEN, "forbidden", e.to_string())
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::InvalidEmail(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_email", e.to_string())
            }
            UserError::PasswordTooShort => {
                ApiError::new(StatusCode::BAD_REQUEST, "weak_password", e.to_string())
            }
            UserError::EmailTaken(_) => {
                ApiError::new(StatusCode::CONFLICT, "email_taken", e.to_string())
            }
            other => ApiError::internal(other),
        }
    }
}

/// Builds the router with all routes and request tracing.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin));

    let protected_routes = Router::new()
        .route("/auth/signout", post(signout))
        .route("/me", get(me))
        .route(
            "/documents/{*path}",
            get(get_document)
                .put(put_document)
                .patch(patch_document)
                .delete(delete_document),
        )
        .route("/collections/{*path}", get(list_collection))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

// ============================================================================
// Authentication
// ============================================================================

/// Authentication middleware
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return ApiError::unauthorized(
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                )
                .into_response();
            }
        },
        None => {
            return ApiError::unauthorized("missing_auth", "Authorization header required")
                .into_response();
        }
    };

    match state.tokens.validate(token) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => ApiError::unauthorized("invalid_token", "Invalid or expired token").into_response(),
    }
}

/// Requires the path to sit under the caller's own user document.
fn authorize(user: &AuthUser, path: &str) -> Result<DocumentPath, ApiError> {
    let path = DocumentPath::parse(path)?;
    let own = DocumentPath::user(&user.uid)?;
    if path.starts_with(&own) {
        Ok(path)
    } else {
        tracing::warn!(uid = %user.uid, %path, "rejected access outside own documents");
        Err(ApiError::forbidden(&path))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn signup(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state
        .users
        .create(&credentials.email, &credentials.password)
        .await?;
    let token = state.tokens.issue(&user.id, &user.email);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            uid: user.id,
            email: user.email,
            token,
        }),
    ))
}

async fn signin(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .users
        .authenticate(&credentials.email, &credentials.password)
        .await?
        .ok_or_else(|| {
            ApiError::unauthorized("invalid_credentials", "Invalid email or password")
        })?;

    let token = state.tokens.issue(&user.id, &user.email);
    tracing::info!(uid = %user.id, "signed in");

    Ok(Json(AuthResponse {
        uid: user.id,
        email: user.email,
        token,
    }))
}

async fn signout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> StatusCode {
    state.tokens.revoke(&user.token);
    tracing::info!(uid = %user.uid, "signed out");
    StatusCode::NO_CONTENT
}

async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        uid: user.uid,
        email: user.email,
    })
}

async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    let path = authorize(&user, &path)?;
    Ok(Json(state.documents.get_document(&path).await?))
}

async fn put_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
    Json(body): Json<SetDocumentRequest>,
) -> Result<StatusCode, ApiError> {
    let path = authorize(&user, &path)?;
    state.documents.set_document(&path, body.fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patch_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
    Json(body): Json<UpdateFieldRequest>,
) -> Result<StatusCode, ApiError> {
    let path = authorize(&user, &path)?;
    state
        .documents
        .update_field(&path, &body.field, body.mutation)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    let path = authorize(&user, &path)?;
    state.documents.delete_document(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_collection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
) -> Result<Json<ListResponse>, ApiError> {
    let path = authorize(&user, &path)?;
    let documents = state.documents.list_documents(&path).await?;
    Ok(Json(ListResponse { documents }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::db::init_db;
    use axum::body::{to_bytes, Body};
    use axum::http::Method;
    use quote_nest_core::MemoryStore;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        documents: Arc<MemoryStore>,
        _temp: TempDir,
    }

    async fn test_app() -> TestApp {
        let temp = TempDir::new().unwrap();
        let pool = init_db(&temp.path().join("users.db")).await.unwrap();
        let documents = Arc::new(MemoryStore::new());
        let state = AppState {
            users: Arc::new(UserRepository::new(pool)),
            tokens: Arc::new(TokenStore::new(Duration::from_secs(600))),
            documents: documents.clone(),
        };
        TestApp {
            router: router(state),
            documents,
            _temp: temp,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = axum::http::Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn signup(&self, email: &str) -> (String, String) {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/auth/signup",
                    None,
                    Some(json!({"email": email, "password": "hunter22"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            (
                body["uid"].as_str().unwrap().to_string(),
                body["token"].as_str().unwrap().to_string(),
            )
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_signup_signin_me() {
        let app = test_app().await;
        let (uid, _) = app.signup("alice@example.com").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/signin",
                None,
                Some(json!({"email": "alice@example.com", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = app.send(Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"uid": uid, "email": "alice@example.com"}));
    }

    #[tokio::test]
    async fn test_signup_errors() {
        let app = test_app().await;
        app.signup("alice@example.com").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "alice@example.com", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "email_taken");

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "bob@example.com", "password": "123"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "not-an-email", "password": "hunter22"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let app = test_app().await;
        app.signup("alice@example.com").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/signin",
                None,
                Some(json!({"email": "alice@example.com", "password": "nope-nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_missing_or_bad_auth() {
        let app = test_app().await;

        let (status, body) = app.send(Method::GET, "/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");

        let (status, body) = app.send(Method::GET, "/me", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_signout_revokes_token() {
        let app = test_app().await;
        let (_, token) = app.signup("alice@example.com").await;

        let (status, _) = app
            .send(Method::POST, "/auth/signout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send(Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_document_roundtrip_and_mutations() {
        let app = test_app().await;
        let (uid, token) = app.signup("alice@example.com").await;
        let doc = format!("/documents/users/{}", uid);

        let (status, body) = app.send(Method::GET, &doc, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exists"], false);

        let (status, _) = app
            .send(
                Method::PATCH,
                &doc,
                Some(&token),
                Some(json!({"field": "quotes", "mutation": {"op": "append_if_absent", "value": 1}})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .send(
                Method::PUT,
                &doc,
                Some(&token),
                Some(json!({"fields": {"quotes": [{"id": "1"}]}})),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        for mutation in [
            json!({"op": "append_if_absent", "value": {"id": "2"}}),
            json!({"op": "append_if_absent", "value": {"id": "2"}}),
            json!({"op": "remove_exact", "value": {"id": "1"}}),
        ] {
            let (status, _) = app
                .send(
                    Method::PATCH,
                    &doc,
                    Some(&token),
                    Some(json!({"field": "quotes", "mutation": mutation})),
                )
                .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (_, body) = app.send(Method::GET, &doc, Some(&token), None).await;
        assert_eq!(
            body,
            json!({"exists": true, "fields": {"quotes": [{"id": "2"}]}})
        );

        let (status, _) = app.send(Method::DELETE, &doc, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let path = DocumentPath::user(&uid).unwrap();
        assert!(app.documents.document(&path).is_none());
    }

    #[tokio::test]
    async fn test_collection_listing() {
        let app = test_app().await;
        let (uid, token) = app.signup("alice@example.com").await;

        let quote = format!("/documents/users/{}/quotes/7", uid);
        app.send(
            Method::PUT,
            &quote,
            Some(&token),
            Some(json!({"fields": {"text": "A", "author": "X"}})),
        )
        .await;

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/collections/users/{}/quotes", uid),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"documents": [{"id": "7", "fields": {"text": "A", "author": "X"}}]})
        );
    }

    #[tokio::test]
    async fn test_other_users_documents_forbidden() {
        let app = test_app().await;
        let (alice, _) = app.signup("alice@example.com").await;
        let (_, bob_token) = app.signup("bob@example.com").await;

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/documents/users/{}", alice),
                Some(&bob_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, _) = app
            .send(Method::GET, "/collections/users", Some(&bob_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(app.documents.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let app = test_app().await;
        let (uid, token) = app.signup("alice@example.com").await;

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/documents/users/{}/quotes/..", uid),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_path");
    }
}
