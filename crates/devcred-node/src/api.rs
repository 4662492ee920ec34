//! HTTP API server for the devcred node.
//!
//! `GET /credential` verifies the bearer token and issues a credential to its
//! signer. `GET /health` and `GET /login` support operators and holders.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use devcred_credentials::{CredentialError, VerifiableCredential};
use devcred_jwt::JwtError;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::NodeState;

// --- Response types ---

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub credential: VerifiableCredential,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

/// Every rejection of a credential request. All are answered with 401.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authorization header required")]
    MissingAuthorization,

    #[error("Malformed Authorization header. Expected: Bearer TOKEN_HERE")]
    MalformedAuthorization,

    #[error(transparent)]
    Verification(#[from] JwtError),

    #[error(transparent)]
    Issuance(#[from] CredentialError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            errors: vec![self.to_string()],
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// The token after the first `Bearer `, up to any later one.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthorization)?
        .to_str()
        .map_err(|_| ApiError::MalformedAuthorization)?;

    value
        .split("Bearer ")
        .nth(1)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MalformedAuthorization)
}

// --- Handlers ---

async fn handle_health() -> StatusCode {
    StatusCode::OK
}

async fn handle_login(State(state): State<Arc<NodeState>>) -> Response {
    match &state.login_url {
        Some(url) => Html(format!("<a href=\"{}\">Login with GitHub</a>", url)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_credential(
    State(state): State<Arc<NodeState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    let result = issue_for_bearer(&state, &headers).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "credential request rejected");
    }
    let credential = result?;
    Ok((StatusCode::CREATED, Json(CredentialResponse { credential })))
}

async fn issue_for_bearer(
    state: &NodeState,
    headers: &HeaderMap,
) -> Result<VerifiableCredential, ApiError> {
    let token = bearer_token(headers)?;
    let identity = state.verifier.verify(token).await?;
    Ok(state.issuer.issue(&identity).await?)
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/login", get(handle_login))
        .route("/credential", get(handle_credential))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
