use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{error::AppError, AppState};

pub const SESSION_EXPIRED: &str = "Session expired. Please try again";

/// Lets the request through only when its session is authenticated, exposing
/// the session user to handlers as a `CurrentUser` extension.
pub async fn require_auth<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let current_user = state
        .sessions
        .load(request.headers())
        .await?
        .and_then(|session| session.data.current_user());

    let Some(current_user) = current_user else {
        debug!(path = %request.uri().path(), "rejecting unauthenticated request");
        return Err(AppError::Unauthorized(SESSION_EXPIRED.to_string()));
    };

    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}
