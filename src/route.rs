use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::{handler::*, middleware::require_auth, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/dashboard", get(dashboard_page))
        .route("/create-item", post(create_item))
        .route("/read-item", get(read_item))
        .route("/edit-item", post(edit_item))
        .route("/delete-item", post(delete_item))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .route("/", get(health_checker_handler))
        .route("/register", get(register_page))
        .route("/register-user", post(register_user))
        .route("/login", get(login_page))
        .route("/login-user", post(login_user))
        .route("/logout", post(logout))
        .route("/browser.js", get(client_script))
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http());

    match cors_layer(app_state.config.cors_origin.as_deref()) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

// Cross-origin AJAX callers are only allowed when an origin is configured
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = match origin?.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(err) => {
            warn!("ignoring invalid CORS_ORIGIN: {err}");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_credentials(true)
            .allow_headers([ACCEPT, CONTENT_TYPE]),
    )
}
