use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::complaints;
use crate::middleware::{require_admin, require_session};
use crate::pages;

/// Assembles the full HTTP surface.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(pages::sign))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/submit-complaint", post(complaints::submit_complaint))
        .route("/get-complaints", get(complaints::get_complaints))
        .route("/update-status/{id}", post(complaints::update_status))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route("/home", get(pages::home))
        .route("/dashboard", get(pages::dashboard))
        .route("/report", get(pages::report))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin", get(pages::admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .nest_service("/uploads", ServeDir::new(state.storage.dir()))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}
