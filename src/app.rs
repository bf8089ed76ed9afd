use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/refresh", post(handlers::refresh))
        .route("/groups/toggle", post(handlers::toggle_group))
        .route("/records/delete", post(handlers::request_delete))
        .route("/records/delete/confirm", post(handlers::confirm_delete))
        .route("/records/delete/cancel", post(handlers::cancel_delete))
        .route("/records/form/open", post(handlers::open_form))
        .route("/records/form/close", post(handlers::close_form))
        .route("/records/form", post(handlers::form_action))
        .route("/api/session", get(handlers::get_session))
        .route("/api/groups", get(handlers::get_groups))
        .with_state(state)
}
