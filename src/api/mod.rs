// API module - HTTP endpoints

use askama::Template;
use axum::Router;

use middleware::session::AppState;

pub mod auth;
pub mod automations;
pub mod campaigns;
pub mod clients;
pub mod dynamic_routes;
pub mod health;
pub mod logs;
pub mod middleware;
pub mod push_requests;
pub mod redirect;
pub mod tenant;

/// Generic 404 page
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    message: String,
}

impl NotFoundTemplate {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every application route. Session and tracing layers are added by the caller.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(tenant::router())
        .merge(redirect::router())
        .merge(logs::router())
        .merge(clients::router(state.clone()))
        .merge(campaigns::router(state.clone()))
        .merge(push_requests::router(state.clone()))
        .merge(automations::router(state.clone()))
        .merge(dynamic_routes::router(state))
}
