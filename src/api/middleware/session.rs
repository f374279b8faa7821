use axum::extract::FromRef;
use sqlx::PgPool;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::Config;
use crate::db::DataClient;

/// Name of the opaque session id cookie
pub const SESSION_COOKIE_NAME: &str = "passdesk_session";

/// Session keys used in the application. Per-business grants live under
/// `auth_<slug>`, see `services::auth::grant_key`.
pub const SESSION_KEY_PLATFORM_ADMIN: &str = "platform_admin";

/// Creates the PostgreSQL-backed session store
pub async fn create_session_store(pool: PgPool) -> Result<PostgresStore, sqlx::Error> {
    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;
    Ok(session_store)
}

/// Builds the session layer for any store
pub fn session_layer<S: SessionStore + Clone>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)))
}

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub data: DataClient,
    pub config: Config,
}

impl FromRef<AppState> for DataClient {
    fn from_ref(state: &AppState) -> DataClient {
        state.data.clone()
    }
}
