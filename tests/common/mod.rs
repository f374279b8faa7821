#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use passdesk::api::middleware::session::{session_layer, AppState};
use passdesk::config::Config;
use passdesk::db::DataClient;

pub const ADMIN_TOKEN: &str = "platform-admin-token";
pub const BASE_URL: &str = "https://passes.example.com";

/// The application wired to a mock data API and an in-memory session store
pub struct TestApp {
    pub server: MockServer,
    router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;

        let config = Config {
            base_url: BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            supabase_url: server.uri(),
            supabase_anon_key: Secret::new("anon-key".to_string()),
            database_url: "postgres://unused".to_string(),
            admin_token: Secret::new(ADMIN_TOKEN.to_string()),
            secure_cookies: true,
        };
        let data = DataClient::new(&config.supabase_url, config.supabase_anon_key.clone())
            .expect("data client");
        let state = AppState { data, config };

        let router = passdesk::api::router(state.clone())
            .layer(session_layer(MemoryStore::default(), true))
            .with_state(state);

        Self { server, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn admin_request(&self, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    /// Answers a filtered GET on `table` with `rows`
    pub async fn mock_rows(&self, table: &str, filter: (&str, &str), rows: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", table)))
            .and(query_param(filter.0, filter.1))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.server)
            .await;
    }
}

pub fn client_row(id: Uuid) -> Value {
    json!({
        "id": id,
        "slug": "acme",
        "name": "Acme Coffee",
        "admin_pin": "1111",
        "staff_pin": "2222",
        "created_at": "2024-05-01T08:00:00Z"
    })
}

pub fn campaign_row(client_id: Uuid, slug: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "client_id": client_id,
        "name": "Summer Promo",
        "slug": slug,
        "config": {"program": "stamps", "stamps_required": 10},
        "is_active": true,
        "created_at": "2024-05-02T08:00:00Z"
    })
}

pub fn dynamic_route_row(code: &str, target_slug: &str, is_active: bool) -> Value {
    json!({
        "code": code,
        "target_slug": target_slug,
        "is_active": is_active,
        "created_at": "2024-05-03T08:00:00Z"
    })
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

/// The `name=value` part of a Set-Cookie header, ready to send back
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
