mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, ResponseTemplate,
};

use common::{
    body_json, body_text, campaign_row, cookie_pair, dynamic_route_row, location, set_cookie,
    TestApp, ADMIN_TOKEN, BASE_URL,
};

fn push_request_row(id: Uuid, status: &str, reason: Option<&str>) -> Value {
    json!({
        "id": id,
        "campaign_id": Uuid::new_v4(),
        "message": "Double stamps this weekend",
        "status": status,
        "rejection_reason": reason,
        "approved_at": "2024-06-02T12:00:00Z",
        "created_at": "2024-06-01T09:30:00Z"
    })
}

#[tokio::test]
async fn admin_api_requires_credentials() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/admin/push-requests", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/push-requests")
        .header(header::AUTHORIZATION, "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/admin/dynamic-routes", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_pages_send_browsers_to_login() {
    let app = TestApp::spawn().await;

    for uri in ["/admin", "/admin/clients"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response).as_deref(), Some("/admin/login"));
    }
}

#[tokio::test]
async fn admin_login_form_opens_the_admin_area() {
    let app = TestApp::spawn().await;
    app.mock_rows("clients", ("order", "name.asc"), json!([]))
        .await;

    let wrong = app.post_form("/admin/login", "token=guess", None).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&wrong).is_none());

    let login = app
        .post_form("/admin/login", &format!("token={}", ADMIN_TOKEN), None)
        .await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login).as_deref(), Some("/admin/clients"));
    let cookie = cookie_pair(&set_cookie(&login).expect("session cookie"));

    let clients = app.get("/admin/clients", Some(&cookie)).await;
    assert_eq!(clients.status(), StatusCode::OK);
    assert!(body_text(clients).await.contains("Clients"));
}

#[tokio::test]
async fn lists_recent_push_requests() {
    let app = TestApp::spawn().await;
    let campaign_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/push_requests"))
        .and(query_param("campaign_id", format!("eq.{}", campaign_id)))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            push_request_row(Uuid::new_v4(), "pending", None)
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "GET",
            &format!("/api/admin/push-requests?campaignId={}", campaign_id),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["requests"].as_array().unwrap().len(), 1);
    assert_eq!(body["requests"][0]["status"], "pending");
}

#[tokio::test]
async fn rejecting_overwrites_any_prior_decision() {
    let app = TestApp::spawn().await;
    let id = Uuid::new_v4();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/push_requests"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(
            json!({"status": "rejected", "rejection_reason": "Off-brand"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            push_request_row(id, "rejected", Some("Off-brand"))
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            &format!("/api/admin/push-requests/{}/reject", id),
            Some(json!({"reason": "Off-brand"})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    let requests = app.server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|request| request.method.to_string() == "PATCH")
        .unwrap();
    // Only the id filters the update, whatever the current status is
    assert!(patch.url.query_pairs().all(|(key, _)| key != "status"));
    let sent: Value = serde_json::from_slice(&patch.body).unwrap();
    assert!(sent["approved_at"].is_string());
}

#[tokio::test]
async fn reject_without_body_clears_reason() {
    let app = TestApp::spawn().await;
    let id = Uuid::new_v4();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/push_requests"))
        .and(body_partial_json(
            json!({"status": "rejected", "rejection_reason": null}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            push_request_row(id, "rejected", None)
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request("POST", &format!("/api/admin/push-requests/{}/reject", id), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reject_reason_is_read_whatever_the_content_type() {
    for content_type in [None, Some("text/plain")] {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/push_requests"))
            .and(body_partial_json(
                json!({"status": "rejected", "rejection_reason": "Off-brand"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                push_request_row(id, "rejected", Some("Off-brand"))
            ])))
            .expect(1)
            .mount(&app.server)
            .await;

        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/admin/push-requests/{}/reject", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .send(builder.body(Body::from(r#"{"reason":"Off-brand"}"#)).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::OK, "{content_type:?}");
    }
}

#[tokio::test]
async fn malformed_reject_body_is_refused() {
    let app = TestApp::spawn().await;

    for body in [json!({"reason": 42}), json!("Off-brand")] {
        let response = app
            .admin_request(
                "POST",
                &format!("/api/admin/push-requests/{}/reject", Uuid::new_v4()),
                Some(body),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    let requests = app.server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn reject_reports_data_api_failure() {
    let app = TestApp::spawn().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/push_requests"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            &format!("/api/admin/push-requests/{}/reject", Uuid::new_v4()),
            Some(json!({})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn reject_unknown_request_is_not_found() {
    let app = TestApp::spawn().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/push_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            &format!("/api/admin/push-requests/{}/reject", Uuid::new_v4()),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creates_dynamic_route_with_link() {
    let app = TestApp::spawn().await;
    app.mock_rows(
        "campaigns",
        ("slug", "eq.summer-promo"),
        json!([campaign_row(Uuid::new_v4(), "summer-promo")]),
    )
    .await;
    app.mock_rows("dynamic_routes", ("code", "eq.SUMMER"), json!([]))
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/dynamic_routes"))
        .and(body_partial_json(
            json!({"code": "SUMMER", "target_slug": "summer-promo", "is_active": true}),
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            dynamic_route_row("SUMMER", "summer-promo", true)
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            "/api/admin/dynamic-routes",
            Some(json!({"code": " summer ", "target_slug": "summer-promo"})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "SUMMER");
    assert_eq!(body["link"], format!("{}/d/SUMMER", BASE_URL));
}

#[tokio::test]
async fn dynamic_route_needs_active_campaign() {
    let app = TestApp::spawn().await;
    app.mock_rows("campaigns", ("slug", "eq.missing"), json!([]))
        .await;

    let response = app
        .admin_request(
            "POST",
            "/api/admin/dynamic-routes",
            Some(json!({"target_slug": "missing"})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_dynamic_route_code_is_rejected() {
    let app = TestApp::spawn().await;
    app.mock_rows(
        "campaigns",
        ("slug", "eq.summer-promo"),
        json!([campaign_row(Uuid::new_v4(), "summer-promo")]),
    )
    .await;
    app.mock_rows(
        "dynamic_routes",
        ("code", "eq.ABC123"),
        json!([dynamic_route_row("ABC123", "summer-promo", true)]),
    )
    .await;

    let response = app
        .admin_request(
            "POST",
            "/api/admin/dynamic-routes",
            Some(json!({"code": "abc123", "target_slug": "summer-promo"})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("already in use"));
}

#[tokio::test]
async fn dynamic_route_qr_codes() {
    let app = TestApp::spawn().await;
    app.mock_rows(
        "dynamic_routes",
        ("code", "eq.ABC123"),
        json!([dynamic_route_row("ABC123", "summer-promo", true)]),
    )
    .await;

    let svg = app
        .admin_request("GET", "/admin/dynamic-routes/abc123/qr.svg", None)
        .await;
    assert_eq!(svg.status(), StatusCode::OK);
    assert_eq!(svg.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert!(body_text(svg).await.contains("<svg"));

    let png = app
        .admin_request("GET", "/admin/dynamic-routes/abc123/qr.png", None)
        .await;
    assert_eq!(png.status(), StatusCode::OK);
    assert_eq!(png.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn automation_trigger_is_validated() {
    let app = TestApp::spawn().await;

    let response = app
        .admin_request(
            "POST",
            &format!("/api/admin/campaigns/{}/automations", Uuid::new_v4()),
            Some(json!({
                "name": "Win back",
                "trigger": {"type": "inactivity", "days": 0},
                "message": "We miss you"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_client_removes_it_by_id() {
    let app = TestApp::spawn().await;
    let id = Uuid::new_v4();
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([common::client_row(id)])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request("POST", &format!("/admin/clients/{}/delete", id), None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/admin/clients"));
}

#[tokio::test]
async fn deleting_an_unknown_client_is_not_found() {
    let app = TestApp::spawn().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            &format!("/admin/clients/{}/delete", Uuid::new_v4()),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_delete_failure_is_generic() {
    let app = TestApp::spawn().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "foreign key violation"})),
        )
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "POST",
            &format!("/admin/clients/{}/delete", Uuid::new_v4()),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("foreign key"));
}

#[tokio::test]
async fn invalid_campaign_config_is_refused() {
    let app = TestApp::spawn().await;

    let response = app
        .admin_request(
            "PUT",
            &format!("/api/admin/campaigns/{}/config", Uuid::new_v4()),
            Some(json!({"background_color": "red"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .admin_request(
            "POST",
            &format!("/api/admin/clients/{}/campaigns", Uuid::new_v4()),
            Some(json!({
                "name": "Summer Promo",
                "slug": "summer-promo",
                "config": {"stamps_required": 0}
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let requests = app.server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn campaign_config_is_replaced() {
    let app = TestApp::spawn().await;
    let client_id = Uuid::new_v4();
    let mut row = campaign_row(client_id, "summer-promo");
    let id = row["id"].as_str().unwrap().to_string();
    row["config"] = json!({"program": "points", "cooldown_minutes": 30});
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/campaigns"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(
            json!({"config": {"program": "points", "cooldown_minutes": 30}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .admin_request(
            "PUT",
            &format!("/api/admin/campaigns/{}/config", id),
            Some(json!({"program": "points", "cooldown_minutes": 30})),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["config"]["program"], "points");
}
