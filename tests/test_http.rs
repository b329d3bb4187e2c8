mod helpers;

use autocrm::domain::entities::Role;
use autocrm::infrastructure::http::build_router;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use helpers::*;
use serde_json::{json, Value};
use tower::ServiceExt;

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` pair from the response's session cookie.
fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().trim().to_string()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn sign_in(router: &Router, email: &str) -> String {
    let response = router
        .clone()
        .oneshot(form(
            "/auth/sign-in",
            &format!("email={}&password={}", email, TEST_PASSWORD),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response)
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;
    let response = build_router(app.state.clone())
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_up_sets_cookie_and_redirects_to_portal() {
    let app = setup_test_app().await;
    let router = build_router(app.state.clone());

    let response = router
        .clone()
        .oneshot(form(
            "/auth/sign-up",
            "email=new%40example.com&password=password123&name=New+Customer",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/portal");
    let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(raw.starts_with("autocrm_session="));
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));
    assert!(raw.contains("Path=/"));

    let cookie = session_cookie(&response);
    let me = router
        .clone()
        .oneshot(get("/api/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    assert!(me.headers().get(header::SET_COOKIE).is_some());
    let body = json_body(me).await;
    assert_eq!(body["email"], "new@example.com");
    assert_eq!(body["name"], "New Customer");
    assert_eq!(body["role"], "customer");
}

#[tokio::test]
async fn test_failed_sign_in_redirects_with_error() {
    let app = setup_test_app().await;
    create_test_user(app.db(), "agent@example.com", Role::Agent).await;

    let response = build_router(app.state.clone())
        .oneshot(form(
            "/auth/sign-in",
            "email=agent%40example.com&password=wrongpass1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/auth/sign-in?error=Invalid%20email%20or%20password"
    );
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_staff_sign_in_lands_on_dashboard() {
    let app = setup_test_app().await;
    create_test_user(app.db(), "agent@example.com", Role::Agent).await;

    let response = build_router(app.state.clone())
        .oneshot(form(
            "/auth/sign-in",
            &format!("email=agent%40example.com&password={}", TEST_PASSWORD),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_unauthenticated_requests() {
    let app = setup_test_app().await;
    let router = build_router(app.state.clone());

    let page = router.clone().oneshot(get("/portal", None)).await.unwrap();
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), "/auth/sign-in");

    let api = router
        .clone()
        .oneshot(get("/api/tickets", None))
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(api).await["error"], "Unauthorized");

    let bogus = router
        .clone()
        .oneshot(get("/api/me", Some("autocrm_session=not-a-token")))
        .await
        .unwrap();
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_allow_list() {
    let app = setup_test_app().await;
    create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    create_test_user(app.db(), "agent@example.com", Role::Agent).await;
    let router = build_router(app.state.clone());

    let customer = sign_in(&router, "cust%40example.com").await;
    let dashboard = router
        .clone()
        .oneshot(get("/dashboard", Some(&customer)))
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&dashboard), "/portal");

    let users = router
        .clone()
        .oneshot(get("/api/users", Some(&customer)))
        .await
        .unwrap();
    assert_eq!(users.status(), StatusCode::FORBIDDEN);

    let portal = router
        .clone()
        .oneshot(get("/portal", Some(&customer)))
        .await
        .unwrap();
    assert_eq!(portal.status(), StatusCode::OK);
    assert_eq!(json_body(portal).await["max_active_tickets"], 10);

    let agent = sign_in(&router, "agent%40example.com").await;
    let users = router
        .clone()
        .oneshot(get("/api/users", Some(&agent)))
        .await
        .unwrap();
    assert_eq!(users.status(), StatusCode::FORBIDDEN);

    let dashboard = router
        .clone()
        .oneshot(get("/dashboard", Some(&agent)))
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_token_and_sign_out() {
    let app = setup_test_app().await;
    create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let router = build_router(app.state.clone());

    let cookie = sign_in(&router, "cust%40example.com").await;
    let token = cookie.trim_start_matches("autocrm_session=").to_string();

    let bearer = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(bearer).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sign_out = Request::builder()
        .method(Method::POST)
        .uri("/auth/sign-out")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(sign_out).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/sign-in");

    let after = router
        .clone()
        .oneshot(get("/api/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ticket_api_flow() {
    let app = setup_test_app().await;
    create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    create_test_user(app.db(), "agent@example.com", Role::Agent).await;
    let router = build_router(app.state.clone());
    let customer = sign_in(&router, "cust%40example.com").await;
    let agent = sign_in(&router, "agent%40example.com").await;

    let created = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/tickets",
            &customer,
            json!({"title": "Login broken", "tags": ["login"]}),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let ticket = json_body(created).await;
    let id = ticket["id"].as_str().unwrap().to_string();
    assert_eq!(ticket["customer_email"], "cust@example.com");

    let posted = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/tickets/{}/messages", id),
            &agent,
            json!({"content": "Checking logs", "visibility": "internal", "message_type": "note"}),
        ))
        .await
        .unwrap();
    assert_eq!(posted.status(), StatusCode::CREATED);

    let listed = router
        .clone()
        .oneshot(get(&format!("/api/tickets/{}/messages", id), Some(&customer)))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(json_body(listed).await.as_array().unwrap().len(), 0);

    let filtered = router
        .clone()
        .oneshot(get("/api/tickets?status=open&tags=login", Some(&agent)))
        .await
        .unwrap();
    assert_eq!(filtered.status(), StatusCode::OK);
    let body = json_body(filtered).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["tickets"][0]["id"], id.as_str());

    let bad_filter = router
        .clone()
        .oneshot(get("/api/tickets?status=archived", Some(&agent)))
        .await
        .unwrap();
    assert_eq!(bad_filter.status(), StatusCode::BAD_REQUEST);

    let assign = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/tickets/{}/assign", id),
            &agent,
            json!({"assigned_to": null}),
        ))
        .await
        .unwrap();
    assert_eq!(assign.status(), StatusCode::FORBIDDEN);

    let patch = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/tickets/{}", id),
            &agent,
            json!({"status": "pending", "priority": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(patch.status(), StatusCode::OK);
    let updated = json_body(patch).await;
    assert_eq!(updated["status"], "pending");
    assert_eq!(updated["priority"], "high");

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/tickets/{}", id))
        .header(header::COOKIE, &agent)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
