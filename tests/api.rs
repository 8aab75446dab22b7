mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use schoolhub_server::app;
use schoolhub_server::permissions::{ROLE_ADMIN, ROLE_BUSINESS, ROLE_PARENT};
use schoolhub_server::services::identity::{LoginRequest, RegisterRequest};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::TestApp;

fn router(app: &TestApp) -> Router {
    app::router(app.services.clone(), &app.config)
}

async fn token_for(app: &TestApp, email: &str, role: &str) -> String {
    let user = app
        .services
        .identity
        .register(RegisterRequest {
            email: Some(email.into()),
            password: Some("correct horse".into()),
            name: Some("Test User".into()),
        })
        .await
        .unwrap();
    app.services.identity.set_role(&user.id, role).await.unwrap();
    app.services
        .identity
        .login(LoginRequest {
            email: email.into(),
            password: "correct horse".into(),
        })
        .await
        .unwrap()
        .unwrap()
        .token
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(app).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let (app, _) = common::setup().await;
    let (status, _) = send(&app, get("/api/schoolGrades/all", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/schoolGrades/all", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let (app, _) = common::setup().await;
    let token = token_for(&app, "admin@school.test", ROLE_ADMIN).await;
    let request = Request::builder()
        .uri("/api/schoolGrades/all")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Succeeded"], true);
}

#[tokio::test]
async fn put_creates_and_failures_are_still_200() {
    let (app, _) = common::setup().await;
    let token = token_for(&app, "admin@school.test", ROLE_ADMIN).await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/schoolGrades", Some(&token), json!({"Name": "Grade 1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Succeeded"], true);
    assert_eq!(body["Data"]["Name"], "Grade 1");

    let (status, body) = send(&app, get("/api/schoolGrades/missing", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Succeeded"], false);
    assert!(body.get("Data").is_none());
    assert_eq!(
        body["Messages"],
        json!(["School grade with id missing was not found"])
    );
}

#[tokio::test]
async fn failed_create_returns_no_data() {
    let (app, _) = common::setup().await;
    let token = token_for(&app, "admin@school.test", ROLE_ADMIN).await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/learners", Some(&token), json!({"FirstName": "Sipho"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Succeeded"], false);
    assert!(body.get("Data").is_none());

    let (_, page) = send(
        &app,
        get("/api/learners/pagedLearners?pageNr=1&pageSize=10", Some(&token)),
    )
    .await;
    assert_eq!(page["TotalCount"], 0);
}

#[tokio::test]
async fn paged_endpoint_echoes_rejected_paging() {
    let (app, _) = common::setup().await;
    let token = token_for(&app, "admin@school.test", ROLE_ADMIN).await;

    let (status, body) = send(
        &app,
        get("/api/schoolGrades/pagedSchoolGrades?pageNr=2&pageSize=0", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Succeeded"], false);
    assert_eq!(body["PageNr"], 2);
    assert_eq!(body["PageSize"], 0);
    assert_eq!(body["Data"], json!([]));
}

#[tokio::test]
async fn parents_cannot_edit_grades() {
    let (app, _) = common::setup().await;
    let token = token_for(&app, "parent@school.test", ROLE_PARENT).await;

    let (status, _) = send(
        &app,
        json_request("PUT", "/api/schoolGrades", Some(&token), json!({"Name": "Grade 1"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, get("/api/schoolGrades/all", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"], json!([]));
}

#[tokio::test]
async fn existence_checks_are_anonymous() {
    let (app, _) = common::setup().await;
    common::parent(&app.services, "Karabo").await;

    let (status, body) = send(&app, get("/api/parents/exist?email=KARABO@example.com", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"], true);

    let (status, body) = send(&app, get("/api/learners/exist?idNumber=123", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"], false);
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (app, _) = common::setup().await;
    token_for(&app, "someone@school.test", ROLE_PARENT).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"Email": "someone@school.test", "Password": "wrong password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"Email": "someone@school.test", "Password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["Data"]["Token"].as_str().is_some());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (app, _) = common::setup().await;
    let payload = json!({"Email": "dup@school.test", "Password": "long enough", "Name": "Dup"});

    let (_, first) = send(&app, json_request("POST", "/api/auth/register", None, payload.clone())).await;
    assert_eq!(first["Succeeded"], true);
    assert_eq!(first["Data"]["Role"], "parent");

    let (status, second) = send(&app, json_request("POST", "/api/auth/register", None, payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["Succeeded"], false);
    assert_eq!(second["Messages"], json!(["Email already exists"]));
}

#[tokio::test]
async fn business_owner_uploads_listing_images() {
    let (app, _) = common::setup().await;
    let admin = token_for(&app, "admin@school.test", ROLE_ADMIN).await;
    let owner = token_for(&app, "shop@school.test", ROLE_BUSINESS).await;

    let (_, tier) = send(
        &app,
        json_request(
            "PUT",
            "/api/listingTiers",
            Some(&admin),
            json!({"Name": "Gold", "PriceCents": 50000, "MaxImages": 3}),
        ),
    )
    .await;
    let tier_id = tier["Data"]["Id"].as_str().unwrap().to_string();

    let (_, listing) = send(
        &app,
        json_request(
            "PUT",
            "/api/businessListings",
            Some(&owner),
            json!({"TierId": tier_id, "Name": "Uniform Shop"}),
        ),
    )
    .await;
    assert_eq!(listing["Succeeded"], true);
    let listing_id = listing["Data"]["Id"].as_str().unwrap().to_string();

    let boundary = "schoolhub-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"shop.png\"\r\nContent-Type: image/png\r\n\r\npng-data\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/businessListings/{listing_id}/images"))
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, report) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["Succeeded"], false);
    assert_eq!(report["Data"]["Uploaded"].as_array().unwrap().len(), 1);
    assert_eq!(report["Data"]["Failures"][0]["FileName"], "notes.txt");
    assert_eq!(
        report["Messages"],
        json!(["notes.txt: text/plain is not an image type"])
    );
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = common::setup().await;
    let response = router(&app)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
