//! End-to-end API tests over an in-memory store.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use homefin_db::Store;
use homefin_server::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt as _;

const TEST_CLIENT: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 40000);

/// bcrypt's minimum cost, to keep test hashing fast.
const TEST_COST: u32 = 4;

async fn test_app() -> (Router, Store) {
    let store = Store::open_in_memory().await.expect("store");
    let mut users = BTreeMap::new();
    let hash = bcrypt::hash("secret", TEST_COST)
        .expect("hash")
        .into_bytes();
    let _ = users.insert("admin".to_owned(), hash);
    let state = Arc::new(AppState::new(store.clone(), users));
    let app = homefin_server::app(state, Path::new("missing-webgui"));
    (app, store)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    let mut request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    // oneshot bypasses the listener, so the connect info the login limiter
    // keys on has to be injected by hand.
    let _ = request.extensions_mut().insert(ConnectInfo(TEST_CLIENT));
    request
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/login",
            None,
            Some(&json!({"username": "admin", "password": "secret"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "admin");
    body["token"].as_str().expect("token").to_owned()
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_403_detail() {
    let (app, _store) = test_app().await;
    for payload in [
        json!({"username": "admin", "password": "wrong"}),
        json!({"username": "nobody", "password": "secret"}),
    ] {
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/login", None, Some(&payload)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["detail"], "Invalid credentials");
    }
}

#[tokio::test]
async fn login_is_rate_limited_per_address() {
    let (app, _store) = test_app().await;
    let bad = json!({"username": "admin", "password": "wrong"});
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/login", None, Some(&bad)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/api/login", None, Some(&bad)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn protected_routes_need_a_live_token() {
    let (app, store) = test_app().await;
    for token in [None, Some("forged")] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/corporation", token, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await["detail"],
            "Invalid authentication credentials"
        );
    }

    // An expired session is as good as no session.
    let expired = chrono::Utc::now().naive_utc() - chrono::Duration::hours(1);
    store
        .save_session("stale", "admin", expired)
        .await
        .expect("seed session");
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/corporation", Some("stale"), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/api/logout", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "success");

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/bill_to", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unsaved_addresses_answer_with_empty_fields() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/corporation", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["company_name"], "");
    assert_eq!(body["phone_number"], "");
}

#[tokio::test]
async fn addresses_round_trip_through_the_api() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    let corporation = json!({
        "company_name": "Acme Consulting LLC",
        "recipient": "Jane Doe",
        "street": "12 Main St",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62704",
        "phone_number": "555-0100",
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/corporation",
            Some(&token),
            Some(&corporation),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // bill_to payloads carry no phone number
    let bill_to = json!({
        "company_name": "Globex",
        "recipient": "Accounts Payable",
        "street": "1 Industry Way",
        "city": "Indianapolis",
        "state": "IN",
        "zip_code": "46280",
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/bill_to",
            Some(&token),
            Some(&bill_to),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/corporation", Some(&token), None))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["company_name"], "Acme Consulting LLC");
    assert_eq!(body["phone_number"], "555-0100");

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/bill_to", Some(&token), None))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["company_name"], "Globex");
    assert_eq!(body["phone_number"], "");
}

#[tokio::test]
async fn time_entries_filter_by_range_and_upsert_by_date() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    for (date, hours) in [("2024-03-04", 8.0), ("2024-03-05", 6.5), ("2024-03-20", 4.0)] {
        let entry = json!({"date": date, "hours": hours, "hourly_rate": 150.0, "hours_inputted": true});
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/time_entries",
                Some(&token),
                Some(&entry),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/time_entries?start_date=2024-03-01&end_date=2024-03-15",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let dates: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["date"].as_str().expect("date"))
        .collect();
    assert_eq!(dates, vec!["2024-03-04", "2024-03-05"]);
}

#[tokio::test]
async fn settings_round_trip_and_missing_keys_are_null() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/settings/next_invoice_number",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["key"], "next_invoice_number");
    assert!(body["value"].is_null());

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/settings",
            Some(&token),
            Some(&json!({"key": "next_invoice_number", "value": "12"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/settings/next_invoice_number",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(json_body(response).await["value"], "12");
}

#[tokio::test]
async fn generate_requires_addresses_and_entries() {
    let (app, store) = test_app().await;
    let token = login(&app).await;

    let payload = json!({
        "invoice_number": 1,
        "start_date": "2024-03-04",
        "entries": [{"date": "2024-03-04", "hours": 8.0, "hourly_rate": 150.0}],
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/generate",
            Some(&token),
            Some(&payload),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["detail"],
        "Corporation or Bill To info missing"
    );

    seed_addresses(&store).await;
    let empty = json!({
        "invoice_number": 1,
        "start_date": "2024-03-04",
        "entries": [],
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/generate",
            Some(&token),
            Some(&empty),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "No time entries provided");
}

#[tokio::test]
async fn generate_returns_a_pdf_attachment() {
    let (app, store) = test_app().await;
    let token = login(&app).await;
    seed_addresses(&store).await;

    let payload = json!({
        "invoice_number": 42,
        "start_date": "2024-03-04",
        "end_date": "2024-03-10",
        "entries": [
            {"date": "2024-03-04", "hours": 8.0, "hourly_rate": 150.0},
            {"date": "2024-03-05", "hours": 6.0, "hourly_rate": 150.0},
        ],
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/generate",
            Some(&token),
            Some(&payload),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        // period ends 2024-03-10, so the invoice is dated the 11th
        "attachment; filename=\"acme_consulting_llc_invoice_42_20240311.pdf\""
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        "Content-Disposition"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn email_settings_hide_and_preserve_the_password() {
    let (app, _store) = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/email_settings/get",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["gmail_account"], "");
    assert_eq!(body["has_password"], false);

    let first = json!({
        "gmail_account": "login@gmail.com",
        "from_email": "billing@example.com",
        "to_email": "client@example.com",
        "cc_email": "me@example.com",
        "gmail_app_password": "app-password",
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/email_settings/set",
            Some(&token),
            Some(&first),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Saving again with an empty password keeps the stored one.
    let second = json!({
        "gmail_account": "login@gmail.com",
        "from_email": "alias@example.com",
        "to_email": "client@example.com",
        "gmail_app_password": "",
    });
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/email_settings/set",
            Some(&token),
            Some(&second),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/email_settings/get",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["from_email"], "alias@example.com");
    assert_eq!(body["cc_email"], "");
    assert_eq!(body["has_password"], true);
}

#[tokio::test]
async fn send_email_rejects_unconfigured_settings_and_bad_months() {
    let (app, store) = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/send_email",
            Some(&token),
            Some(&json!({"invoice_number": 1, "month": 3, "year": 2024})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["detail"],
        "Email settings not configured. Please set Gmail app password."
    );

    store
        .save_email_settings(&homefin_db::EmailSettings {
            gmail_account: Some("login@gmail.com".into()),
            from_email: Some("billing@example.com".into()),
            to_email: Some("client@example.com".into()),
            cc_email: None,
            email_subject: None,
            gmail_app_password: Some("app-password".into()),
        })
        .await
        .expect("seed settings");
    seed_addresses(&store).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/send_email",
            Some(&token),
            Some(&json!({"invoice_number": 1, "month": 13, "year": 2024})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "Invalid month: 2024-13");
}

#[tokio::test]
async fn unknown_api_paths_fall_through_to_the_static_handler() {
    let (app, _store) = test_app().await;
    // No webgui directory in the test fixture, so the fallback 404s.
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/no-such-page", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn seed_addresses(store: &Store) {
    let corporation = homefin_common::types::Address {
        company_name: "Acme Consulting LLC".into(),
        recipient: "Jane Doe".into(),
        street: "12 Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        zip_code: "62704".into(),
        phone_number: "555-0100".into(),
    };
    store
        .save_corporation(&corporation)
        .await
        .expect("seed corporation");
    let bill_to = homefin_common::types::Address {
        company_name: "Globex".into(),
        recipient: "Accounts Payable".into(),
        street: "1 Industry Way".into(),
        city: "Indianapolis".into(),
        state: "IN".into(),
        zip_code: "46280".into(),
        phone_number: String::new(),
    };
    store.save_bill_to(&bill_to).await.expect("seed bill_to");
}
