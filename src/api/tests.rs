//! Router-level tests: drive the full middleware stack with `oneshot`.

use super::{
    app,
    handlers::{self, SlotStatus, Ticket},
    rate_limit::RateLimit,
    router, Services,
};
use crate::{
    api::error::ErrorBody,
    auth::{Credentials, TokenKeys},
    lot::SlotStore,
};
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tower::ServiceExt;

const TEST_COST: u32 = 4;
const USERNAME: &str = "admin";
const PASSWORD: &str = "password";

fn services_with_limits(capacity: usize, per_client: u32, per_user: u32) -> Result<Services> {
    let mut credentials = Credentials::default();
    credentials.insert(USERNAME, &SecretString::from(PASSWORD), TEST_COST)?;

    Ok(Services {
        lot: Arc::new(SlotStore::new(capacity)),
        credentials: Arc::new(credentials),
        tokens: Arc::new(TokenKeys::new(
            &SecretString::from("router-test-secret"),
            Duration::from_secs(900),
        )),
        client_limit: Arc::new(RateLimit::per_hour(
            "client",
            NonZeroU32::new(per_client).context("zero quota")?,
        )),
        user_limit: Arc::new(RateLimit::per_minute(
            "user",
            NonZeroU32::new(per_user).context("zero quota")?,
        )),
    })
}

fn services(capacity: usize) -> Result<Services> {
    services_with_limits(capacity, 1_000, 1_000)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get_request(uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&body).context("response body is not the expected JSON")
}

async fn error_reason(response: Response) -> Result<String> {
    Ok(read_json::<ErrorBody>(response).await?.error)
}

async fn login(app: &Router) -> Result<String> {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            &json!({"username": USERNAME, "password": PASSWORD}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .context("missing access_token")
}

async fn park(app: &Router, token: &str, plate: &str) -> Result<Response> {
    Ok(app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/park",
            Some(token),
            &json!({"license_plate": plate}),
        )?)
        .await?)
}

#[tokio::test]
async fn login_success_returns_bearer_token() -> Result<()> {
    let app = router(&services(5)?);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            &json!({"username": USERNAME, "password": PASSWORD}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await?;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    Ok(())
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() -> Result<()> {
    let app = router(&services(5)?);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            &json!({"username": USERNAME, "password": "wrong_password"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(response).await?, "invalid credentials");
    Ok(())
}

#[tokio::test]
async fn login_missing_fields_is_bad_request() -> Result<()> {
    let app = router(&services(5)?);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            &json!({"username": USERNAME}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(response).await?, "invalid request");
    Ok(())
}

#[tokio::test]
async fn lot_routes_require_token() -> Result<()> {
    let app = router(&services(5)?);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/park",
            None,
            &json!({"license_plate": "ABC123"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(response).await?, "missing token");

    let response = app.oneshot(get_request("/slot/0", Some("not-a-jwt"))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(response).await?, "invalid token");
    Ok(())
}

#[tokio::test]
async fn park_until_full() -> Result<()> {
    let services = services(2)?;
    let app = router(&services);
    let token = login(&app).await?;

    let response = park(&app, &token, "ABC123").await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        read_json::<Ticket>(response).await?,
        Ticket {
            license_plate: "ABC123".to_string(),
            slot: 0,
        }
    );

    let response = park(&app, &token, "TEST0").await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json::<Ticket>(response).await?.slot, 1);

    let before = services.lot.snapshot().await;
    let response = park(&app, &token, "XYZ789").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(response).await?, "lot full");
    assert_eq!(services.lot.snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn park_rejects_malformed_body() -> Result<()> {
    let services = services(2)?;
    let app = router(&services);
    let token = login(&app).await?;

    for body in [json!({}), json!({"license_plate": ""}), json!({"plate": "ABC123"})] {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/park", Some(&token), &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_reason(response).await?, "invalid request");
    }

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/park")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(services.lot.occupied().await, 0);
    Ok(())
}

#[tokio::test]
async fn inspect_slots() -> Result<()> {
    let app = router(&services(5)?);
    let token = login(&app).await?;
    assert_eq!(park(&app, &token, "ABC123").await?.status(), StatusCode::CREATED);

    let response = app.clone().oneshot(get_request("/slot/0", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await?;
    assert_eq!(body, json!({"slot": 0, "occupied": true, "license_plate": "ABC123"}));

    let response = app.clone().oneshot(get_request("/slot/1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await?;
    assert_eq!(body, json!({"slot": 1, "occupied": false, "license_plate": null}));

    for uri in ["/slot/999", "/slot/5", "/slot/-1", "/slot/abc"] {
        let response = app.clone().oneshot(get_request(uri, Some(&token))?).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(error_reason(response).await?, "invalid index");
    }
    Ok(())
}

#[tokio::test]
async fn unpark_found_and_missing() -> Result<()> {
    let app = router(&services(5)?);
    let token = login(&app).await?;
    assert_eq!(park(&app, &token, "ABC123").await?.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            "/unpark",
            Some(&token),
            &json!({"license_plate": "ABC123"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json::<Ticket>(response).await?,
        Ticket {
            license_plate: "ABC123".to_string(),
            slot: 0,
        }
    );

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/unpark",
            Some(&token),
            &json!({"license_plate": "NOTFOUND"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_reason(response).await?, "not found");
    Ok(())
}

#[tokio::test]
async fn plates_are_arbitrary_strings() -> Result<()> {
    let services = services(5)?;
    let app = router(&services);
    let token = login(&app).await?;

    for plate in ["AB_123", "ABCDEFGHIJKLMNOPQ", "ÄBC-ÖÜ"] {
        let response = park(&app, &token, plate).await?;
        assert_eq!(response.status(), StatusCode::CREATED, "{plate}");
        assert_eq!(read_json::<Ticket>(response).await?.license_plate, plate);
    }

    let response = app
        .clone()
        .oneshot(get_request("/slot/0", Some(&token))?)
        .await?;
    let status: SlotStatus = read_json(response).await?;
    assert_eq!(status.license_plate.as_deref(), Some("AB_123"));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            "/unpark",
            Some(&token),
            &json!({"license_plate": "AB_123"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json::<Ticket>(response).await?.slot, 0);

    let too_long = "P".repeat(handlers::MAX_LICENSE_PLATE_LEN + 1);
    let response = park(&app, &token, &too_long).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(response).await?, "invalid request");
    assert_eq!(services.lot.occupied().await, 2);
    Ok(())
}

#[tokio::test]
async fn unpark_unknown_plate_is_not_found() -> Result<()> {
    let services = services(3)?;
    let app = router(&services);
    let token = login(&app).await?;
    assert_eq!(park(&app, &token, "ABC123").await?.status(), StatusCode::CREATED);

    let before = services.lot.snapshot().await;
    for plate in ["ZZZ_999", "no such car!", "ABC123 "] {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                "/unpark",
                Some(&token),
                &json!({"license_plate": plate}),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{plate}");
        assert_eq!(error_reason(response).await?, "not found");
    }
    assert_eq!(services.lot.snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() -> Result<()> {
    let app = router(&services(1)?);
    let token = login(&app).await?;

    for scheme in ["bearer", "BEARER", "BeArEr"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/slot/0")
                    .header(AUTHORIZATION, format!("{scheme} {token}"))
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK, "{scheme}");
    }
    Ok(())
}

#[tokio::test]
async fn five_slot_scenario_over_http() -> Result<()> {
    let app = router(&services(5)?);
    let token = login(&app).await?;

    for (expected, plate) in ["A", "B", "C", "D", "E"].into_iter().enumerate() {
        let response = park(&app, &token, plate).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(read_json::<Ticket>(response).await?.slot, expected);
    }
    assert_eq!(park(&app, &token, "F").await?.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            "/unpark",
            Some(&token),
            &json!({"license_plate": "C"}),
        )?)
        .await?;
    assert_eq!(read_json::<Ticket>(response).await?.slot, 2);

    let response = park(&app, &token, "G").await?;
    assert_eq!(read_json::<Ticket>(response).await?.slot, 2);

    let response = app.oneshot(get_request("/slots", Some(&token))?).await?;
    let slots: Vec<SlotStatus> = read_json(response).await?;
    let plates: Vec<_> = slots
        .iter()
        .map(|status| status.license_plate.as_deref())
        .collect();
    assert_eq!(
        plates,
        vec![Some("A"), Some("B"), Some("G"), Some("D"), Some("E")]
    );
    Ok(())
}

#[tokio::test]
async fn user_rate_limit_returns_429() -> Result<()> {
    let app = router(&services_with_limits(5, 1_000, 2)?);
    let token = login(&app).await?;

    for _ in 0..2 {
        let response = app.clone().oneshot(get_request("/slot/0", Some(&token))?).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get_request("/slot/0", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(RETRY_AFTER));
    assert_eq!(error_reason(response).await?, "rate limit exceeded");
    Ok(())
}

#[tokio::test]
async fn client_rate_limit_covers_login() -> Result<()> {
    let app = router(&services_with_limits(5, 1, 1_000)?);
    login(&app).await?;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            &json!({"username": USERNAME, "password": PASSWORD}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let app = router(&services_with_limits(3, 1, 1)?);

    for _ in 0..3 {
        let response = app.clone().oneshot(get_request("/health", None)?).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get_request("/health", None)?).await?;
    let body: Value = read_json(response).await?;
    assert_eq!(body["slots"]["capacity"], 3);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = router(&services(1)?);
    let response = app.oneshot(get_request("/openapi.json", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await?;
    assert!(body["paths"]["/park"].is_object());
    Ok(())
}

#[tokio::test]
async fn app_sets_request_id() -> Result<()> {
    let app = app(&services(1)?);
    let response = app.oneshot(get_request("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .context("missing x-request-id")?;
    assert!(ulid::Ulid::from_string(request_id).is_ok());
    Ok(())
}
