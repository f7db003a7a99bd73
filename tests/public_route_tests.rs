mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, get, json_request, send, test_app, test_config};
use serde_json::Value;

fn assert_close(value: &Value, expected: f64) {
    let got = value.as_f64().expect("number");
    assert!((got - expected).abs() < 1e-6, "{got} != {expected}");
}

#[tokio::test]
async fn waitlist_signup_status_and_duplicate() {
    let (app, _state) = test_app("route-signup", test_config()).await;

    // 1) invalid JSON and invalid email -> 400
    let resp = send(&app, json_request("POST", "/api/waitlist", "not-json")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = send(&app, json_request("POST", "/api/waitlist", r#"{"email":"nope"}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_EMAIL");

    // 2) first signup -> 201 with position 1
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/waitlist",
            r#"{"email":"  Alice@Example.com ","utm_source":"x"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["position"], 1);
    let code = body["referral_code"].as_str().unwrap().to_string();

    // 3) referred signup bumps the referrer's count
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/waitlist",
            &format!(r#"{{"email":"bob@example.com","ref":"{}"}}"#, code.to_lowercase()),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["position"], 2);

    let resp = send(&app, get(&format!("/api/waitlist/{code}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["position"], 1);
    assert_eq!(body["referral_count"], 1);

    // 4) same email, different case -> 409 with the exact body
    let resp = send(
        &app,
        json_request("POST", "/api/waitlist", r#"{"email":"ALICE@example.com"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_text(resp).await,
        r#"{"error":{"code":"ALREADY_REGISTERED","message":"This email is already registered."}}"#
    );

    // 5) unknown code -> 404
    let resp = send(&app, get("/api/waitlist/ZZZZ9999")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, get("/api/stats")).await;
    assert_eq!(body_json(resp).await["signups"], 2);
}

#[tokio::test]
async fn unsubscribe_requires_a_known_token() {
    let (app, state) = test_app("route-unsub", test_config()).await;
    let resp = send(&app, json_request("POST", "/api/waitlist", r#"{"email":"u@example.com"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let code = body_json(resp).await["referral_code"].as_str().unwrap().to_string();
    let entry = state.db.get_waitlist_by_code(code).await.unwrap().unwrap();

    let resp = send(&app, get("/api/unsubscribe")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = send(&app, get("/api/unsubscribe?token=bogus")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
        &app,
        get(&format!("/api/unsubscribe?token={}", entry.unsubscribe_token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["unsubscribed"], true);
}

#[tokio::test]
async fn commitment_amount_bounds_are_inclusive() {
    let (app, _state) = test_app("route-commit", test_config()).await;

    for (amount, expected) in [
        ("99.99", StatusCode::BAD_REQUEST),
        ("100", StatusCode::CREATED),
        ("10000", StatusCode::CREATED),
        ("10000.01", StatusCode::BAD_REQUEST),
    ] {
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/commitments",
                &format!(r#"{{"email":"buyer{amount}@example.com","amount_usd":{amount}}}"#),
            ),
        )
        .await;
        assert_eq!(resp.status(), expected, "amount {amount}");
        if expected == StatusCode::BAD_REQUEST {
            assert_eq!(body_json(resp).await["error"]["code"], "INVALID_AMOUNT");
        }
    }

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/commitments",
            r#"{"email":"c@example.com","amountUsd":400,"walletAddress":"0xabc"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["tier"]["tier_number"], 1);
    // 400 / 0.025 = 16000 base tokens, 30% bonus.
    assert_close(&body["base_tokens"], 16_000.0);
    assert_close(&body["bonus_tokens"], 4_800.0);
    assert_close(&body["token_amount"], 20_800.0);

    let resp = send(&app, get("/api/tiers")).await;
    let body = body_json(resp).await;
    assert_eq!(body["buyer_count"], 3);
    assert_eq!(body["current_tier"]["tier_number"], 1);
    assert_eq!(body["tiers"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn closed_presale_rejects_commitments() {
    let (app, state) = test_app("route-closed", test_config()).await;
    state
        .db
        .put_settings(vec![("presale_open".to_string(), "false".to_string())])
        .await
        .unwrap();

    let resp = send(&app, get("/api/site")).await;
    assert_eq!(body_json(resp).await["presale_open"], false);

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/commitments",
            r#"{"email":"c@example.com","amount_usd":500}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"]["code"], "PRESALE_CLOSED");
}

#[tokio::test]
async fn quote_reports_current_tier_without_writing() {
    let (app, _state) = test_app("route-quote", test_config()).await;

    let resp = send(&app, get("/api/presale/quote?amount_usd=1000")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["buyer_count"], 0);
    assert_close(&body["total_tokens"], 52_000.0);

    let resp = send(&app, get("/api/presale/quote?amount_usd=50")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = send(&app, get("/api/presale/quote?amount_usd=lots")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, get("/api/stats")).await;
    assert_eq!(body_json(resp).await["buyers"], 0);
}

#[tokio::test]
async fn events_are_accepted_and_validated() {
    let (app, state) = test_app("route-events", test_config()).await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/events",
            r#"{"event_name":"cta_click","utmSource":"tw","metadata":{"k":1}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(body_json(resp).await["id"].is_i64());

    let resp = send(&app, json_request("POST", "/api/events", r#"{"event_name":"  "}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_EVENT");

    let (events, total) = state
        .db
        .list_events(launchpad::db::EventFilter::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(events[0].utm_source.as_deref(), Some("tw"));
    assert_eq!(events[0].client_key.as_deref(), Some("unknown"));
}

#[tokio::test]
async fn write_endpoints_are_rate_limited_per_client() {
    let mut cfg = test_config();
    cfg.rate_limit.per_minute = 1;
    cfg.rate_limit.burst = 2;
    let (app, _state) = test_app("route-ratelimit", cfg).await;

    let signup = |email: &str, ip: &str| {
        let mut req = json_request(
            "POST",
            "/api/waitlist",
            &format!(r#"{{"email":"{email}"}}"#),
        );
        req.headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        req
    };

    assert_eq!(send(&app, signup("a@example.com", "203.0.113.1")).await.status(), StatusCode::CREATED);
    assert_eq!(send(&app, signup("b@example.com", "203.0.113.1")).await.status(), StatusCode::CREATED);
    let resp = send(&app, signup("c@example.com", "203.0.113.1")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(resp).await["error"]["code"], "RATE_LIMITED");

    // Another client still has its own budget.
    assert_eq!(send(&app, signup("c@example.com", "203.0.113.2")).await.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn unconfigured_integrations_answer_503_and_unknown_routes_404() {
    let (app, _state) = test_app("route-disabled", test_config()).await;

    let resp = send(
        &app,
        json_request("POST", "/api/chat", r#"{"messages":[{"role":"user","content":"hi"}]}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = send(&app, json_request("POST", "/api/cron/drip", "")).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = send(&app, get("/api/nothing-here")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, get("/healthz")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

fn with_origin(uri: &str, origin: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .uri(uri)
        .header("origin", origin)
        .body(axum::body::Body::empty())
        .expect("failed to build request")
}

#[tokio::test]
async fn cors_allows_credentials_only_for_listed_origins() {
    // 1) no list -> origin mirrored, no credentials
    let (app, _state) = test_app("cors-default", test_config()).await;
    let resp = send(&app, with_origin("/api/tiers", "https://evil.example")).await;
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "https://evil.example"
    );
    assert!(
        resp.headers()
            .get("access-control-allow-credentials")
            .is_none()
    );

    // 2) explicit list -> credentials for listed origins only
    let mut cfg = test_config();
    cfg.basic.allowed_origins = vec!["https://launchpad.example/".to_string()];
    let (app, _state) = test_app("cors-listed", cfg).await;
    let resp = send(&app, with_origin("/api/tiers", "https://launchpad.example")).await;
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "https://launchpad.example"
    );
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");

    let resp = send(&app, with_origin("/api/tiers", "https://evil.example")).await;
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
