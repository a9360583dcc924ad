mod common;

use axum::http::StatusCode;
use common::{build_app, claims, get_json, test_settings, token_for};

#[tokio::test]
async fn public_routes_need_no_token() {
    let app = build_app(test_settings(&[]));

    let (status, body) = get_json(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&app, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Enterprise Analytics Dashboard");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_app(test_settings(&[]));

    let (status, body) = get_json(&app, "/api/auth/whoami", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_app(test_settings(&[]));

    let (status, _) = get_json(&app, "/api/auth/whoami", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_unauthorized() {
    let settings = test_settings(&[]);
    let other = test_settings(&[("JWT_SECRET", "a-different-secret")]);
    let token = token_for(&other, &claims(None, None, 3600));

    let app = build_app(settings);
    let (status, _) = get_json(&app, "/api/auth/whoami", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let settings = test_settings(&[]);
    let token = token_for(&settings, &claims(None, None, -60));

    let app = build_app(settings);
    let (status, _) = get_json(&app, "/api/auth/whoami", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_normalized_claims() {
    let settings = test_settings(&[]);
    let token = token_for(
        &settings,
        &claims(Some("EnterpriseArchitect"), Some("Data"), 3600),
    );

    let app = build_app(settings);
    let (status, body) = get_json(&app, "/api/auth/whoami", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["subject"], "alice@corp");
    assert_eq!(body["data"]["role"], "Architect");
    assert_eq!(body["data"]["team"], "Data");
}

#[tokio::test]
async fn disabled_auth_bypasses_all_header_checks() {
    let app = build_app(test_settings(&[("DISABLE_AUTH", "1")]));

    let (status, body) = get_json(&app, "/api/auth/whoami", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subject"], "devuser@example.com");
    assert_eq!(body["data"]["role"], "Developer");

    // Even a nonsense token is fine in bypass mode.
    let (status, _) = get_json(&app, "/api/auth/whoami", Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
}
