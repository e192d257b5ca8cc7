//! Bearer token flow through the public listener.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use auth_gateway_test_utils::{TestGatewayServer, TestKeypair, TestTokenBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn server(keypair: &TestKeypair) -> Result<TestGatewayServer> {
    TestGatewayServer::builder()
        .public_key(keypair)
        .product("gold", &["orders", "users"])
        .product("silver", &["catalog"])
        .spawn()
        .await
}

#[tokio::test]
async fn test_valid_bearer_reaches_backend_with_sanitized_claims() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;
    let token = TestTokenBuilder::new()
        .products(&["gold"])
        .client_id("client-1")
        .application_name("storefront")
        .claim("tier", "premium")
        .expires_at(4_000_000_000)
        .sign(&keypair);

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/v1/list", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let echo: Value = response.json().await?;
    assert_eq!(echo["proxy"], "orders");
    assert_eq!(echo["path"], "/proxy/orders/v1/list");
    assert_eq!(
        echo["claims"],
        json!({"api_product_list": ["gold"], "exp": 4_000_000_000_i64, "tier": "premium"})
    );

    let forwarded: Vec<&str> = echo["headers"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(!forwarded.contains(&"authorization"));
    assert!(forwarded.contains(&"x-authorization-claims"));

    Ok(())
}

#[tokio::test]
async fn test_expired_bearer_is_access_denied() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;
    let token = TestTokenBuilder::new()
        .products(&["gold"])
        .expired()
        .sign(&keypair);

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "access_denied");
    assert_eq!(body["error_description"], "The access token has expired");

    Ok(())
}

#[tokio::test]
async fn test_malformed_authorization_header_is_bad_request() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .header("authorization", "Token abc")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_request");

    Ok(())
}

#[tokio::test]
async fn test_missing_credential_is_unauthorized_with_challenge() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["www-authenticate"],
        "Bearer realm=\"api-gateway\", error=\"missing_authorization\""
    );
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "missing_authorization");

    Ok(())
}

#[tokio::test]
async fn test_token_signed_by_other_key_is_invalid() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;
    let token = TestTokenBuilder::new()
        .products(&["gold"])
        .sign(&TestKeypair::new(2));

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_token");

    Ok(())
}

#[tokio::test]
async fn test_authorization_fails_closed() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;
    let client = reqwest::Client::new();

    for (products, proxy) in [
        (vec!["silver"], "orders"),
        (vec![], "orders"),
        (vec!["platinum"], "orders"),
        (vec!["gold"], "billing"),
    ] {
        let token = TestTokenBuilder::new().products(&products).sign(&keypair);
        let response = client
            .get(format!("{}/proxy/{}/list", server.url(), proxy))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "products {:?} must not reach {}",
            products,
            proxy
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_client_supplied_claims_header_is_dropped() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = TestGatewayServer::builder()
        .public_key(&keypair)
        .var("ALLOW_NO_AUTHORIZATION", "true")
        .spawn()
        .await?;

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .header("x-authorization-claims", "eyJhZG1pbiI6dHJ1ZX0=")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let echo: Value = response.json().await?;
    assert_eq!(echo["claims"], Value::Null);

    Ok(())
}

#[tokio::test]
async fn test_allow_invalid_authorization_passes_unverified_request() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = TestGatewayServer::builder()
        .public_key(&keypair)
        .var("ALLOW_INVALID_AUTHORIZATION", "true")
        .spawn()
        .await?;

    let response = reqwest::Client::new()
        .get(format!("{}/proxy/orders/list", server.url()))
        .bearer_auth("not-a-token")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let echo: Value = response.json().await?;
    assert_eq!(echo["claims"], Value::Null);

    Ok(())
}

#[tokio::test]
async fn test_health_is_not_gated() -> Result<()> {
    let keypair = TestKeypair::new(1);
    let server = server(&keypair).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}
