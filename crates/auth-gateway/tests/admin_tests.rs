//! Admin listener: token cache administration and metrics exposition.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use auth_gateway::auth::DecodedToken;
use auth_gateway_test_utils::{TestGatewayServer, TestKeypair};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn live_token() -> DecodedToken {
    DecodedToken {
        exp: chrono::Utc::now().timestamp() + 600,
        api_product_list: Some(vec!["gold".to_string()]),
        ..DecodedToken::default()
    }
}

async fn server() -> Result<TestGatewayServer> {
    TestGatewayServer::builder()
        .public_key(&TestKeypair::new(1))
        .product("gold", &["orders"])
        .spawn()
        .await
}

#[tokio::test]
async fn test_cache_size_and_clear() -> Result<()> {
    let server = server().await?;
    server.cache().store("key-1", live_token(), None).await;
    server.cache().store("key-2", live_token(), None).await;
    let client = reqwest::Client::new();
    let endpoint = format!("{}/admin/token-cache", server.admin_url());

    let size: Value = client.get(&endpoint).send().await?.json().await?;
    assert_eq!(size, json!({"size": 2}));

    let cleared: Value = client.delete(&endpoint).send().await?.json().await?;
    assert_eq!(cleared, json!({"removed": 2}));
    assert_eq!(server.cache().size().await, 0);

    let size: Value = client.get(&endpoint).send().await?.json().await?;
    assert_eq!(size, json!({"size": 0}));

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_are_not_on_public_listener() -> Result<()> {
    let server = server().await?;
    let client = reqwest::Client::new();

    for path in ["/admin/token-cache", "/metrics"] {
        let response = client
            .get(format!("{}{}", server.url(), path))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
    }

    let response = client
        .get(format!("{}/health", server.admin_url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_metrics_count_rejections_by_status() -> Result<()> {
    let server = server().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/proxy/orders/list", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/metrics", server.admin_url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;

    assert!(body.contains("gw_auth_rejections_total{status_code=\"401\"}"));
    assert!(body.contains("gw_auth_requests_total{outcome=\"rejected\"}"));
    assert!(body.contains("gw_http_requests_total"));
    assert!(!body.contains("key-"));

    Ok(())
}
