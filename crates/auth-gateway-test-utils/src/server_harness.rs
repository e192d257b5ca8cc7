//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer`, which runs the real public and admin
//! routers on random local ports.

use crate::crypto_fixtures::TestKeypair;
use auth_gateway::auth::{AuthGate, TokenCache};
use auth_gateway::config::Config;
use auth_gateway::observability::metrics::init_metrics_recorder;
use auth_gateway::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Process-wide metrics handle. The global recorder can only be installed
/// once; if something else got there first, fall back to a detached handle.
fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Builder for [`TestGatewayServer`].
#[derive(Default)]
pub struct TestGatewayServerBuilder {
    vars: HashMap<String, String>,
    products: BTreeMap<String, Vec<String>>,
}

impl TestGatewayServerBuilder {
    /// Verify tokens with `keypair`'s public key (EdDSA).
    pub fn public_key(self, keypair: &TestKeypair) -> Self {
        self.var("PUBLIC_KEY", &keypair.public_key_pem_escaped())
            .var("JWT_ALGORITHM", "EdDSA")
    }

    /// Grant `product` access to `proxies`.
    pub fn product(mut self, product: &str, proxies: &[&str]) -> Self {
        self.products.insert(
            product.to_string(),
            proxies.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn verify_api_key_url(self, url: &str) -> Self {
        self.var("VERIFY_API_KEY_URL", url)
    }

    /// Set any configuration variable.
    pub fn var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Build the configuration and start both listeners.
    pub async fn spawn(mut self) -> Result<TestGatewayServer, anyhow::Error> {
        self.vars.insert(
            "PRODUCT_TO_PROXY".to_string(),
            serde_json::to_string(&self.products)?,
        );

        let config = Config::from_vars(&self.vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;
        let gate = AuthGate::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build gate: {}", e))?;

        let state = Arc::new(AppState {
            config,
            gate: Arc::new(gate),
        });

        let (addr, public_handle) = serve(routes::build_routes(state.clone())).await?;
        let (admin_addr, admin_handle) =
            serve(routes::build_admin_routes(state.clone(), metrics_handle())).await?;

        Ok(TestGatewayServer {
            addr,
            admin_addr,
            state,
            handles: vec![public_handle, admin_handle],
        })
    }
}

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

    let handle = tokio::spawn(async move {
        let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, make_service).await {
            eprintln!("Test server error: {}", e);
        }
    });

    Ok((addr, handle))
}

/// Running gateway with public and admin listeners.
///
/// # Example
/// ```rust,ignore
/// let server = TestGatewayServer::builder()
///     .public_key(&keypair)
///     .product("gold", &["orders"])
///     .spawn()
///     .await?;
///
/// let response = reqwest::Client::new()
///     .get(format!("{}/proxy/orders/list", server.url()))
///     .bearer_auth(token)
///     .send()
///     .await?;
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    admin_addr: SocketAddr,
    state: Arc<AppState>,
    handles: Vec<JoinHandle<()>>,
}

impl TestGatewayServer {
    pub fn builder() -> TestGatewayServerBuilder {
        TestGatewayServerBuilder::default()
    }

    /// Base URL of the public listener.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL of the admin listener.
    pub fn admin_url(&self) -> String {
        format!("http://{}", self.admin_addr)
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// The running gate's token cache.
    pub fn cache(&self) -> &TokenCache {
        self.state.gate.cache()
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
