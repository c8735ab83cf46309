//! CreditGate Account Server
//!
//! Production server for the account provisioning API:
//! - GET  /api/account            - provisioned state (lazy create on first access)
//! - POST /api/account/credential - issue a replacement API key
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CG_API_PORT` | `8080` | HTTP API port |
//! | `CG_OPS_PORT` | `9090` | Health/metrics port |
//! | `CG_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `CG_MONGO_DB` | `creditgate` | MongoDB database name |
//! | `CG_STORE` | `mongo` | Store backend (`mongo` or `memory` for local dev) |
//! | `CG_JWT_SECRET` | - | HMAC secret shared with the identity provider |
//! | `CG_JWT_ISSUER` | `creditgate` | Expected JWT issuer claim |
//! | `CG_JWT_AUDIENCE` | `creditgate` | Expected JWT audience claim |
//! | `CG_SEED_CREDITS` | `1000` | Initial credit balance for new accounts |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use axum::{
    routing::get,
    response::Json,
    Router,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use anyhow::Result;
use tracing::{info, warn};
use tokio::{signal, net::TcpListener};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cg_common::{env_or, env_or_parse, StoreBackend};
use cg_platform::api::{account_router, AccountApiState, AccountApiDoc, AppState, AuthLayer};
use cg_platform::shared::indexes::initialize_indexes;
use cg_platform::{
    AccountStore, ApiKeyGenerator, CreditLedger, JwtIdentityVerifier, VerifierConfig,
    MemoryAccountStore, MemoryCreditLedger, MongoAccountStore, MongoCreditLedger,
    ProvisioningService, DEFAULT_SEED_CREDITS,
};

#[tokio::main]
async fn main() -> Result<()> {
    cg_common::logging::init_logging("cg-account-server");

    info!("Starting CreditGate Account Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("CG_API_PORT", 8080);
    let ops_port: u16 = env_or_parse("CG_OPS_PORT", 9090);
    let mongo_url = env_or("CG_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("CG_MONGO_DB", "creditgate");
    let store_backend: StoreBackend = env_or_parse("CG_STORE", StoreBackend::Mongo);
    let jwt_issuer = env_or("CG_JWT_ISSUER", "creditgate");
    let jwt_audience = env_or("CG_JWT_AUDIENCE", "creditgate");
    let seed_credits: i64 = env_or_parse("CG_SEED_CREDITS", DEFAULT_SEED_CREDITS);

    // Connect stores
    let (accounts, ledger): (Arc<dyn AccountStore>, Arc<dyn CreditLedger>) = match store_backend {
        StoreBackend::Mongo => {
            info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
            let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
            let db = mongo_client.database(&mongo_db);
            initialize_indexes(&db).await?;
            (
                Arc::new(MongoAccountStore::new(&db)),
                Arc::new(MongoCreditLedger::new(&db)),
            )
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data will not survive a restart");
            (
                Arc::new(MemoryAccountStore::new()),
                Arc::new(MemoryCreditLedger::new()),
            )
        }
    };
    info!("Store backend initialized ({})", store_backend);

    // Initialize identity verification
    let jwt_secret = match std::env::var("CG_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            warn!("CG_JWT_SECRET not set; generating an ephemeral secret (dev only)");
            ApiKeyGenerator::generate(32)?
        }
    };
    let verifier = Arc::new(JwtIdentityVerifier::new(VerifierConfig {
        secret: jwt_secret,
        issuer: jwt_issuer,
        audience: jwt_audience,
    }));
    info!("Identity verifier initialized");

    // Create AppState
    let app_state = AppState { verifier };

    // Build API state
    let provisioning = Arc::new(
        ProvisioningService::new(accounts, ledger).with_seed_credits(seed_credits),
    );
    let account_state = AccountApiState { provisioning };

    let app = Router::new()
        .nest("/api/account", account_router(account_state))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", AccountApiDoc::openapi()))
        // Auth middleware
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    // Start ops server
    let ops_addr = format!("0.0.0.0:{}", ops_port);
    info!("Ops server listening on http://{}/health", ops_addr);

    let ops_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    let ops_listener = TcpListener::bind(&ops_addr).await?;
    let ops_task = tokio::spawn(async move {
        axum::serve(ops_listener, ops_app).await.unwrap();
    });

    info!("CreditGate Account Server started");
    info!("Press Ctrl+C to shutdown");

    // Wait for shutdown
    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();
    ops_task.abort();

    info!("CreditGate Account Server shutdown complete");
    Ok(())
}

async fn metrics_handler() -> &'static str {
    "# HELP cg_account_up Account server is up\n# TYPE cg_account_up gauge\ncg_account_up 1\n"
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
