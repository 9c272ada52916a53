//! HTTP server for the chat client

use std::sync::Arc;

use anyhow::Result;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::auth::{JwtAuth, DEFAULT_TOKEN_TTL_HOURS};
use super::middleware::auth_middleware;
use super::routes::{chat, clear_conversation, health_check, login, register, status, ApiState};
use super::users::{InMemoryUserStore, UserStore};
use crate::chat::ChatOrchestrator;
use crate::config::{ServerConfig, DEFAULT_HOST, DEFAULT_JWT_SECRET, DEFAULT_PORT};

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

impl From<&ServerConfig> for ApiServerConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    chat: Arc<ChatOrchestrator>,
    users: Arc<dyn UserStore>,
}

impl ApiServer {
    /// Server with process-local accounts
    pub fn new(config: ApiServerConfig, chat: Arc<ChatOrchestrator>) -> Self {
        Self {
            config,
            chat,
            users: Arc::new(InMemoryUserStore::new()),
        }
    }

    /// Replace the account store
    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Routes with auth, tracing and CORS applied
    pub fn router(&self) -> Router {
        let state = ApiState {
            chat: Arc::clone(&self.chat),
            auth: Arc::new(JwtAuth::new(&self.config.jwt_secret)),
            users: Arc::clone(&self.users),
            token_ttl_hours: self.config.token_ttl_hours,
        };

        let protected = Router::new()
            .route("/api/chat", post(chat))
            .route("/api/status", get(status))
            .route("/api/conversation", delete(clear_conversation))
            .route_layer(from_fn_with_state(state.clone(), auth_middleware));

        Router::new()
            .route("/health", get(health_check))
            .route("/register", post(register))
            .route("/login", post(login))
            .merge(protected)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Bind to the configured address and serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("Starting API server on {}", addr);

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
