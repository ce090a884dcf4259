//! HTTP API server for the doctor gateway

pub mod consult;
pub mod feedback;
pub mod health;
pub mod rate_limit;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use self::rate_limit::RequestBudget;
use crate::config::ModelConfig;
use crate::consult::Consultant;
use crate::Result;

/// URL prefix synthesized audio is served under
pub const AUDIO_ROUTE: &str = "/audio";

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub consultant: Arc<Consultant>,
    pub api_key_configured: bool,
    pub models: Option<ModelConfig>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    consultant: Arc<Consultant>,
    port: u16,
    api_key_configured: bool,
    models: Option<ModelConfig>,
    static_dir: Option<PathBuf>,
    rate_limit_per_minute: Option<u32>,
    audio_ttl: Duration,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(consultant: Arc<Consultant>, port: u16) -> Self {
        Self {
            consultant,
            port,
            api_key_configured: false,
            models: None,
            static_dir: None,
            rate_limit_per_minute: None,
            audio_ttl: Duration::from_secs(3600),
        }
    }

    /// Record whether a credential is configured (reported by `/ready`)
    #[must_use]
    pub fn api_key_configured(mut self, configured: bool) -> Self {
        self.api_key_configured = configured;
        self
    }

    /// Set the model identifiers reported by `/api/status`
    #[must_use]
    pub fn models(mut self, models: ModelConfig) -> Self {
        self.models = Some(models);
        self
    }

    /// Set the static files directory for serving a custom web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Set a requests-per-minute budget for the `/api` routes
    #[must_use]
    pub fn rate_limit(mut self, requests_per_minute: Option<u32>) -> Self {
        self.rate_limit_per_minute = requests_per_minute;
        self
    }

    /// Set how long synthesized audio is kept
    #[must_use]
    pub fn audio_ttl(mut self, ttl: Duration) -> Self {
        self.audio_ttl = ttl;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            consultant: self.consultant,
            api_key_configured: self.api_key_configured,
            models: self.models,
        });

        ApiServer {
            state,
            budget: self
                .rate_limit_per_minute
                .map(|rpm| Arc::new(RequestBudget::per_minute(rpm))),
            port: self.port,
            static_dir: self.static_dir,
            audio_ttl: self.audio_ttl,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    budget: Option<Arc<RequestBudget>>,
    port: u16,
    static_dir: Option<PathBuf>,
    audio_ttl: Duration,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let audio_dir = self.state.consultant.outputs().dir().to_path_buf();

        let mut api = consult::router(self.state.clone()).merge(feedback::router());
        if let Some(budget) = &self.budget {
            api = api.layer(axum::middleware::from_fn_with_state(
                budget.clone(),
                rate_limit::enforce,
            ));
        }

        let mut router = Router::new()
            .nest("/api", api)
            .nest_service(AUDIO_ROUTE, ServeDir::new(audio_dir))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // Serve a custom UI if configured, otherwise the embedded form
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        } else {
            router = router.merge(ui::router());
        }

        // CORS layer for cross-origin requests from a separately hosted frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if !self.state.api_key_configured {
            tracing::warn!("GROQ_API_KEY is not set; remote calls will fail until it is");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        let pruner = self.spawn_pruner();

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")));

        pruner.abort();
        result
    }

    /// Periodically delete synthesized audio older than the TTL
    fn spawn_pruner(&self) -> tokio::task::JoinHandle<()> {
        let outputs = self.state.consultant.outputs().clone();
        let ttl = self.audio_ttl;
        let period = (ttl / 4).clamp(Duration::from_secs(30), Duration::from_secs(900));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = outputs.prune(ttl).await {
                    tracing::warn!(error = %e, "audio pruning failed");
                }
            }
        })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
