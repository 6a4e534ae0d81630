//! UniMerge node - the negotiation authority process.
//!
//! Architecture:
//! - Single process owning the in-memory knowledge base
//! - Negotiation engine with a background timeout reaper
//! - HTTP API + trace WebSocket for clients

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use unimerge_engine::{EngineConfig, NegotiationEngine};
use unimerge_knowledge::{BookingLedger, ConstraintStore};

use crate::api;
use crate::auth::Directory;
use crate::error::Result;

/// Configuration for a UniMerge node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Roster file for the identity directory (built-in demo roster when
    /// unset)
    pub roster: Option<PathBuf>,

    /// Negotiation timeout; `None` disables timeouts and reaping
    pub negotiation_timeout: Option<Duration>,

    /// How often the reaper sweeps for expired sessions
    pub reap_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let api_addr = std::env::var("UNIMERGE_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid UNIMERGE_API_ADDR");

        let roster = std::env::var("UNIMERGE_ROSTER").map(PathBuf::from).ok();

        // 0 disables the timeout (and with it the reaper).
        let timeout_ms: u64 = std::env::var("UNIMERGE_NEGOTIATION_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .expect("Invalid UNIMERGE_NEGOTIATION_TIMEOUT_MS");
        let negotiation_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let reap_interval_ms: u64 = std::env::var("UNIMERGE_REAP_INTERVAL_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .expect("Invalid UNIMERGE_REAP_INTERVAL_MS");
        assert!(
            reap_interval_ms > 0,
            "UNIMERGE_REAP_INTERVAL_MS must be positive"
        );

        Self {
            api_addr,
            roster,
            negotiation_timeout,
            reap_interval: Duration::from_millis(reap_interval_ms),
        }
    }
}

/// Shared state for the node - one engine and one directory shared by all
/// request handlers.
pub struct NodeState {
    pub engine: NegotiationEngine,
    pub directory: Directory,
}

/// A UniMerge node instance.
pub struct Node {
    state: Arc<NodeState>,
    config: NodeConfig,
}

impl Node {
    /// Create a new node over a fresh in-memory knowledge base.
    pub fn new(config: NodeConfig) -> Self {
        let constraints = Arc::new(ConstraintStore::new());
        let ledger = Arc::new(BookingLedger::new());

        let engine_config = match config.negotiation_timeout {
            Some(timeout) => EngineConfig::default().with_timeout(timeout),
            None => EngineConfig::default().without_timeout(),
        };
        let engine = NegotiationEngine::new(constraints, ledger).with_config(engine_config);

        let directory = match &config.roster {
            Some(path) => Directory::from_file(path.clone()),
            None => Directory::builtin(),
        };

        let state = Arc::new(NodeState { engine, directory });
        Self { state, config }
    }

    /// Get the shared state (for API handlers and tests).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts the timeout reaper and the HTTP server).
    pub async fn run(self) -> Result<()> {
        tracing::info!("UniMerge node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        match &self.config.roster {
            Some(path) => tracing::info!("  Roster: {:?}", path),
            None => tracing::info!("  Roster: built-in demo roster"),
        }
        match self.config.negotiation_timeout {
            Some(timeout) => tracing::info!("  Negotiation timeout: {:?}", timeout),
            None => tracing::info!("  Negotiation timeout: disabled"),
        }

        // Sweep for sessions whose request task went away; each sweep
        // refuses stragglers and rolls their reservations back.
        if self.config.negotiation_timeout.is_some() {
            let reaper = Arc::clone(&self.state);
            let mut interval = tokio::time::interval(self.config.reap_interval);
            tokio::spawn(async move {
                loop {
                    interval.tick().await;
                    reaper.engine.reap_expired().await;
                }
            });
        }

        // Build HTTP API
        let app = api::build_router(self.state.clone());

        // Start HTTP server
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
