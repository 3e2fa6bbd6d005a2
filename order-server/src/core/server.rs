//! HTTP server startup and shutdown

use crate::core::{Config, Result, ServerState};
use std::net::SocketAddr;

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serve until Ctrl-C, then stop background tasks
    pub async fn run(&self) -> Result<()> {
        let (state, audit_rx) = ServerState::initialize(&self.config)?;
        let tasks = state.start_background_tasks(audit_rx);

        let app = crate::api::build_app().with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(environment = %self.config.environment, "Order server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        // Report workers that died while serving
        tasks.check_health();
        tasks.shutdown(self.config.shutdown_timeout()).await;
        Ok(())
    }
}
