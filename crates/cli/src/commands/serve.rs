//! Serve command handler.
//!
//! Runs the HTTP chat endpoint until interrupted.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::RagPipeline;
use docchat_server::Server;

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Listen address (default: 127.0.0.1:3000)
    #[arg(short, long, env = "DOCCHAT_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        config.validate(true)?;

        let pipeline = RagPipeline::from_config(config).await?;
        let server = Server::new(&config.server, pipeline)?;

        tracing::debug!("Request timeout: {}s", config.server.request_timeout_secs);

        server.run().await
    }
}
