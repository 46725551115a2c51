//! Stats command handler.
//!
//! Shows how many documents and passages the store holds.

use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{PassageStore, PgPassageStore};

/// Show passage store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");
        config.validate(true)?;

        let store = PgPassageStore::connect(&config.database).await?;
        let stats = store.stats().await?;

        if self.json {
            let output = serde_json::json!({
                "backend": store.backend_name(),
                "dimensions": store.dimensions(),
                "documents": stats.documents,
                "passages": stats.passages,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Backend:    {}", store.backend_name());
            println!("Dimensions: {}", store.dimensions());
            println!("Documents:  {}", stats.documents);
            println!("Passages:   {}", stats.passages);
        }

        Ok(())
    }
}
