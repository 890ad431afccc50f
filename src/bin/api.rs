use fpna_copilot::{
    api::{start_server, ApiState},
    tools::charts::FigureBuilder,
    CopilotConfig, LedgerCache, Planner,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = CopilotConfig::from_env()?;

    info!("FP&A Copilot - API Server");
    info!("Port: {}", config.port);
    info!("Ledger: {}", config.data_dir.display());

    let state = ApiState {
        planner: Arc::new(Planner::from_config(Box::new(FigureBuilder), &config)),
        cache: Arc::new(LedgerCache::new(&config.data_dir)),
    };

    info!("Starting API server...");

    start_server(state, config.port).await?;

    Ok(())
}
