use anyhow::Result;
use chart_suggester::{config::Config, logging, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let config = Config::from_env()?;
    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config));

    let app = chart_suggester::app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
