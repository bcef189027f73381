use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canvasync::api::router;
use canvasync::canvas::{CanvasClient, CanvasConfig, CanvasHttpClient};
use canvasync::config;
use canvasync::notion::{NotionClient, NotionConfig, NotionHttpClient};
use canvasync::services::SyncScheduler;
use canvasync::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "canvasync=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let canvas_config = CanvasConfig::new_from_env()?;
    let notion_config = NotionConfig::new_from_env()?;
    let assignee = notion_config.assignee_id.clone();

    let canvas: Arc<dyn CanvasClient> = Arc::new(CanvasHttpClient::new(canvas_config)?);
    let notion: Arc<dyn NotionClient> = Arc::new(NotionHttpClient::new(notion_config)?);

    // Fail fast when the token or database ID is wrong
    notion.retrieve_database().await?;

    let state = AppState {
        canvas: canvas.clone(),
        notion: notion.clone(),
        assignee: assignee.clone(),
    };

    let scheduler = SyncScheduler::new(canvas, notion, assignee, config::sync_interval_secs());
    tokio::spawn(scheduler.start());

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
