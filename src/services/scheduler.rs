use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::canvas::CanvasClient;
use crate::notion::NotionClient;
use crate::services::sync_service::{SyncService, SyncStats};

/// Runs a sync pass on a fixed interval, forever. A failed pass is logged
/// and the loop keeps going.
pub struct SyncScheduler {
    canvas: Arc<dyn CanvasClient>,
    notion: Arc<dyn NotionClient>,
    assignee: Option<String>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        notion: Arc<dyn NotionClient>,
        assignee: Option<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            canvas,
            notion,
            assignee,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn start(self) {
        info!("Starting auto-sync scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_sync().await {
                Ok(stats) => {
                    info!(
                        "Auto-sync completed - {} created, {} updated, {} unchanged, {} failed",
                        stats.created, stats.updated, stats.unchanged, stats.failed
                    );
                }
                Err(e) => {
                    tracing::warn!("Auto-sync failed: {:?}", e);
                }
            }
        }
    }

    async fn run_sync(&self) -> Result<SyncStats, crate::error::AppError> {
        let service = SyncService::new(
            self.canvas.clone(),
            self.notion.clone(),
            self.assignee.clone(),
        );
        service.sync_all().await
    }
}
