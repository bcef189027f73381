use std::sync::Arc;

use crate::canvas::CanvasClient;
use crate::notion::NotionClient;

#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<dyn CanvasClient>,
    pub notion: Arc<dyn NotionClient>,
    pub assignee: Option<String>,
}
