use std::sync::Arc;

use services::services::theme_preview::ThemePreviewService;

pub mod error;
pub mod routes;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    preview: Arc<ThemePreviewService>,
}

impl AppState {
    pub fn new(preview: ThemePreviewService) -> Self {
        Self {
            preview: Arc::new(preview),
        }
    }

    pub fn preview(&self) -> &ThemePreviewService {
        &self.preview
    }
}
