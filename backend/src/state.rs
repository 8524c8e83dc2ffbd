use shared::{ACCEPTED_TYPES, ApiError, PageStatus};
use std::sync::Arc;

use crate::config::ClassifierConfig;
use crate::inference::InferenceService;

/// Outcome of startup model resolution. A failure is kept so the page can show it.
pub enum ModelState {
    Ready(Arc<InferenceService>),
    Failed(ApiError),
}

pub struct AppState {
    pub title: String,
    pub class_labels: Vec<String>,
    pub max_upload_bytes: usize,
    pub model: ModelState,
}

impl AppState {
    pub fn new(config: &ClassifierConfig, model: ModelState) -> Self {
        Self {
            title: config.title.clone(),
            class_labels: config.classes.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
            model,
        }
    }

    pub fn page_status(&self) -> PageStatus {
        let (ready, error) = match &self.model {
            ModelState::Ready(_) => (true, None),
            ModelState::Failed(err) => (false, Some(err.clone())),
        };
        PageStatus {
            title: self.title.clone(),
            class_labels: self.class_labels.clone(),
            accepted_types: ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
            ready,
            error,
        }
    }
}
