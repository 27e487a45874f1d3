use std::sync::Arc;

use crate::config::ServerConfig;
use crate::inference::pipeline::ClassificationPipeline;

/// Everything request handlers need, built once in `main`.
#[derive(Clone)]
pub struct AppContext {
    pub pipeline: Arc<ClassificationPipeline>,
    pub max_upload_bytes: usize,
}

impl AppContext {
    pub fn new(pipeline: ClassificationPipeline, config: &ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
