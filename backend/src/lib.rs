pub mod config;
pub mod context;
pub mod error;
pub mod inference;
pub mod routes;

pub use error::{PipelineError, Result};
pub use inference::pipeline::ClassificationPipeline;
