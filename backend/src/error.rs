use shared::ErrorKind;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure the classification pipeline can report.
///
/// `ModelLoad` is fatal at startup. `InvalidImage` and `Inference` reject a
/// single request and leave the pipeline usable.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Model load error: {0}")]
    ModelLoad(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Inference error: {0}")]
    Inference(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ModelLoad(_) => ErrorKind::ModelLoad,
            PipelineError::InvalidImage(_) => ErrorKind::InvalidImage,
            PipelineError::Inference(_) => ErrorKind::Inference,
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::InvalidImage(err.to_string())
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::ModelLoad(format!("invalid manifest: {}", err))
    }
}
