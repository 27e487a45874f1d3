#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "torch")]
pub mod torch;

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::inference::config::{InputSpec, ModelFormat};
use crate::inference::preprocess::PreprocessedTensor;

/// A loaded network. Implementations must not mutate model state in
/// `forward`, so one handle can serve concurrent requests.
pub trait Classifier: Send + Sync {
    fn forward(&self, tensor: &PreprocessedTensor) -> Result<ModelOutput>;
}

pub type ModelHandle = Box<dyn Classifier>;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl ModelOutput {
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Self {
        Self { shape, values }
    }

    pub fn class_scores(self, classes: usize) -> Result<Vec<f32>> {
        match self.shape.as_slice() {
            [n] | [1, n] if *n == classes && self.values.len() == classes => Ok(self.values),
            shape => Err(PipelineError::Inference(format!(
                "unexpected model output shape {:?}, expected [1, {}]",
                shape, classes
            ))),
        }
    }
}

pub fn load_model(path: &Path, format: ModelFormat, input: &InputSpec) -> Result<ModelHandle> {
    if !path.is_file() {
        return Err(PipelineError::ModelLoad(format!(
            "model artifact not found: {}",
            path.display()
        )));
    }

    log::info!("Loading {} model from {}", format.as_str(), path.display());

    match format {
        ModelFormat::Onnx => load_onnx(path, input),
        ModelFormat::Torchscript => load_torchscript(path, input),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, input: &InputSpec) -> Result<ModelHandle> {
    Ok(Box::new(onnx::OnnxClassifier::load(path, input)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_path: &Path, _input: &InputSpec) -> Result<ModelHandle> {
    Err(PipelineError::ModelLoad(
        "this build has no ONNX runtime; enable the `onnx` feature".to_string(),
    ))
}

#[cfg(feature = "torch")]
fn load_torchscript(path: &Path, input: &InputSpec) -> Result<ModelHandle> {
    Ok(Box::new(torch::TorchClassifier::load(path, input)?))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(_path: &Path, _input: &InputSpec) -> Result<ModelHandle> {
    Err(PipelineError::ModelLoad(
        "this build has no TorchScript runtime; enable the `torch` feature".to_string(),
    ))
}
