use std::path::Path;
use tract_onnx::prelude::*;

use crate::error::{PipelineError, Result};
use crate::inference::backends::{Classifier, ModelOutput};
use crate::inference::config::{InputLayout, InputSpec};
use crate::inference::preprocess::PreprocessedTensor;

pub struct OnnxClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    layout: InputLayout,
    dims: [usize; 4],
}

impl OnnxClassifier {
    pub fn load(path: &Path, input: &InputSpec) -> Result<Self> {
        let dims = input.dims();
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(dims).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                PipelineError::ModelLoad(format!(
                    "failed to load ONNX model {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            model,
            layout: input.layout,
            dims,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn forward(&self, tensor: &PreprocessedTensor) -> Result<ModelOutput> {
        let data = tensor.to_layout_vec(self.layout);
        let input = Tensor::from_shape(&self.dims, &data)
            .map_err(|e| PipelineError::Inference(format!("failed to build input tensor: {}", e)))?;

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| PipelineError::Inference(format!("ONNX forward pass failed: {}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| PipelineError::Inference("model returned no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PipelineError::Inference(format!("model output is not f32: {}", e)))?;

        Ok(ModelOutput::new(
            view.shape().to_vec(),
            view.iter().copied().collect(),
        ))
    }
}
