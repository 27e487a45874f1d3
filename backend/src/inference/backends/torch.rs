use std::path::Path;
use std::sync::Mutex;
use tch::{CModule, Device, Kind, Tensor};

use crate::error::{PipelineError, Result};
use crate::inference::backends::{Classifier, ModelOutput};
use crate::inference::config::{InputLayout, InputSpec};
use crate::inference::preprocess::PreprocessedTensor;

// CModule is Send but not Sync.
pub struct TorchClassifier {
    model: Mutex<CModule>,
    device: Device,
    layout: InputLayout,
    dims: Vec<i64>,
}

impl TorchClassifier {
    pub fn load(path: &Path, input: &InputSpec) -> Result<Self> {
        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(path, device).map_err(|e| {
            PipelineError::ModelLoad(format!(
                "failed to load TorchScript model {}: {}",
                path.display(),
                e
            ))
        })?;
        model.set_eval();

        log::info!("TorchScript model placed on {:?}", device);

        Ok(Self {
            model: Mutex::new(model),
            device,
            layout: input.layout,
            dims: input.dims().iter().map(|&d| d as i64).collect(),
        })
    }
}

impl Classifier for TorchClassifier {
    fn forward(&self, tensor: &PreprocessedTensor) -> Result<ModelOutput> {
        let data = tensor.to_layout_vec(self.layout);
        let input = Tensor::from_slice(&data)
            .reshape(&self.dims)
            .to_device(self.device);

        let output = {
            let model = self
                .model
                .lock()
                .map_err(|_| PipelineError::Inference("model lock poisoned".to_string()))?;
            model
                .forward_ts(&[input])
                .map_err(|e| PipelineError::Inference(format!("TorchScript forward pass failed: {}", e)))?
        };

        let output = output.to_kind(Kind::Float).to_device(Device::Cpu);
        let shape: Vec<usize> = output.size().iter().map(|&d| d as usize).collect();
        let output_flat = output.contiguous().view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut values = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut values, num_elements);

        Ok(ModelOutput::new(shape, values))
    }
}
