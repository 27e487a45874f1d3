use image::DynamicImage;
use shared::ModelInfo;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::inference::backends::{self, ModelHandle};
use crate::inference::config::ModelManifest;
use crate::inference::prediction::{self, LabelSet, PredictionResult};
use crate::inference::preprocess::{self, PreprocessedTensor};

pub struct ClassificationPipeline {
    manifest: ModelManifest,
    labels: LabelSet,
    model: ModelHandle,
}

impl ClassificationPipeline {
    pub fn load(manifest_path: impl AsRef<Path>) -> Result<Self> {
        let manifest = ModelManifest::load(manifest_path)?;
        let model = backends::load_model(&manifest.model, manifest.format, &manifest.input)?;
        Self::with_model(manifest, model)
    }

    /// Wraps an already loaded model. Runs one forward pass on a blank input
    /// to check that the output width matches the manifest labels.
    pub fn with_model(manifest: ModelManifest, model: ModelHandle) -> Result<Self> {
        manifest.validate()?;
        let labels = manifest.label_set()?;
        let pipeline = Self {
            manifest,
            labels,
            model,
        };
        pipeline.check_output_width()?;
        Ok(pipeline)
    }

    fn check_output_width(&self) -> Result<()> {
        let blank = PreprocessedTensor::zeros(self.manifest.input.width, self.manifest.input.height);
        self.model
            .forward(&blank)
            .and_then(|output| output.class_scores(self.labels.len()))
            .map(|_| ())
            .map_err(|e| {
                PipelineError::ModelLoad(format!(
                    "model {} does not match its {} manifest labels: {}",
                    self.manifest.name,
                    self.labels.len(),
                    e
                ))
            })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn preprocess(&self, image: &DynamicImage) -> Result<PreprocessedTensor> {
        preprocess::preprocess(image, self.manifest.input.width, self.manifest.input.height)
    }

    pub fn predict(&self, tensor: &PreprocessedTensor) -> Result<PredictionResult> {
        let (width, height) = (
            self.manifest.input.width as usize,
            self.manifest.input.height as usize,
        );
        if tensor.width() != width || tensor.height() != height {
            return Err(PipelineError::Inference(format!(
                "tensor is {}x{}, model expects {}x{}",
                tensor.width(),
                tensor.height(),
                width,
                height
            )));
        }

        let scores = self.model.forward(tensor)?.class_scores(self.labels.len())?;
        prediction::aggregate(scores, &self.labels, self.manifest.output)
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<PredictionResult> {
        let tensor = self.preprocess(image)?;
        self.predict(&tensor)
    }

    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<PredictionResult> {
        let image = preprocess::decode(bytes)?;
        log::debug!("Decoded upload: {}x{}", image.width(), image.height());
        self.classify(&image)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            format: self.manifest.format.as_str().to_string(),
            class_labels: self.labels.names().to_vec(),
            input_width: self.manifest.input.width,
            input_height: self.manifest.input.height,
        }
    }
}
