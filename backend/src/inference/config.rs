use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::inference::prediction::LabelSet;

pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Onnx,
    Torchscript,
}

impl ModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Onnx => "onnx",
            ModelFormat::Torchscript => "torchscript",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    #[default]
    Probabilities,
    Logits,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputSpec {
    #[serde(default = "default_input_size")]
    pub width: u32,
    #[serde(default = "default_input_size")]
    pub height: u32,
    #[serde(default)]
    pub layout: InputLayout,
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_SIZE,
            height: DEFAULT_INPUT_SIZE,
            layout: InputLayout::Nhwc,
        }
    }
}

impl InputSpec {
    pub fn dims(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            InputLayout::Nhwc => [1, h, w, 3],
            InputLayout::Nchw => [1, 3, h, w],
        }
    }
}

/// Versioned description of a model artifact, shipped next to it.
///
/// The order of `labels` is the order of the model's output neurons. Nothing
/// at runtime can verify that order, only its length, so the manifest must be
/// produced together with the trained weights.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub version: String,
    pub model: PathBuf,
    pub format: ModelFormat,
    pub labels: Vec<String>,
    #[serde(default)]
    pub input: InputSpec,
    #[serde(default)]
    pub output: OutputActivation,
}

impl ModelManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::ModelLoad(format!("failed to read manifest {}: {}", path.display(), e))
        })?;
        let mut manifest = Self::from_yaml(&contents)?;

        if manifest.model.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.model = dir.join(&manifest.model);
            }
        }

        Ok(manifest)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let manifest: ModelManifest = serde_yaml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.width == 0 || self.input.height == 0 {
            return Err(PipelineError::ModelLoad(format!(
                "input size must be non-zero, got {}x{}",
                self.input.width, self.input.height
            )));
        }

        if self.labels.is_empty() {
            return Err(PipelineError::ModelLoad(
                "manifest must list at least one label".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for label in &self.labels {
            if label.trim().is_empty() {
                return Err(PipelineError::ModelLoad("labels must not be blank".to_string()));
            }
            if !seen.insert(label.as_str()) {
                return Err(PipelineError::ModelLoad(format!("duplicate label: {}", label)));
            }
        }

        Ok(())
    }

    pub fn label_set(&self) -> Result<LabelSet> {
        LabelSet::new(self.labels.clone())
    }
}
