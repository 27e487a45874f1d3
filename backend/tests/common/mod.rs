#![allow(dead_code)]

use backend::error::Result;
use backend::inference::backends::{Classifier, ModelOutput};
use backend::inference::config::ModelManifest;
use backend::inference::prediction::softmax;
use backend::inference::preprocess::PreprocessedTensor;
use backend::ClassificationPipeline;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;

pub const LABELS: [&str; 4] = [
    "Actinic keratosis",
    "Atopic Dermatitis",
    "Benign keratosis",
    "Dermatofibroma",
];

pub fn manifest_yaml(output: &str) -> String {
    format!(
        r#"
name: test-dermatitis
version: "0.1.0"
model: unused.onnx
format: onnx
labels:
  - Actinic keratosis
  - Atopic Dermatitis
  - Benign keratosis
  - Dermatofibroma
output: {}
"#,
        output
    )
}

pub fn manifest() -> ModelManifest {
    ModelManifest::from_yaml(&manifest_yaml("probabilities")).unwrap()
}

/// Scores each class from the mean of one colour channel, so that a red image
/// lands on class 0, green on 1, blue on 2 and black on 3.
pub struct ChannelMeanClassifier {
    pub classes: usize,
    pub emit_logits: bool,
}

impl ChannelMeanClassifier {
    pub fn probabilities() -> Self {
        Self {
            classes: LABELS.len(),
            emit_logits: false,
        }
    }

    fn logits(&self, tensor: &PreprocessedTensor) -> Vec<f32> {
        let view = tensor.view();
        let pixels = (tensor.width() * tensor.height()) as f32;
        let mut logits = vec![0.0f32; self.classes];
        for c in 0..3.min(self.classes) {
            let sum: f32 = view.iter().skip(c).step_by(3).sum();
            logits[c] = 4.0 * sum / pixels;
        }
        if self.classes > 3 {
            logits[3] = 1.0;
        }
        logits
    }
}

impl Classifier for ChannelMeanClassifier {
    fn forward(&self, tensor: &PreprocessedTensor) -> Result<ModelOutput> {
        let logits = self.logits(tensor);
        let values = if self.emit_logits {
            logits
        } else {
            softmax(&logits)
        };
        Ok(ModelOutput::new(vec![1, self.classes], values))
    }
}

/// Answers the blank load-time pass correctly, then emits a rank-3 output for any
/// image with a lit pixel.
pub struct MalformedOnSignalClassifier;

impl Classifier for MalformedOnSignalClassifier {
    fn forward(&self, tensor: &PreprocessedTensor) -> Result<ModelOutput> {
        if tensor.view().iter().any(|v| *v > 0.0) {
            Ok(ModelOutput::new(vec![1, 2, 2], vec![0.25; 4]))
        } else {
            Ok(ModelOutput::new(vec![1, 4], vec![0.25; 4]))
        }
    }
}

pub fn pipeline() -> ClassificationPipeline {
    ClassificationPipeline::with_model(manifest(), Box::new(ChannelMeanClassifier::probabilities()))
        .unwrap()
}

pub fn solid(width: u32, height: u32, pixel: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(pixel)))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}
