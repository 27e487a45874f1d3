mod common;

use backend::inference::backends::{Classifier, ModelOutput};
use backend::inference::preprocess::PreprocessedTensor;
use backend::{ClassificationPipeline, PipelineError, Result};
use common::{ChannelMeanClassifier, MalformedOnSignalClassifier, encode, manifest, solid};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Write;

#[test]
fn classifies_by_dominant_channel() {
    let pipeline = common::pipeline();

    let cases = [
        ([255, 0, 0], "Actinic keratosis"),
        ([0, 255, 0], "Atopic Dermatitis"),
        ([0, 0, 255], "Benign keratosis"),
        ([0, 0, 0], "Dermatofibroma"),
    ];
    for (pixel, expected) in cases {
        let result = pipeline.classify(&solid(300, 200, pixel)).unwrap();
        assert_eq!(result.label().name, expected);
    }
}

#[test]
fn probabilities_cover_every_label_and_sum_to_one() {
    let pipeline = common::pipeline();
    let result = pipeline.classify(&solid(640, 480, [120, 45, 200])).unwrap();

    assert_eq!(result.probabilities().len(), 4);
    let sum: f32 = result.probabilities().iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "sum was {}", sum);
}

#[test]
fn confidence_is_top_probability_as_percentage() {
    let pipeline = common::pipeline();
    let result = pipeline.classify(&solid(64, 64, [255, 10, 10])).unwrap();

    let max = result
        .probabilities()
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    assert_eq!(result.confidence(), 100.0 * max);
    assert!(result.confidence() > 0.0 && result.confidence() <= 100.0);
}

#[test]
fn repeated_predictions_are_identical() {
    let pipeline = common::pipeline();
    let image = solid(517, 333, [80, 160, 240]);

    let first = pipeline.predict(&pipeline.preprocess(&image).unwrap()).unwrap();
    let second = pipeline.predict(&pipeline.preprocess(&image).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn blank_image_still_yields_a_distribution() {
    let pipeline = common::pipeline();
    let tensor = pipeline.preprocess(&solid(224, 224, [0, 0, 0])).unwrap();
    assert!(tensor.view().iter().all(|v| *v == 0.0));

    let result = pipeline.predict(&tensor).unwrap();
    assert_eq!(result.probabilities().len(), 4);
    let sum: f32 = result.probabilities().iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
}

#[test]
fn grayscale_is_rejected_and_pipeline_stays_usable() {
    let pipeline = common::pipeline();
    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([128])));

    let err = pipeline.classify(&gray).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidImage(_)));

    assert!(pipeline.classify(&solid(10, 10, [255, 0, 0])).is_ok());
}

#[test]
fn grayscale_upload_is_rejected_from_bytes() {
    let pipeline = common::pipeline();
    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([7])));
    let png = encode(&gray, ImageFormat::Png);

    assert!(matches!(
        pipeline.classify_bytes(&png),
        Err(PipelineError::InvalidImage(_))
    ));
}

#[test]
fn classifies_encoded_uploads() {
    let pipeline = common::pipeline();
    let image = solid(123, 77, [0, 250, 0]);

    for format in [ImageFormat::Png, ImageFormat::Jpeg] {
        let result = pipeline.classify_bytes(&encode(&image, format)).unwrap();
        assert_eq!(result.label().name, "Atopic Dermatitis");
    }
}

#[test]
fn logits_output_is_softmaxed() {
    let manifest =
        backend::inference::config::ModelManifest::from_yaml(&common::manifest_yaml("logits"))
            .unwrap();
    let classifier = ChannelMeanClassifier {
        classes: 4,
        emit_logits: true,
    };
    let pipeline = ClassificationPipeline::with_model(manifest, Box::new(classifier)).unwrap();

    let result = pipeline.classify(&solid(50, 50, [0, 0, 255])).unwrap();
    assert_eq!(result.class_index(), 2);
    let sum: f32 = result.probabilities().iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
}

#[test]
fn label_count_mismatch_fails_at_load() {
    let classifier = ChannelMeanClassifier {
        classes: 5,
        emit_logits: false,
    };
    let err = ClassificationPipeline::with_model(manifest(), Box::new(classifier))
        .err()
        .unwrap();
    assert!(matches!(err, PipelineError::ModelLoad(_)));
}

#[test]
fn malformed_output_is_an_inference_error() {
    let pipeline =
        ClassificationPipeline::with_model(manifest(), Box::new(MalformedOnSignalClassifier))
            .unwrap();

    let err = pipeline.classify(&solid(30, 30, [200, 200, 200])).unwrap_err();
    assert!(matches!(err, PipelineError::Inference(_)));

    // Blank input still goes through the well-formed path.
    assert!(pipeline.classify(&solid(30, 30, [0, 0, 0])).is_ok());
}

#[test]
fn tensor_of_wrong_size_is_rejected() {
    let pipeline = common::pipeline();
    let err = pipeline
        .predict(&PreprocessedTensor::zeros(128, 128))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Inference(_)));
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn forward(&self, _tensor: &PreprocessedTensor) -> Result<ModelOutput> {
        Err(PipelineError::Inference("runtime exploded".to_string()))
    }
}

#[test]
fn failing_width_check_is_a_load_error() {
    let err = ClassificationPipeline::with_model(manifest(), Box::new(FailingClassifier))
        .err()
        .unwrap();
    assert!(matches!(err, PipelineError::ModelLoad(msg) if msg.contains("runtime exploded")));
}

#[test]
fn load_fails_when_artifact_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.yaml");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(common::manifest_yaml("probabilities").as_bytes())
        .unwrap();

    let err = ClassificationPipeline::load(&path).err().unwrap();
    assert!(matches!(err, PipelineError::ModelLoad(msg) if msg.contains("not found")));
}

#[test]
fn model_info_reports_manifest() {
    let info = common::pipeline().model_info();
    assert_eq!(info.name, "test-dermatitis");
    assert_eq!(info.format, "onnx");
    assert_eq!(info.class_labels, common::LABELS.to_vec());
    assert_eq!((info.input_width, info.input_height), (224, 224));
}
