use crate::error::{PipelineError, Result};
use crate::inference::config::OutputActivation;

const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    pub index: usize,
    pub name: String,
}

/// Ordered class names; position `i` names output neuron `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(PipelineError::ModelLoad("label set is empty".to_string()));
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ClassLabel> {
        self.names.get(index).map(|name| ClassLabel {
            index,
            name: name.clone(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    label: ClassLabel,
    confidence: f32,
    probabilities: Vec<f32>,
}

impl PredictionResult {
    pub fn label(&self) -> &ClassLabel {
        &self.label
    }

    pub fn class_index(&self) -> usize {
        self.label.index
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }
}

pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn to_probabilities(scores: Vec<f32>, activation: OutputActivation) -> Result<Vec<f32>> {
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(PipelineError::Inference(format!(
            "model produced a non-finite score: {}",
            bad
        )));
    }

    match activation {
        OutputActivation::Logits => Ok(softmax(&scores)),
        OutputActivation::Probabilities => {
            if let Some(neg) = scores.iter().find(|&&s| s < 0.0) {
                return Err(PipelineError::Inference(format!(
                    "model produced a negative probability: {}",
                    neg
                )));
            }
            let sum: f32 = scores.iter().sum();
            if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
                return Err(PipelineError::Inference(format!(
                    "model probabilities sum to {} instead of 1",
                    sum
                )));
            }
            Ok(scores.into_iter().map(|p| p / sum).collect())
        }
    }
}

/// The first index wins ties.
pub fn aggregate(
    scores: Vec<f32>,
    labels: &LabelSet,
    activation: OutputActivation,
) -> Result<PredictionResult> {
    if scores.len() != labels.len() {
        return Err(PipelineError::Inference(format!(
            "model produced {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let probabilities = to_probabilities(scores, activation)?;

    let mut best = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best] {
            best = i;
        }
    }

    let label = labels
        .get(best)
        .ok_or_else(|| PipelineError::Inference(format!("no label for class {}", best)))?;

    Ok(PredictionResult {
        label,
        confidence: probabilities[best] * 100.0,
        probabilities,
    })
}
