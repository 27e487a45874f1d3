use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InferenceResponse {
    pub id: Uuid,
    pub label: String,
    pub class_index: usize,
    /// Percentage in `0..=100`.
    pub confidence: f32,
    /// Probability per class, ordered like `class_labels`.
    pub predictions: Vec<f32>,
    pub class_labels: Vec<String>,
    pub image_hash: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ModelLoad,
    InvalidImage,
    Inference,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub format: String,
    pub class_labels: Vec<String>,
    pub input_width: u32,
    pub input_height: u32,
}
