use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpResponse, ResponseError};
use chrono::Utc;
use futures_util::{StreamExt, TryStreamExt};
use log::{debug, error, warn};
use serde_json::json;
use sha2::{Digest, Sha256};
use shared::{ErrorResponse, InferenceResponse};
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::PipelineError;
use crate::inference::prediction::{LabelSet, PredictionResult};

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            PipelineError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.service(
        web::resource("/api/classify")
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .route(web::post().to(classify_image)),
    )
    .service(web::resource("/api/inference").route(web::post().to(handle_inference)))
    .service(web::resource("/api/model").route(web::get().to(model_info)))
    .service(web::resource("/health").route(web::get().to(health)));
}

pub fn calculate_image_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

fn to_response(prediction: &PredictionResult, labels: &LabelSet, image: &[u8]) -> InferenceResponse {
    InferenceResponse {
        id: Uuid::new_v4(),
        label: prediction.label().name.clone(),
        class_index: prediction.class_index(),
        confidence: prediction.confidence(),
        predictions: prediction.probabilities().to_vec(),
        class_labels: labels.names().to_vec(),
        image_hash: calculate_image_hash(image),
        processed_at: Utc::now(),
    }
}

fn log_failure(err: &PipelineError) {
    match err {
        PipelineError::InvalidImage(_) => warn!("Rejected upload: {}", err),
        _ => error!("{}", err),
    }
}

async fn run_inference(
    ctx: &AppContext,
    image: web::Bytes,
) -> Result<InferenceResponse, PipelineError> {
    let pipeline = ctx.pipeline.clone();
    let data = image.clone();
    let prediction = web::block(move || pipeline.classify_bytes(&data))
        .await
        .map_err(|e| PipelineError::Inference(format!("inference worker failed: {}", e)))??;

    debug!(
        "Classified {} byte upload as {} ({:.2}%)",
        image.len(),
        prediction.label().name,
        prediction.confidence()
    );

    Ok(to_response(&prediction, ctx.pipeline.labels(), &image))
}

async fn classify_image(
    ctx: web::Data<AppContext>,
    body: web::Bytes,
) -> Result<HttpResponse, PipelineError> {
    match run_inference(&ctx, body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            log_failure(&e);
            Err(e)
        }
    }
}

async fn handle_inference(
    ctx: web::Data<AppContext>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut images: Vec<web::Bytes> = Vec::new();
    let mut total_bytes = 0usize;

    // The limit covers the whole request, not each part.
    while let Some(mut field) = payload.try_next().await? {
        let mut image_data = web::BytesMut::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            total_bytes += data.len();
            if total_bytes > ctx.max_upload_bytes {
                warn!(
                    "Rejected multipart upload over {} bytes",
                    ctx.max_upload_bytes
                );
                return Ok(HttpResponse::PayloadTooLarge().json(ErrorResponse {
                    error: format!("upload exceeds {} bytes", ctx.max_upload_bytes),
                    kind: shared::ErrorKind::InvalidImage,
                }));
            }
            image_data.extend_from_slice(&data);
        }

        if !image_data.is_empty() {
            images.push(image_data.freeze());
        }
    }

    if images.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "no image found in upload".to_string(),
            kind: shared::ErrorKind::InvalidImage,
        }));
    }

    let mut results = Vec::with_capacity(images.len());
    for image in images {
        match run_inference(&ctx, image).await {
            Ok(response) => results.push(json!({
                "id": response.id,
                "inference": response,
            })),
            Err(e) => {
                log_failure(&e);
                results.push(json!({
                    "id": Uuid::new_v4(),
                    "error": e.to_string(),
                    "kind": e.kind(),
                }));
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "results": results })))
}

async fn model_info(ctx: web::Data<AppContext>) -> HttpResponse {
    HttpResponse::Ok().json(ctx.pipeline.model_info())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
