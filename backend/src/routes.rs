use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use shared::{format_confidence, ApiError, ErrorKind, InferenceResponse};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use crate::error::ClassifierError;
use crate::state::{AppState, ModelState};

pub const IMAGE_FIELD: &str = "image";

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: Option<PathBuf>) {
    cfg.service(web::resource("/api/status").route(web::get().to(get_status)))
        .service(web::resource("/api/inference").route(web::post().to(handle_inference)));

    if let Some(dir) = frontend_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

async fn get_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.page_status())
}

async fn handle_inference(state: web::Data<AppState>, mut payload: Multipart) -> HttpResponse {
    let request_id = Uuid::new_v4();

    let service = match &state.model {
        ModelState::Ready(service) => service.clone(),
        ModelState::Failed(err) => {
            warn!("[{}] Rejecting upload, model unavailable: {}", request_id, err.message);
            return HttpResponse::ServiceUnavailable().json(err);
        }
    };

    let image_data = match read_image_field(&mut payload, state.max_upload_bytes).await {
        Ok(data) => data,
        Err((status, err)) => {
            warn!("[{}] {}", request_id, err);
            return HttpResponse::build(status).json(err.to_api_error());
        }
    };
    info!("[{}] Received {} byte upload", request_id, image_data.len());

    let t = Instant::now();
    let result = web::block(move || service.classify(&image_data)).await;
    match result {
        Ok(Ok(classification)) => {
            info!(
                "[{}] {} ({:.4}) in {:?}",
                request_id,
                classification.label,
                classification.confidence,
                t.elapsed()
            );
            HttpResponse::Ok().json(InferenceResponse {
                request_id: request_id.to_string(),
                confidence_display: format_confidence(classification.confidence),
                label: classification.label,
                class_index: classification.class_index,
                confidence: classification.confidence,
                predictions: classification.predictions,
                class_labels: state.class_labels.clone(),
            })
        }
        Ok(Err(err)) => {
            warn!("[{}] {}", request_id, err);
            HttpResponse::build(status_for(&err)).json(err.to_api_error())
        }
        Err(err) => {
            error!("[{}] Inference worker failed: {}", request_id, err);
            HttpResponse::InternalServerError().json(ApiError::new(
                ErrorKind::InferenceFailure,
                "Inference worker failed",
            ))
        }
    }
}

/// Reads the `image` field into memory, refusing anything over `max_bytes`.
async fn read_image_field(
    payload: &mut Multipart,
    max_bytes: usize,
) -> Result<Vec<u8>, (StatusCode, ClassifierError)> {
    let malformed = |e: actix_multipart::MultipartError| {
        (
            StatusCode::BAD_REQUEST,
            ClassifierError::UploadRejected(format!("malformed upload: {}", e)),
        )
    };

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(malformed)?;
            if image_data.len() + data.len() > max_bytes {
                return Err((
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ClassifierError::UploadRejected(format!(
                        "image exceeds the {} byte limit",
                        max_bytes
                    )),
                ));
            }
            image_data.extend_from_slice(&data);
        }

        if image_data.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                ClassifierError::UploadRejected("uploaded file is empty".into()),
            ));
        }
        return Ok(image_data);
    }

    Err((
        StatusCode::BAD_REQUEST,
        ClassifierError::UploadRejected(format!("no `{}` field in upload", IMAGE_FIELD)),
    ))
}

fn status_for(err: &ClassifierError) -> StatusCode {
    match err {
        e if e.is_page_fatal() => StatusCode::SERVICE_UNAVAILABLE,
        ClassifierError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ClassifierError::UploadRejected(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
