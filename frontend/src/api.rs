use gloo_file::File as GlooFile;
use gloo_net::http::{Request, Response};
use shared::{ApiError, InferenceResponse, PageStatus};

pub async fn fetch_status() -> Result<PageStatus, String> {
    let response = Request::get("/api/status")
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }
    response
        .json::<PageStatus>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

pub async fn classify(file: GlooFile) -> Result<InferenceResponse, String> {
    let form_data =
        web_sys::FormData::new().map_err(|_| "Failed to build upload form.".to_string())?;
    form_data
        .append_with_blob_and_filename("image", file.as_ref(), &file.name())
        .map_err(|_| "Failed to attach the image.".to_string())?;

    let request = Request::post("/api/inference")
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?;

    let response = request
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }
    response
        .json::<InferenceResponse>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

// The backend answers failures with an `ApiError` body; fall back to the raw text.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => err.message,
        Err(_) => format!("Server error: {} - {}", status, body),
    }
}
