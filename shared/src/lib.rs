use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Label reported when the decided class index has no configured name.
pub const UNKNOWN_LABEL: &str = "unknown class";

/// Image types the upload control accepts.
pub const ACCEPTED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// File extensions recognised when the browser reports no usable MIME type.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Client-side pre-check for a picked file. The server still sniffs the bytes.
pub fn is_accepted_upload(mime_type: &str, file_name: &str) -> bool {
    if ACCEPTED_TYPES.contains(&mime_type) {
        return true;
    }
    file_name.rsplit_once('.').is_some_and(|(_, ext)| {
        ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| ext.eq_ignore_ascii_case(accepted))
    })
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ModelNotFound,
    ModelLoadFailure,
    RemoteAuthFailure,
    RemoteDownloadFailure,
    ImageDecodeFailure,
    UploadRejected,
    InferenceFailure,
}

impl ErrorKind {
    /// Page-fatal kinds leave the page without a model; nothing else can be shown.
    pub fn is_page_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::ModelNotFound
                | ErrorKind::ModelLoadFailure
                | ErrorKind::RemoteAuthFailure
                | ErrorKind::RemoteDownloadFailure
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PageStatus {
    pub title: String,
    pub class_labels: Vec<String>,
    pub accepted_types: Vec<String>,
    pub ready: bool,
    pub error: Option<ApiError>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InferenceResponse {
    pub request_id: String,
    pub label: String,
    pub class_index: usize,
    pub confidence: f64,
    pub confidence_display: String,
    pub predictions: Vec<f64>,
    pub class_labels: Vec<String>,
}

/// Two-decimal rendering used everywhere a confidence is shown.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}", confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn model_side_kinds_are_page_fatal() {
        assert!(ErrorKind::ModelNotFound.is_page_fatal());
        assert!(ErrorKind::ModelLoadFailure.is_page_fatal());
        assert!(ErrorKind::RemoteAuthFailure.is_page_fatal());
        assert!(ErrorKind::RemoteDownloadFailure.is_page_fatal());
        assert!(!ErrorKind::ImageDecodeFailure.is_page_fatal());
        assert!(!ErrorKind::UploadRejected.is_page_fatal());
        assert!(!ErrorKind::InferenceFailure.is_page_fatal());
    }

    #[test]
    fn error_kind_names_match_wire_format() {
        let json = serde_json::to_string(&ErrorKind::RemoteAuthFailure).unwrap();
        assert_eq!(json, "\"remote_auth_failure\"");
        assert_eq!(ErrorKind::ImageDecodeFailure.to_string(), "image_decode_failure");
        assert_eq!(
            ErrorKind::from_str("model_not_found").unwrap(),
            ErrorKind::ModelNotFound
        );
    }

    #[test]
    fn uploads_are_accepted_by_type_or_extension() {
        assert!(is_accepted_upload("image/jpeg", "road"));
        assert!(is_accepted_upload("image/png", "road.bin"));
        // Browsers may report an empty or nonstandard type for real photos.
        assert!(is_accepted_upload("", "road.JPG"));
        assert!(is_accepted_upload("image/pjpeg", "road.jpeg"));
        assert!(is_accepted_upload("application/octet-stream", "road.png"));

        assert!(!is_accepted_upload("", "road"));
        assert!(!is_accepted_upload("image/webp", "road.webp"));
        assert!(!is_accepted_upload("text/plain", "notes.txt"));
    }

    #[test]
    fn confidence_uses_two_decimals() {
        assert_eq!(format_confidence(0.82), "0.82");
        assert_eq!(format_confidence(1.0 - 0.10), "0.90");
        assert_eq!(format_confidence(1.0), "1.00");
    }
}
