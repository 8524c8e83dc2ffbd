use shared::{ApiError, ErrorKind};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("No model file found (looked for: {})", display_paths(.0))]
    ModelNotFound(Vec<PathBuf>),
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("Remote registry authentication failed: {0}")]
    RemoteAuth(String),
    #[error("Remote model download failed: {0}")]
    RemoteDownload(String),
    #[error("Could not decode the uploaded image: {0}")]
    ImageDecode(String),
    #[error("Upload rejected: {0}")]
    UploadRejected(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::ModelNotFound(_) => ErrorKind::ModelNotFound,
            ClassifierError::ModelLoad { .. } => ErrorKind::ModelLoadFailure,
            ClassifierError::RemoteAuth(_) => ErrorKind::RemoteAuthFailure,
            ClassifierError::RemoteDownload(_) => ErrorKind::RemoteDownloadFailure,
            ClassifierError::ImageDecode(_) => ErrorKind::ImageDecodeFailure,
            ClassifierError::UploadRejected(_) => ErrorKind::UploadRejected,
            ClassifierError::Inference(_) => ErrorKind::InferenceFailure,
        }
    }

    pub fn is_page_fatal(&self) -> bool {
        self.kind().is_page_fatal()
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.kind(), self.to_string())
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::ImageDecode(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no candidates configured".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_candidate() {
        let err = ClassifierError::ModelNotFound(vec![
            PathBuf::from("model/a.pt"),
            PathBuf::from("model/a.ts"),
        ]);
        assert_eq!(
            err.to_string(),
            "No model file found (looked for: model/a.pt, model/a.ts)"
        );
        assert!(err.is_page_fatal());
    }

    #[test]
    fn decode_errors_are_request_local() {
        let err = ClassifierError::ImageDecode("bad magic".into());
        let api = err.to_api_error();
        assert_eq!(api.kind, ErrorKind::ImageDecodeFailure);
        assert!(!err.is_page_fatal());
        assert!(api.message.contains("bad magic"));
    }
}
