use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::RemoteSource;
use crate::error::ClassifierError;

/// Something that can place a dataset archive into a local directory.
pub trait ArtifactRegistry {
    fn download(
        &self,
        remote: &RemoteSource,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, ClassifierError>>;
}

#[derive(Clone, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    key: String,
}

impl fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KaggleCredentials {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }

    /// Environment first, then `kaggle.json` under `KAGGLE_CONFIG_DIR` or `~/.kaggle`.
    pub fn discover() -> Result<Self, String> {
        let config_dir = std::env::var("KAGGLE_CONFIG_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".kaggle")));
        Self::from_sources(
            std::env::var("KAGGLE_USERNAME").ok(),
            std::env::var("KAGGLE_KEY").ok(),
            config_dir.as_deref(),
        )
    }

    pub fn from_sources(
        username: Option<String>,
        key: Option<String>,
        config_dir: Option<&Path>,
    ) -> Result<Self, String> {
        if let (Some(username), Some(key)) = (username, key) {
            if !username.is_empty() && !key.is_empty() {
                return Ok(Self::new(username, key));
            }
        }

        let Some(config_dir) = config_dir else {
            return Err(missing_credentials());
        };
        let path = config_dir.join("kaggle.json");
        if !path.is_file() {
            return Err(missing_credentials());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let credentials: KaggleCredentials = serde_json::from_str(&contents)
            .map_err(|_| format!("{} is not a valid credentials file", path.display()))?;
        if credentials.username.is_empty() || credentials.key.is_empty() {
            return Err(format!("{} has an empty username or key", path.display()));
        }
        Ok(credentials)
    }
}

fn missing_credentials() -> String {
    "no credentials found; set KAGGLE_USERNAME and KAGGLE_KEY or provide kaggle.json".to_string()
}

/// Downloads dataset archives from the Kaggle public API.
pub struct KaggleRegistry {
    client: reqwest::Client,
    credentials: Result<KaggleCredentials, String>,
}

impl KaggleRegistry {
    pub fn new(credentials: Result<KaggleCredentials, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn from_env() -> Self {
        let credentials = KaggleCredentials::discover();
        match &credentials {
            Ok(c) => log::info!("Kaggle credentials found for user {}", c.username),
            Err(_) => log::debug!("No Kaggle credentials available"),
        }
        Self::new(credentials)
    }
}

impl ArtifactRegistry for KaggleRegistry {
    async fn download(
        &self,
        remote: &RemoteSource,
        dest_dir: &Path,
    ) -> Result<PathBuf, ClassifierError> {
        let credentials = self
            .credentials
            .as_ref()
            .map_err(|reason| ClassifierError::RemoteAuth(reason.clone()))?;
        let url = download_url(&remote.api_base, &remote.dataset)?;

        log::info!("Downloading dataset {} from {}", remote.dataset, url);
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.key))
            .send()
            .await
            .map_err(|e| ClassifierError::RemoteDownload(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &remote.dataset));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClassifierError::RemoteDownload(e.without_url().to_string()))?;

        let slug = remote.dataset.rsplit('/').next().unwrap_or("dataset");
        let archive_path = dest_dir.join(format!("{}.zip", slug));
        tokio::fs::write(&archive_path, &bytes).await.map_err(|e| {
            ClassifierError::RemoteDownload(format!(
                "cannot write archive {}: {}",
                archive_path.display(),
                e
            ))
        })?;
        log::info!("Downloaded {} bytes to {}", bytes.len(), archive_path.display());
        Ok(archive_path)
    }
}

pub fn download_url(api_base: &str, dataset: &str) -> Result<Url, ClassifierError> {
    let (owner, slug) = dataset.split_once('/').ok_or_else(|| {
        ClassifierError::RemoteDownload(format!("invalid dataset id {:?}", dataset))
    })?;
    let mut url = Url::parse(api_base)
        .map_err(|e| ClassifierError::RemoteDownload(format!("invalid api base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ClassifierError::RemoteDownload("api base cannot carry a path".into()))?
        .pop_if_empty()
        .extend(["datasets", "download", owner, slug]);
    Ok(url)
}

fn status_error(status: StatusCode, dataset: &str) -> ClassifierError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClassifierError::RemoteAuth(format!(
            "registry refused the credentials ({})",
            status
        )),
        StatusCode::NOT_FOUND => {
            ClassifierError::RemoteDownload(format!("dataset {} not found", dataset))
        }
        _ => ClassifierError::RemoteDownload(format!("registry answered {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pair_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kaggle.json"),
            r#"{"username":"file-user","key":"file-key"}"#,
        )
        .unwrap();
        let creds = KaggleCredentials::from_sources(
            Some("env-user".into()),
            Some("env-key".into()),
            Some(dir.path()),
        )
        .unwrap();
        assert_eq!(creds.username, "env-user");
    }

    #[test]
    fn falls_back_to_kaggle_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kaggle.json"),
            r#"{"username":"file-user","key":"file-key"}"#,
        )
        .unwrap();
        let creds = KaggleCredentials::from_sources(Some("only-user".into()), None, Some(dir.path()))
            .unwrap();
        assert_eq!(creds.username, "file-user");
    }

    #[test]
    fn missing_everything_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = KaggleCredentials::from_sources(None, None, Some(dir.path())).unwrap_err();
        assert!(err.contains("KAGGLE_USERNAME"));
        assert!(KaggleCredentials::from_sources(None, None, None).is_err());
    }

    #[test]
    fn malformed_file_does_not_echo_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kaggle.json"), "username=me key=s3cr3t").unwrap();
        let err = KaggleCredentials::from_sources(None, None, Some(dir.path())).unwrap_err();
        assert!(!err.contains("s3cr3t"));
    }

    #[test]
    fn debug_redacts_key() {
        let creds = KaggleCredentials::new("alice", "s3cr3t");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("s3cr3t"));
    }

    #[test]
    fn builds_download_url() {
        let url = download_url("https://www.kaggle.com/api/v1", "roads/pothole-model").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.kaggle.com/api/v1/datasets/download/roads/pothole-model"
        );
        let url = download_url("http://localhost:9000/api/", "a/b").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/datasets/download/a/b");
    }

    #[test]
    fn auth_statuses_map_to_auth_failure() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "a/b"),
            ClassifierError::RemoteAuth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "a/b"),
            ClassifierError::RemoteAuth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "a/b"),
            ClassifierError::RemoteDownload(_)
        ));
    }

    #[actix_web::test]
    async fn download_without_credentials_fails_before_any_request() {
        let registry = KaggleRegistry::new(Err(missing_credentials()));
        let remote = RemoteSource {
            dataset: "roads/pothole-model".into(),
            extensions: vec!["pt".into()],
            // Unroutable on purpose: reaching the network would be a bug.
            api_base: "http://127.0.0.1:9".into(),
            scratch_dir: None,
            persist_to: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = registry.download(&remote, dir.path()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::RemoteAuth(_)));
    }
}
