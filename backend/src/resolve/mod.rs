pub mod archive;
pub mod kaggle;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{ModelSource, RemoteSource};
use crate::error::ClassifierError;
use kaggle::ArtifactRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Local,
    Remote,
}

/// A model file ready to be loaded. A remote download keeps its scratch
/// directory alive until this value is dropped.
#[derive(Debug)]
pub struct ResolvedArtifact {
    pub path: PathBuf,
    pub origin: ArtifactOrigin,
    _scratch: Option<TempDir>,
}

pub struct ModelResolver<'a, R> {
    source: &'a ModelSource,
    registry: &'a R,
}

impl<'a, R: ArtifactRegistry> ModelResolver<'a, R> {
    pub fn new(source: &'a ModelSource, registry: &'a R) -> Self {
        Self { source, registry }
    }

    pub async fn resolve(&self) -> Result<ResolvedArtifact, ClassifierError> {
        if let Some(path) = resolve_local(&self.source.candidates) {
            log::info!("Using local model {}", path.display());
            return Ok(ResolvedArtifact {
                path,
                origin: ArtifactOrigin::Local,
                _scratch: None,
            });
        }

        match &self.source.remote {
            Some(remote) => {
                log::info!(
                    "No local model among {} candidate(s), fetching {}",
                    self.source.candidates.len(),
                    remote.dataset
                );
                self.fetch_remote(remote).await
            }
            None => Err(ClassifierError::ModelNotFound(self.source.candidates.clone())),
        }
    }

    async fn fetch_remote(&self, remote: &RemoteSource) -> Result<ResolvedArtifact, ClassifierError> {
        let scratch = scratch_dir(remote.scratch_dir.as_deref())?;
        let archive_path = self.registry.download(remote, scratch.path()).await?;
        let model_path = archive::extract_model(&archive_path, &remote.extensions, scratch.path())?;

        if let Err(e) = std::fs::remove_file(&archive_path) {
            log::warn!("Could not delete archive {}: {}", archive_path.display(), e);
        }

        if let Some(target) = &remote.persist_to {
            match persist(&model_path, target) {
                Ok(()) => {
                    log::info!("Saved downloaded model to {}", target.display());
                    return Ok(ResolvedArtifact {
                        path: target.clone(),
                        origin: ArtifactOrigin::Remote,
                        _scratch: None,
                    });
                }
                Err(e) => log::warn!("Could not save model to {}: {}", target.display(), e),
            }
        }

        Ok(ResolvedArtifact {
            path: model_path,
            origin: ArtifactOrigin::Remote,
            _scratch: Some(scratch),
        })
    }
}

/// First candidate that exists as a regular file, in configuration order.
pub fn resolve_local(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

// A fresh directory per attempt, so a half-written download never meets the next one.
fn scratch_dir(parent: Option<&Path>) -> Result<TempDir, ClassifierError> {
    let builder = {
        let mut builder = tempfile::Builder::new();
        builder.prefix("model-download-");
        builder
    };
    let dir = match parent {
        Some(parent) => std::fs::create_dir_all(parent).and_then(|_| builder.tempdir_in(parent)),
        None => builder.tempdir(),
    };
    dir.map_err(|e| ClassifierError::RemoteDownload(format!("cannot create scratch directory: {}", e)))
}

fn persist(model_path: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::copy(model_path, target)?;
    Ok(())
}
