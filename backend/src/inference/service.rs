use std::path::{Path, PathBuf};
use std::time::Instant;

use super::labels::{Decision, LabelMapper};
use super::model::{Classifier, ModelLoader};
use super::preprocess::Preprocessor;
use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::resolve::kaggle::ArtifactRegistry;
use crate::resolve::ModelResolver;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub class_index: usize,
    pub confidence: f64,
    pub predictions: Vec<f64>,
}

/// The loaded model plus everything needed to turn an upload into a label.
/// Built once at startup and shared read-only afterwards.
pub struct InferenceService {
    classifier: Box<dyn Classifier>,
    preprocessor: Preprocessor,
    labels: LabelMapper,
    model_path: PathBuf,
}

impl InferenceService {
    pub fn new(classifier: Box<dyn Classifier>, config: &ClassifierConfig, model_path: &Path) -> Self {
        Self {
            classifier,
            preprocessor: Preprocessor::new(&config.input),
            labels: LabelMapper::new(config.decision, config.classes.clone()),
            model_path: model_path.to_path_buf(),
        }
    }

    /// Resolves the model artifact (local first, then remote) and loads it.
    pub async fn initialize<L, R>(
        config: &ClassifierConfig,
        loader: &L,
        registry: &R,
    ) -> Result<Self, ClassifierError>
    where
        L: ModelLoader,
        R: ArtifactRegistry,
    {
        let artifact = ModelResolver::new(&config.model, registry).resolve().await?;
        let t = Instant::now();
        let classifier = loader.load(&artifact.path)?;
        log::info!(
            "Model {} ({:?}) loaded in {:?}",
            artifact.path.display(),
            artifact.origin,
            t.elapsed()
        );
        Ok(Self::new(classifier, config, &artifact.path))
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn classify(&self, image_data: &[u8]) -> Result<Classification, ClassifierError> {
        let t = Instant::now();
        let tensor = self.preprocessor.preprocess(image_data)?;
        log::debug!("[preprocess]: {:?}", t.elapsed());

        let t = Instant::now();
        let predictions = self.classifier.predict(&tensor)?;
        log::debug!("[model]: {:?}", t.elapsed());

        let Decision {
            class_index,
            label,
            confidence,
        } = self.labels.decide(&predictions)?;
        Ok(Classification {
            label,
            class_index,
            confidence,
            predictions,
        })
    }
}
