use ndarray::Array4;
use std::path::Path;

use crate::error::ClassifierError;

/// A loaded model: one forward pass over a preprocessed batch of one.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f64>, ClassifierError>;
}

pub trait ModelLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, ClassifierError>;
}

#[cfg(feature = "torch")]
pub use torch::TorchLoader;

#[cfg(feature = "torch")]
mod torch {
    use ndarray::Array4;
    use std::path::Path;
    use std::sync::Mutex;
    use tch::{CModule, Device, Kind, Tensor};

    use super::{Classifier, ModelLoader};
    use crate::error::ClassifierError;

    /// Loads TorchScript archives through libtorch.
    #[derive(Debug, Default)]
    pub struct TorchLoader;

    impl ModelLoader for TorchLoader {
        fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, ClassifierError> {
            let device = Device::cuda_if_available();
            log::info!("Loading TorchScript model {} on {:?}", path.display(), device);
            let module =
                CModule::load_on_device(path, device).map_err(|e| ClassifierError::ModelLoad {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            Ok(Box::new(TorchModel {
                model: Mutex::new(module),
                device,
            }))
        }
    }

    struct TorchModel {
        model: Mutex<CModule>,
        device: Device,
    }

    impl Classifier for TorchModel {
        fn predict(&self, input: &Array4<f32>) -> Result<Vec<f64>, ClassifierError> {
            let data = input
                .as_slice()
                .ok_or_else(|| ClassifierError::Inference("input tensor is not contiguous".into()))?;
            let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
            let tensor = Tensor::from_slice(data).view(shape.as_slice()).to_device(self.device);

            let model = self
                .model
                .lock()
                .map_err(|_| ClassifierError::Inference("model lock poisoned".into()))?;
            let output = model
                .forward_ts(&[tensor])
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

            let output_flat = output.to_kind(Kind::Double).view([-1]);
            let num_elements = output_flat.size()[0] as usize;
            let mut output_vec = vec![0.0f64; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            Ok(output_vec)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn corrupt_archive_is_a_load_failure() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pothole.pt");
            std::fs::write(&path, b"not a torchscript archive").unwrap();

            let err = match TorchLoader.load(&path) {
                Ok(_) => panic!("garbage should not load"),
                Err(err) => err,
            };
            assert!(matches!(err, ClassifierError::ModelLoad { ref path, .. } if path.ends_with("pothole.pt")));
            assert!(!err.to_string().contains("no model runtime"));
        }
    }
}

/// Stand-in used when the binary is built without a model runtime.
#[cfg(not(feature = "torch"))]
#[derive(Debug, Default)]
pub struct TorchLoader;

#[cfg(not(feature = "torch"))]
impl ModelLoader for TorchLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, ClassifierError> {
        Err(ClassifierError::ModelLoad {
            path: path.to_path_buf(),
            reason: "this build has no model runtime; rebuild with the `torch` feature enabled".into(),
        })
    }
}

#[cfg(all(test, not(feature = "torch")))]
mod tests {
    use super::*;

    #[test]
    fn runtime_less_build_reports_load_failure() {
        let err = match TorchLoader.load(Path::new("model/pothole.pt")) {
            Ok(_) => panic!("load should fail without a runtime"),
            Err(err) => err,
        };
        assert!(matches!(err, ClassifierError::ModelLoad { .. }));
        assert!(err.is_page_fatal());
    }
}
