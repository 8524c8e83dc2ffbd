use shared::UNKNOWN_LABEL;

use crate::config::DecisionPolicy;
use crate::error::ClassifierError;

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub class_index: usize,
    pub label: String,
    pub confidence: f64,
}

/// Maps raw model output to a class name under the configured policy.
#[derive(Debug, Clone)]
pub struct LabelMapper {
    policy: DecisionPolicy,
    class_names: Vec<String>,
}

impl LabelMapper {
    pub fn new(policy: DecisionPolicy, class_names: Vec<String>) -> Self {
        Self {
            policy,
            class_names,
        }
    }

    pub fn decide(&self, predictions: &[f64]) -> Result<Decision, ClassifierError> {
        if let Some(value) = predictions.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ClassifierError::Inference(format!(
                "model output {} is not a probability in [0, 1]",
                value
            )));
        }
        match self.policy {
            DecisionPolicy::Threshold { threshold } => self.threshold(predictions, threshold),
            DecisionPolicy::ArgMax => self.arg_max(predictions),
        }
    }

    // Index 1 is the positive class; a probability equal to the threshold is negative.
    fn threshold(&self, predictions: &[f64], threshold: f64) -> Result<Decision, ClassifierError> {
        let probability = match predictions {
            [p] => *p,
            _ => {
                return Err(ClassifierError::Inference(format!(
                    "threshold policy expects a single probability, model returned {} values",
                    predictions.len()
                )));
            }
        };

        let (class_index, confidence) = if probability > threshold {
            (1, probability)
        } else {
            (0, 1.0 - probability)
        };
        Ok(self.decision(class_index, confidence))
    }

    fn arg_max(&self, predictions: &[f64]) -> Result<Decision, ClassifierError> {
        let (class_index, confidence) = predictions
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| ClassifierError::Inference("model returned no values".into()))?;
        Ok(self.decision(class_index, confidence))
    }

    fn decision(&self, class_index: usize, confidence: f64) -> Decision {
        let label = match self.class_names.get(class_index) {
            Some(name) => name.clone(),
            None => {
                log::warn!(
                    "Class index {} has no name ({} configured)",
                    class_index,
                    self.class_names.len()
                );
                UNKNOWN_LABEL.to_string()
            }
        };
        Decision {
            class_index,
            label,
            confidence,
        }
    }
}
