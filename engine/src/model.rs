//! Pre-trained classifier artifacts.
//!
//! An artifact is loaded once at startup and shared read-only behind the
//! [`Classifier`] trait. Two shapes are understood: a logistic model over the
//! full feature width, and a forest of binary decision trees whose leaves hold
//! class distributions. JSON files go through serde_json, `.bin` files through
//! bincode; both decode into the same [`ModelArtifact`].

use crate::{
    error::{model_error, AppError},
    features::{ModelInput, FEATURE_WIDTH},
    types::{ClassProbabilities, Label},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub trait Classifier: Send + Sync {
    fn predict_proba(&self, input: &ModelInput) -> ClassProbabilities;

    fn predict_label(&self, input: &ModelInput) -> Label {
        self.predict_proba(input).argmax()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub version: String,
    pub model: ModelKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

impl ModelArtifact {
    pub fn load(path: &str) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)?;
        let artifact: ModelArtifact = match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("bin") => bincode::deserialize(&bytes)?,
            Some("json") => serde_json::from_slice(&bytes)?,
            other => {
                return Err(AppError::ModelLoad(format!(
                    "unsupported model artifact extension {:?} for {}",
                    other, path
                )))
            }
        };
        artifact.validate()?;

        info!(
            "Loaded {} model from {}: version {:?}",
            artifact.model.kind_name(),
            path,
            artifact.version
        );
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match &self.model {
            ModelKind::Logistic(m) => m.validate(),
            ModelKind::Forest(m) => m.validate(),
        }
    }
}

impl ModelKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModelKind::Logistic(_) => "logistic",
            ModelKind::Forest(_) => "forest",
        }
    }
}

impl Classifier for ModelArtifact {
    fn predict_proba(&self, input: &ModelInput) -> ClassProbabilities {
        match &self.model {
            ModelKind::Logistic(m) => m.predict_proba(input),
            ModelKind::Forest(m) => m.predict_proba(input),
        }
    }
}

impl LogisticModel {
    fn validate(&self) -> Result<(), AppError> {
        if self.weights.len() != FEATURE_WIDTH {
            return Err(AppError::ModelLoad(format!(
                "logistic model has {} weights, expected {}",
                self.weights.len(),
                FEATURE_WIDTH
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(model_error("logistic model has non-finite parameters"));
        }
        Ok(())
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, input: &ModelInput) -> ClassProbabilities {
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(input.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let phishing = sigmoid(z);
        ClassProbabilities { legitimate: 1.0 - phishing, phishing }
    }
}

impl ForestModel {
    fn validate(&self) -> Result<(), AppError> {
        if self.trees.is_empty() {
            return Err(model_error("forest has no trees"));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| AppError::ModelLoad(format!("tree {}: {}", t, e)))?;
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn predict_proba(&self, input: &ModelInput) -> ClassProbabilities {
        let mut legitimate = 0.0;
        let mut phishing = 0.0;
        for tree in &self.trees {
            let value = tree.leaf_for(input);
            let total: f64 = value.iter().sum();
            legitimate += value[0] / total;
            phishing += value[1] / total;
        }
        let n = self.trees.len() as f64;
        ClassProbabilities { legitimate: legitimate / n, phishing: phishing / n }
    }
}

impl DecisionTree {
    /// Children must point forward, which rules out cycles.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= FEATURE_WIDTH {
                        return Err(format!("node {} splits on feature {} >= {}", i, feature, FEATURE_WIDTH));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", i, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != 2
                        || value.iter().any(|v| !v.is_finite() || *v < 0.0)
                        || value.iter().sum::<f64>() <= 0.0
                    {
                        return Err(format!("node {} is not a two-class distribution", i));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_for(&self, input: &ModelInput) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if input[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn logistic(intercept: f64, first: f64) -> ModelArtifact {
        let mut weights = vec![0.0; FEATURE_WIDTH];
        weights[0] = first;
        ModelArtifact {
            version: "test".to_string(),
            model: ModelKind::Logistic(LogisticModel { intercept, weights }),
        }
    }

    fn stump() -> ModelArtifact {
        // slot 0 set -> mostly phishing
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.5, left: 1, right: 2 },
                TreeNode::Leaf { value: vec![9.0, 1.0] },
                TreeNode::Leaf { value: vec![1.0, 3.0] },
            ],
        };
        ModelArtifact {
            version: "stump".to_string(),
            model: ModelKind::Forest(ForestModel { trees: vec![tree] }),
        }
    }

    #[test]
    fn test_logistic_probabilities() {
        let model = logistic(0.0, 4.0);
        let zero = [0.0; FEATURE_WIDTH];
        let p = model.predict_proba(&zero);
        assert!((p.phishing - 0.5).abs() < 1e-12);

        let mut input = [0.0; FEATURE_WIDTH];
        input[0] = 1.0;
        let p = model.predict_proba(&input);
        assert!(p.phishing > 0.98);
        assert!((p.legitimate + p.phishing - 1.0).abs() < 1e-12);
        assert_eq!(model.predict_label(&input), Label::Phishing);
    }

    #[test]
    fn test_forest_leaf_normalisation() {
        let model = stump();
        let zero = [0.0; FEATURE_WIDTH];
        let p = model.predict_proba(&zero);
        assert!((p.legitimate - 0.9).abs() < 1e-12);
        assert_eq!(model.predict_label(&zero), Label::Legitimate);

        let mut input = [0.0; FEATURE_WIDTH];
        input[0] = 1.0;
        let p = model.predict_proba(&input);
        assert!((p.phishing - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let artifact = ModelArtifact {
            version: String::new(),
            model: ModelKind::Logistic(LogisticModel { intercept: 0.0, weights: vec![1.0; 29] }),
        };
        assert!(matches!(artifact.validate(), Err(AppError::ModelLoad(_))));
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Leaf { value: vec![1.0, 0.0] },
                TreeNode::Split { feature: 0, threshold: 0.5, left: 0, right: 0 },
            ],
        };
        let artifact = ModelArtifact {
            version: String::new(),
            model: ModelKind::Forest(ForestModel { trees: vec![tree] }),
        };
        assert!(artifact.validate().is_err());

        let bad_feature = DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: FEATURE_WIDTH, threshold: 0.5, left: 1, right: 2 },
                TreeNode::Leaf { value: vec![1.0, 0.0] },
                TreeNode::Leaf { value: vec![0.0, 1.0] },
            ],
        };
        let artifact = ModelArtifact {
            version: String::new(),
            model: ModelKind::Forest(ForestModel { trees: vec![bad_feature] }),
        };
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_load_json_and_bincode() {
        let artifact = stump();

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(serde_json::to_string(&artifact).unwrap().as_bytes()).unwrap();
        let loaded = ModelArtifact::load(json.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.version, "stump");

        let mut bin = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        bin.write_all(&bincode::serialize(&artifact).unwrap()).unwrap();
        let loaded = ModelArtifact::load(bin.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.model.kind_name(), "forest");
    }

    #[test]
    fn test_load_failures_are_errors() {
        assert!(matches!(ModelArtifact::load("/nonexistent/model.json"), Err(AppError::Io(_))));

        let mut corrupt = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        corrupt.write_all(b"{ not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(corrupt.path().to_str().unwrap()),
            Err(AppError::Serialization(_))
        ));

        let mut pickle = tempfile::Builder::new().suffix(".pkl").tempfile().unwrap();
        pickle.write_all(b"\x80\x04").unwrap();
        assert!(matches!(
            ModelArtifact::load(pickle.path().to_str().unwrap()),
            Err(AppError::ModelLoad(_))
        ));
    }
}
