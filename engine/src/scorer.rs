use crate::{
    features::{FeatureVector, ModelInput},
    model::Classifier,
    types::Score,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Scorer {
    classifier: Arc<dyn Classifier>,
}

impl Scorer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn score(&self, features: &FeatureVector) -> Score {
        self.score_input(&features.to_model_input())
    }

    pub fn score_input(&self, input: &ModelInput) -> Score {
        let label = self.classifier.predict_label(input);
        let probabilities = self.classifier.predict_proba(input);
        let confidence = round2(probabilities.of(label).clamp(0.0, 1.0) * 100.0);

        debug!("Classifier verdict {:?} at {:.2}%", label, confidence);
        Score { label, probabilities, confidence }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
