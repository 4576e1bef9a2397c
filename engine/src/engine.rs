use crate::{
    config::Config,
    error::{validation_error, AppError},
    explain,
    features::{FeatureExtractor, FeatureVector, ModelInput, FEATURE_WIDTH},
    model::{Classifier, ModelArtifact},
    scorer::Scorer,
    types::{PredictionResult, Score, Segment},
};
use std::{sync::Arc, time::Instant};
use tracing::info;

pub struct PhishingEngine {
    extractor: FeatureExtractor,
    scorer: Scorer,
}

impl PhishingEngine {
    /// Loads the model artifact named in `config`. Any failure here is fatal to startup.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        info!("Initializing phishing engine...");

        let artifact = ModelArtifact::load(&config.model_path)?;
        let engine = Self::with_classifier(config, Arc::new(artifact));

        info!("Phishing engine initialized successfully");
        Ok(engine)
    }

    pub fn with_classifier(config: &Config, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            extractor: FeatureExtractor::new(&config.features),
            scorer: Scorer::new(classifier),
        }
    }

    pub fn assess_url(&self, url: &str) -> PredictionResult {
        let start = Instant::now();

        let features = self.extractor.extract(url);
        let score = self.scorer.score(&features);
        let highlighted = self.extractor.highlight(url);

        let result = build_result(&features, score, highlighted);
        record(&result, start);
        result
    }

    /// Scores a raw vector in slot order, as submitted by the bare feature form.
    pub fn assess_raw(&self, values: &[i64]) -> Result<PredictionResult, AppError> {
        let start = Instant::now();

        if values.len() != FEATURE_WIDTH {
            return Err(AppError::InvalidInput(format!(
                "expected {} feature values, got {}",
                FEATURE_WIDTH,
                values.len()
            )));
        }
        let mut input: ModelInput = [0.0; FEATURE_WIDTH];
        for (slot, value) in input.iter_mut().zip(values) {
            *slot = *value as f64;
        }

        let features = FeatureVector::from_model_input(&input);
        let score = self.scorer.score_input(&input);

        let result = build_result(&features, score, Vec::new());
        record(&result, start);
        Ok(result)
    }
}

/// Parses submitted field values as integers, rejecting the first one that isn't.
pub fn parse_raw_values<'a, I>(values: I) -> Result<Vec<i64>, AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map_err(|_| validation_error(&format!("feature value {:?} is not an integer", v)))
        })
        .collect()
}

fn build_result(features: &FeatureVector, score: Score, highlighted: Vec<Segment>) -> PredictionResult {
    let reasons = explain::reasons(features);
    let risk_tier = explain::risk_tier(score.label, explain::tier_count(features));
    let advisory = explain::advisory(score.label, risk_tier).map(String::from);

    PredictionResult {
        label: score.label,
        confidence: score.confidence,
        reasons,
        risk_tier,
        advisory,
        highlighted,
    }
}

fn record(result: &PredictionResult, start: Instant) {
    let latency = start.elapsed().as_secs_f64() * 1000.0;
    metrics::counter!("assessments_total", "label" => result.label.as_str()).increment(1);
    metrics::histogram!("assessment_duration_ms").record(latency);

    info!(
        "Assessment completed: {:?} ({:.2}%, risk {:?}, {} reasons) in {:.3}ms",
        result.label,
        result.confidence,
        result.risk_tier,
        result.reasons.len(),
        latency
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::FeatureConfig,
        types::{ClassProbabilities, Label, RiskTier},
    };

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_proba(&self, _input: &ModelInput) -> ClassProbabilities {
            ClassProbabilities { legitimate: 1.0 - self.0, phishing: self.0 }
        }
    }

    fn config() -> Config {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            model_path: "unused.json".to_string(),
            features: FeatureConfig::default(),
        }
    }

    fn engine(phishing: f64) -> PhishingEngine {
        PhishingEngine::with_classifier(&config(), Arc::new(Fixed(phishing)))
    }

    #[test]
    fn test_phishing_with_many_reasons_is_high() {
        let result = engine(0.97).assess_url("http://user@10.0.0.1/secure-login");
        assert_eq!(result.label, Label::Phishing);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert_eq!(result.confidence, 97.0);
        assert!(result.advisory.is_none());
        assert!(result.highlighted.iter().any(|s| s.suspicious));
    }

    #[test]
    fn test_legitimate_with_many_reasons_is_medium() {
        let result = engine(0.1).assess_url("http://my-site.example.com/");
        assert_eq!(result.label, Label::Legitimate);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.risk_tier, RiskTier::Medium);
        assert!(result.advisory.unwrap().contains("proceed with caution"));
    }

    #[test]
    fn test_clean_url_is_low() {
        let result = engine(0.02).assess_url("https://example.com/");
        assert!(result.reasons.is_empty());
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.advisory.as_deref(), Some("This website appears safe."));
    }

    #[test]
    fn test_keyword_lifts_single_reason_to_high() {
        let result = engine(0.9).assess_url("http://example.com/login");
        assert_eq!(result.label, Label::Phishing);
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_raw_vector() {
        let mut values = vec![0i64; FEATURE_WIDTH];
        values[3] = 1;
        values[7] = 1;
        let result = engine(0.8).assess_raw(&values).unwrap();
        assert_eq!(result.label, Label::Phishing);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert!(result.highlighted.is_empty());
    }

    #[test]
    fn test_raw_vector_wrong_width() {
        let err = engine(0.5).assess_raw(&[1, 0, 1]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_raw_values() {
        assert_eq!(parse_raw_values(["1", " 0 ", "-1"]).unwrap(), vec![1, 0, -1]);
        assert!(parse_raw_values(["1", "x"]).is_err());
    }

    #[test]
    fn test_missing_model_is_fatal() {
        assert!(PhishingEngine::new(&config()).is_err());
    }
}
