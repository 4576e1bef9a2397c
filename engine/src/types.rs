use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Label {
    Legitimate,
    Phishing,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Legitimate => "legitimate",
            Label::Phishing => "phishing",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClassProbabilities {
    pub legitimate: f64,
    pub phishing: f64,
}

impl ClassProbabilities {
    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::Legitimate => self.legitimate,
            Label::Phishing => self.phishing,
        }
    }

    /// Ties go to the legitimate class, like an argmax over `[legitimate, phishing]`.
    pub fn argmax(&self) -> Label {
        if self.phishing > self.legitimate {
            Label::Phishing
        } else {
            Label::Legitimate
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub label: Label,
    pub probabilities: ClassProbabilities,
    /// Probability of `label`, as a percentage rounded to two decimals.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub suspicious: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub risk_tier: RiskTier,
    pub advisory: Option<String>,
    pub highlighted: Vec<Segment>,
}
