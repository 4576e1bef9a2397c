use crate::{
    features::FeatureVector,
    types::{Label, RiskTier},
};

/// Description per explainable slot, in slot order. The keyword slot has none.
const REASONS: [&str; 8] = [
    "URL uses an IP address instead of a domain name",
    "URL is unusually long",
    "URL uses a known link-shortening service",
    "URL contains an '@' symbol",
    "URL contains a '//' redirect marker",
    "Domain name contains a hyphen",
    "Domain has an excessive number of subdomains",
    "URL does not use HTTPS",
];

const SAFE: &str = "This website appears safe.";
const CAUTION: &str = "This website appears mostly safe, but proceed with caution.";

pub fn reasons(features: &FeatureVector) -> Vec<String> {
    features
        .flags()
        .iter()
        .zip(REASONS.iter())
        .filter(|(flag, _)| **flag)
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Signals counted toward the tier: the explainable reasons plus the keyword hit,
/// which never shows up in the reasons list.
pub fn tier_count(features: &FeatureVector) -> usize {
    reasons(features).len() + features.suspicious_keyword as usize
}

/// A legitimate verdict with two or more signals still reports Medium.
pub fn risk_tier(label: Label, signal_count: usize) -> RiskTier {
    if label == Label::Phishing && signal_count >= 2 {
        RiskTier::High
    } else if signal_count >= 2 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

pub fn advisory(label: Label, tier: RiskTier) -> Option<&'static str> {
    match (label, tier) {
        (Label::Legitimate, RiskTier::Low) => Some(SAFE),
        (Label::Legitimate, RiskTier::Medium) => Some(CAUTION),
        _ => None,
    }
}
