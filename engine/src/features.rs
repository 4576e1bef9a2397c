use crate::{config::FeatureConfig, types::Segment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Input width the model artifacts are trained against.
pub const FEATURE_WIDTH: usize = 30;

/// Slots 0..=8 are populated, the rest are zero-filled.
pub const POPULATED_SLOTS: usize = 9;

pub type ModelInput = [f64; FEATURE_WIDTH];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ip_literal: bool,
    pub long_url: bool,
    pub shortener: bool,
    pub at_symbol: bool,
    pub double_slash: bool,
    pub hyphenated_host: bool,
    pub many_subdomains: bool,
    pub no_https: bool,
    pub suspicious_keyword: bool,
}

impl FeatureVector {
    /// Flags in model slot order.
    pub fn flags(&self) -> [bool; POPULATED_SLOTS] {
        [
            self.ip_literal,
            self.long_url,
            self.shortener,
            self.at_symbol,
            self.double_slash,
            self.hyphenated_host,
            self.many_subdomains,
            self.no_https,
            self.suspicious_keyword,
        ]
    }

    pub fn to_model_input(&self) -> ModelInput {
        let mut input = [0.0; FEATURE_WIDTH];
        for (slot, flag) in input.iter_mut().zip(self.flags()) {
            *slot = if flag { 1.0 } else { 0.0 };
        }
        input
    }

    /// Reads the populated slots of a raw vector back as flags (non-zero is set).
    pub fn from_model_input(input: &ModelInput) -> Self {
        let set = |i: usize| input[i] != 0.0;
        Self {
            ip_literal: set(0),
            long_url: set(1),
            shortener: set(2),
            at_symbol: set(3),
            double_slash: set(4),
            hyphenated_host: set(5),
            many_subdomains: set(6),
            no_https: set(7),
            suspicious_keyword: set(8),
        }
    }

    pub fn triggered(&self) -> usize {
        self.flags().iter().filter(|f| **f).count()
    }
}

pub struct FeatureExtractor {
    config: FeatureConfig,
    ip_pattern: Regex,
    keyword_pattern: Option<Regex>,
    shortener_pattern: Option<Regex>,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        let ip_pattern = Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}")
            .expect("static IP pattern is valid");

        Self {
            config: config.clone(),
            ip_pattern,
            keyword_pattern: alternation(&config.keywords, true),
            shortener_pattern: alternation(&config.shorteners, false),
        }
    }

    pub fn extract(&self, url: &str) -> FeatureVector {
        let host = raw_host(url);
        if host.is_none() {
            debug!("No host component in {:?}, host flags default to 0", url);
        }
        let host = host.unwrap_or("");

        let features = FeatureVector {
            ip_literal: self.ip_pattern.is_match(url),
            long_url: url.chars().count() > self.config.length_threshold,
            shortener: self
                .config
                .shorteners
                .iter()
                .any(|s| !s.is_empty() && url.contains(s.as_str())),
            at_symbol: url.contains('@'),
            double_slash: url.matches("//").count() > 1,
            hyphenated_host: host.contains('-'),
            many_subdomains: host.matches('.').count() > 2,
            no_https: !url.starts_with("https"),
            suspicious_keyword: self.config.check_keywords
                && self.keyword_pattern.as_ref().is_some_and(|p| p.is_match(url)),
        };

        debug!("Extracted {} triggered features from {:?}", features.triggered(), url);
        features
    }

    /// Splits `url` into runs, marking the substrings that drove a flag.
    pub fn highlight(&self, url: &str) -> Vec<Segment> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();

        ranges.extend(self.ip_pattern.find_iter(url).map(|m| (m.start(), m.end())));
        if let Some(pattern) = &self.shortener_pattern {
            ranges.extend(pattern.find_iter(url).map(|m| (m.start(), m.end())));
        }
        if self.config.check_keywords {
            if let Some(pattern) = &self.keyword_pattern {
                ranges.extend(pattern.find_iter(url).map(|m| (m.start(), m.end())));
            }
        }
        ranges.extend(url.match_indices('@').map(|(i, s)| (i, i + s.len())));
        ranges.extend(url.match_indices("//").skip(1).map(|(i, s)| (i, i + s.len())));

        segments(url, merge(ranges))
    }
}

/// Host text as submitted, without userinfo or port. The parser only decides whether
/// there is a host at all; its normalised form (lowercased, IPv4-canonicalised) is not used.
fn raw_host(url: &str) -> Option<&str> {
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return None;
    }

    let (_, rest) = url.split_once("://")?;
    let authority = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .map_or(rest, |end| &rest[..end]);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    let host = if host_port.starts_with('[') {
        host_port.find(']').map_or(host_port, |end| &host_port[..=end])
    } else {
        host_port.split(':').next().unwrap_or(host_port)
    };
    Some(host).filter(|h| !h.is_empty())
}

fn alternation(terms: &[String], case_insensitive: bool) -> Option<Regex> {
    let escaped: Vec<String> = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if escaped.is_empty() {
        return None;
    }
    let flags = if case_insensitive { "(?i)" } else { "" };
    Regex::new(&format!("{}(?:{})", flags, escaped.join("|"))).ok()
}

fn merge(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn segments(url: &str, ranges: Vec<(usize, usize)>) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for (start, end) in ranges {
        if start > cursor {
            out.push(Segment { text: url[cursor..start].to_string(), suspicious: false });
        }
        out.push(Segment { text: url[start..end].to_string(), suspicious: true });
        cursor = end;
    }
    if cursor < url.len() {
        out.push(Segment { text: url[cursor..].to_string(), suspicious: false });
    }
    out
}
