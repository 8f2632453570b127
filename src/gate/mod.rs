//! Bot-mitigation gate
//!
//! Combines cheap local heuristics into a per-request decision on whether
//! link creation must pass a CAPTCHA challenge first. The expensive
//! external verification call (see [`captcha`]) only happens when one of
//! these signals fires, keeping the common legitimate path low-latency.

use crate::config::GateConfig;

pub mod captcha;

/// User-agent fragments of known automation clients. Case-insensitive
/// substring match.
const SUSPICIOUS_UA_PATTERNS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "curl",
    "wget",
    "python-requests",
    "scrapy",
    "httpclient",
    "go-http-client",
    "java/",
    "headless",
    "phantomjs",
];

/// A single triggered heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    RateLimit,
    SuspiciousUserAgent,
    NoCookies,
    RandomSample,
    Forced,
}

impl GateSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateSignal::RateLimit => "rate_limit",
            GateSignal::SuspiciousUserAgent => "suspicious_user_agent",
            GateSignal::NoCookies => "no_cookies",
            GateSignal::RandomSample => "random_sample",
            GateSignal::Forced => "forced",
        }
    }
}

/// Request-derived inputs to the gate.
#[derive(Debug, Clone)]
pub struct GateSignals<'a> {
    /// Attempts in the session's sliding window, including the current one.
    pub attempts_in_window: usize,
    pub user_agent: Option<&'a str>,
    /// Whether the request carried any Cookie header at all.
    pub has_cookies: bool,
}

/// Per-request decision; never persisted.
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub required: bool,
    pub reasons: Vec<GateSignal>,
}

impl GateDecision {
    /// Comma-joined signal names, for logs and error messages.
    pub fn reason_summary(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub struct BotGate {
    config: GateConfig,
}

impl BotGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn score_threshold(&self) -> f64 {
        self.config.score_threshold
    }

    pub fn rate_window_secs(&self) -> u64 {
        self.config.rate_window_secs
    }

    /// Evaluate all heuristics. The decision is a logical OR: any single
    /// triggered signal requires a challenge.
    pub fn evaluate(&self, signals: &GateSignals<'_>) -> GateDecision {
        let mut reasons = Vec::new();

        if self.config.force_challenge {
            reasons.push(GateSignal::Forced);
        }

        if signals.attempts_in_window >= self.config.rate_limit {
            reasons.push(GateSignal::RateLimit);
        }

        if signals
            .user_agent
            .is_some_and(Self::is_suspicious_user_agent)
        {
            reasons.push(GateSignal::SuspiciousUserAgent);
        }

        if !signals.has_cookies {
            reasons.push(GateSignal::NoCookies);
        }

        // Applied independently of the other signals so clients that evade
        // every heuristic still get challenged occasionally.
        if self.config.sample_rate > 0.0 && rand::random::<f64>() < self.config.sample_rate {
            reasons.push(GateSignal::RandomSample);
        }

        GateDecision {
            required: !reasons.is_empty(),
            reasons,
        }
    }

    fn is_suspicious_user_agent(user_agent: &str) -> bool {
        let ua_lower = user_agent.to_lowercase();
        SUSPICIOUS_UA_PATTERNS
            .iter()
            .any(|pattern| ua_lower.contains(pattern))
    }
}
