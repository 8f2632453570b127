//! CAPTCHA verification provider
//!
//! Posts the client-supplied token to the provider's siteverify endpoint
//! and returns a typed outcome. The call runs on the blocking thread pool
//! with a bounded timeout; a timeout or malformed response is a
//! `Verification` error, distinct from a legitimate `success: false`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use ureq::Agent;

use crate::config::CaptchaConfig;
use crate::errors::{Result, ShortgateError};

/// Typed provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub success: bool,
    /// Continuous trust score, when the provider reports one. Higher means
    /// more likely human.
    pub score: Option<f64>,
}

#[async_trait]
pub trait CaptchaVerify: Send + Sync {
    /// Verify a challenge token. `Err` means the provider could not be
    /// consulted (network, timeout, malformed body) — never a failed
    /// verification, which is `Ok` with `success: false`.
    async fn verify(&self, token: &str, client_ip: Option<&str>) -> Result<VerifyOutcome>;
}

/// Production verifier speaking the hCaptcha/reCAPTCHA siteverify protocol.
pub struct SiteVerifyClient {
    agent: Agent,
    secret: String,
    verify_url: String,
}

impl SiteVerifyClient {
    pub fn new(config: &CaptchaConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
        }
    }

    /// Synchronous provider call, executed inside `spawn_blocking`.
    fn verify_sync(
        agent: &Agent,
        url: &str,
        secret: &str,
        token: &str,
        client_ip: Option<&str>,
    ) -> Result<VerifyOutcome> {
        let mut form: Vec<(&str, &str)> = vec![("secret", secret), ("response", token)];
        if let Some(ip) = client_ip {
            form.push(("remoteip", ip));
        }

        let resp = agent.post(url).send_form(form).map_err(|e| {
            warn!("Captcha provider request failed: {}", e);
            ShortgateError::verification(format!("Captcha provider unreachable: {}", e))
        })?;

        let json: serde_json::Value = resp.into_body().read_json().map_err(|e| {
            warn!("Captcha provider response parse failed: {}", e);
            ShortgateError::verification(format!("Malformed captcha provider response: {}", e))
        })?;

        let success = json["success"].as_bool().ok_or_else(|| {
            ShortgateError::verification("Captcha provider response missing success flag")
        })?;
        let score = json["score"].as_f64();

        debug!("Captcha verification: success={}, score={:?}", success, score);
        Ok(VerifyOutcome { success, score })
    }
}

#[async_trait]
impl CaptchaVerify for SiteVerifyClient {
    async fn verify(&self, token: &str, client_ip: Option<&str>) -> Result<VerifyOutcome> {
        let agent = self.agent.clone();
        let url = self.verify_url.clone();
        let secret = self.secret.clone();
        let token = token.to_string();
        let client_ip = client_ip.map(String::from);

        tokio::task::spawn_blocking(move || {
            Self::verify_sync(&agent, &url, &secret, &token, client_ip.as_deref())
        })
        .await
        .map_err(|e| ShortgateError::verification(format!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Depends on external network; excluded from CI runs.
    #[tokio::test]
    #[ignore]
    async fn test_siteverify_rejects_garbage_token() {
        let client = SiteVerifyClient::new(&CaptchaConfig {
            secret: "0x0000000000000000000000000000000000000000".to_string(),
            ..CaptchaConfig::default()
        });

        let outcome = client.verify("not-a-real-token", None).await.unwrap();
        assert!(!outcome.success);
    }

    #[test]
    fn test_unreachable_provider_is_verification_error() {
        let config = CaptchaConfig {
            secret: "secret".to_string(),
            // TEST-NET, not routable: fails within the agent timeout.
            verify_url: "http://192.0.2.1/siteverify".to_string(),
            timeout_secs: 1,
        };
        let client = SiteVerifyClient::new(&config);

        let result = SiteVerifyClient::verify_sync(
            &client.agent,
            &client.verify_url,
            &client.secret,
            "token",
            None,
        );
        assert!(matches!(result, Err(ShortgateError::Verification(_))));
    }
}
