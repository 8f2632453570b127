//! Shorten pipeline
//!
//! The creation endpoint walks: validate input → record the attempt in the
//! session window → evaluate the bot-mitigation gate → (verify a challenge
//! token if one is demanded) → persist with collision retries → bump the
//! session counter → respond with the short URL.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::errors::{Result, ShortgateError};
use crate::gate::captcha::CaptchaVerify;
use crate::gate::{BotGate, GateDecision, GateSignals};
use crate::repository::{LinkRecord, LinkRepository};
use crate::session::SessionManager;
use crate::utils::ip::extract_client_ip;
use crate::utils::url_validator::validate_url;
use crate::utils::{SHORT_ID_LENGTH, generate_short_id};

/// Collision retry ceiling. With a 64^6 id space, more than one retry is
/// already rare; exhausting five means the corpus or the RNG is broken.
const MAX_INSERT_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: Option<String>,
    /// Challenge token, present when the client answered a CAPTCHA.
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    captcha_required: Option<bool>,
}

pub struct ShortenService {}

impl ShortenService {
    pub async fn handle_shorten(
        req: HttpRequest,
        body: web::Json<ShortenRequest>,
        repository: web::Data<Arc<dyn LinkRepository>>,
        sessions: web::Data<SessionManager>,
        gate: web::Data<BotGate>,
        verifier: web::Data<Arc<dyn CaptchaVerify>>,
    ) -> impl Responder {
        // Validation happens before any session mutation: a request with no
        // usable URL is not an "attempt" worth rate-tracking.
        let url = match body.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                debug!("Shorten request without url");
                return Self::error_response(StatusCode::BAD_REQUEST, "url is required");
            }
        };

        if let Err(e) = validate_url(&url) {
            debug!("Shorten request with invalid url: {}", e);
            return Self::error_response(StatusCode::BAD_REQUEST, e.message());
        }

        let (session_id, mut state) = sessions.open(&req);
        let window = Duration::seconds(gate.rate_window_secs() as i64);
        let attempts = state.record_attempt(Utc::now(), window);

        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok());
        let signals = GateSignals {
            attempts_in_window: attempts,
            user_agent,
            has_cookies: req.headers().contains_key(header::COOKIE),
        };

        let decision = gate.evaluate(&signals);
        let token = body.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let client_ip = extract_client_ip(&req);

        if let Err(e) = Self::verify_admission(
            &decision,
            token,
            client_ip.as_deref(),
            &gate,
            verifier.get_ref().as_ref(),
        )
        .await
        {
            match &e {
                ShortgateError::Verification(_) => error!("Captcha provider error: {}", e),
                _ => info!("Admission refused for session {}: {}", session_id, e),
            }
            // The attempt still counts toward the rate window.
            sessions.save(&session_id, state);
            return Self::admission_error_response(&sessions, &session_id, &e);
        }

        // Admitted. Insert with a fresh id, retrying on collision.
        let mut stored: Option<LinkRecord> = None;
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let record = LinkRecord {
                short_id: generate_short_id(SHORT_ID_LENGTH),
                original_url: url.clone(),
                created_at: Utc::now(),
            };

            match repository.insert(record.clone()).await {
                Ok(()) => {
                    stored = Some(record);
                    break;
                }
                Err(e) if e.is_collision() => {
                    warn!(
                        "Short id collision (attempt {}/{}), regenerating",
                        attempt, MAX_INSERT_ATTEMPTS
                    );
                }
                Err(e) => {
                    error!("Failed to persist link: {}", e);
                    sessions.save(&session_id, state);
                    return Self::session_error_response(
                        &sessions,
                        &session_id,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "we could not save your URL",
                    );
                }
            }
        }

        let Some(record) = stored else {
            error!(
                "Exhausted {} insert attempts without a unique short id",
                MAX_INSERT_ATTEMPTS
            );
            sessions.save(&session_id, state);
            return Self::session_error_response(
                &sessions,
                &session_id,
                StatusCode::INTERNAL_SERVER_ERROR,
                "we could not save your URL",
            );
        };

        let count = state.record_success();
        sessions.save(&session_id, state);

        let short_url = {
            let conn_info = req.connection_info();
            format!(
                "{}://{}/{}",
                conn_info.scheme(),
                conn_info.host(),
                record.short_id
            )
        };

        info!(
            "Shortened {} -> {} (session {}, count {})",
            record.original_url, record.short_id, session_id, count
        );

        HttpResponse::Ok()
            .cookie(sessions.session_cookie(&session_id))
            .json(ShortenResponse { short_url, count })
    }

    /// Decide whether this request may create a link. `Ok` means admitted.
    /// The error variant tells the caller how to respond: a demanded but
    /// unanswered challenge is `ChallengeRequired`, a failed answer is
    /// `Validation`, a provider fault is `Verification`.
    async fn verify_admission(
        decision: &GateDecision,
        token: Option<&str>,
        client_ip: Option<&str>,
        gate: &BotGate,
        verifier: &dyn CaptchaVerify,
    ) -> Result<()> {
        if !decision.required {
            return Ok(());
        }

        let Some(token) = token else {
            return Err(ShortgateError::challenge_required(decision.reason_summary()));
        };

        let outcome = verifier.verify(token, client_ip).await?;
        let score_ok = outcome
            .score
            .is_none_or(|score| score >= gate.score_threshold());
        if !outcome.success || !score_ok {
            debug!(
                "Captcha answer rejected (success={}, score={:?})",
                outcome.success, outcome.score
            );
            return Err(ShortgateError::validation("captcha failed"));
        }

        Ok(())
    }

    /// Session usage counter. Read-only: does not record an attempt.
    pub async fn handle_usage(
        req: HttpRequest,
        sessions: web::Data<SessionManager>,
    ) -> impl Responder {
        let (session_id, state) = sessions.open(&req);
        let count = state.count();
        sessions.save(&session_id, state);

        HttpResponse::Ok()
            .cookie(sessions.session_cookie(&session_id))
            .json(UsageResponse { count })
    }

    fn error_response(status: StatusCode, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(ErrorBody {
            error: message.to_string(),
            captcha_required: None,
        })
    }

    fn session_error_response(
        sessions: &SessionManager,
        session_id: &str,
        status: StatusCode,
        message: &str,
    ) -> HttpResponse {
        HttpResponse::build(status)
            .cookie(sessions.session_cookie(session_id))
            .json(ErrorBody {
                error: message.to_string(),
                captcha_required: None,
            })
    }

    fn admission_error_response(
        sessions: &SessionManager,
        session_id: &str,
        err: &ShortgateError,
    ) -> HttpResponse {
        let (status, message, captcha_required) = match err {
            ShortgateError::ChallengeRequired(_) => {
                (StatusCode::BAD_REQUEST, "captcha required", Some(true))
            }
            ShortgateError::Verification(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "captcha verification error",
                None,
            ),
            _ => (StatusCode::BAD_REQUEST, err.message(), None),
        };

        HttpResponse::build(status)
            .cookie(sessions.session_cookie(session_id))
            .json(ErrorBody {
                error: message.to_string(),
                captcha_required,
            })
    }
}

/// Creation API route configuration.
pub fn shorten_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/shorten", web::post().to(ShortenService::handle_shorten))
        .route("/usage", web::get().to(ShortenService::handle_usage))
}
