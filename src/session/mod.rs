//! Anonymous session tracking
//!
//! Each client session carries two pieces of mutable state: the number of
//! links it has created and a sliding window of recent creation attempts.
//! State lives server-side in a TTL'd cache; the client only holds a signed
//! cookie carrying the session id.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::SessionConfig;

pub mod token;

use token::SessionTokenService;

/// Cookie name carrying the signed session id.
pub const SESSION_COOKIE: &str = "sg_session";

/// Per-session mutable state.
///
/// `count` only increases. `attempt_timestamps` only ever holds entries
/// within the trailing rate window; stale entries are pruned on each
/// recorded attempt so the vector cannot grow without bound over a
/// long-lived session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    count: u64,
    attempt_timestamps: Vec<DateTime<Utc>>,
}

impl SessionState {
    /// Record a creation attempt at `now`. Prunes timestamps older than
    /// `window` first, then appends, then returns the window size
    /// (including this attempt).
    pub fn record_attempt(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = now - window;
        self.attempt_timestamps.retain(|t| *t > cutoff);
        self.attempt_timestamps.push(now);
        self.attempt_timestamps.len()
    }

    /// Record a successful creation and return the new total.
    pub fn record_success(&mut self) -> u64 {
        self.count += 1;
        self.count
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Server-side session store: TTL'd in-memory cache keyed by session id.
///
/// Capacity is bounded: every cookie-less request mints a fresh session, so
/// without a cap a client spraying requests would grow the map for the full
/// TTL. Past the cap moka evicts cold entries, which for an abusive client
/// just means losing its rate-window history early.
///
/// Writes are last-write-wins; concurrent requests from one session are not
/// expected and need no stronger guarantee.
pub struct SessionStore {
    cache: moka::sync::Cache<String, SessionState>,
}

impl SessionStore {
    pub fn new(ttl_secs: u64, max_sessions: u64) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(max_sessions)
            .time_to_live(std::time::Duration::from_secs(ttl_secs))
            .build();
        Self { cache }
    }

    pub fn load(&self, session_id: &str) -> Option<SessionState> {
        self.cache.get(session_id)
    }

    pub fn save(&self, session_id: &str, state: SessionState) {
        self.cache.insert(session_id.to_string(), state);
    }
}

/// Ties the cookie token service and the server-side store together.
pub struct SessionManager {
    store: SessionStore,
    tokens: SessionTokenService,
    ttl_secs: u64,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        let secret = if config.secret.is_empty() {
            warn!("Session secret not configured, generating a random one (sessions will not survive restarts)");
            crate::utils::generate_short_id(32)
        } else {
            config.secret.clone()
        };

        Self {
            store: SessionStore::new(config.ttl_secs, config.max_sessions),
            tokens: SessionTokenService::new(&secret, config.ttl_secs),
            ttl_secs: config.ttl_secs,
        }
    }

    /// Resolve the caller's session: a valid session cookie yields the
    /// existing id and state, anything else starts a fresh session lazily.
    pub fn open(&self, req: &HttpRequest) -> (String, SessionState) {
        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            match self.tokens.validate(cookie.value()) {
                Ok(claims) => {
                    let state = self.store.load(&claims.sid).unwrap_or_default();
                    return (claims.sid, state);
                }
                Err(e) => {
                    debug!("Invalid session cookie, starting fresh session: {}", e);
                }
            }
        }

        (uuid::Uuid::new_v4().to_string(), SessionState::default())
    }

    pub fn save(&self, session_id: &str, state: SessionState) {
        self.store.save(session_id, state);
    }

    /// Build the session cookie for a response. Issued fresh on every
    /// response so the expiry slides with activity.
    pub fn session_cookie(&self, session_id: &str) -> Cookie<'static> {
        let token = self
            .tokens
            .issue(session_id)
            .unwrap_or_else(|e| {
                // Encoding only fails on key misconfiguration; an empty
                // value degrades to a fresh session on the next request.
                warn!("Failed to issue session token: {}", e);
                String::new()
            });

        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(actix_web::cookie::time::Duration::seconds(
                self.ttl_secs as i64,
            ))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_record_attempt_counts_current() {
        let mut state = SessionState::default();
        let window = Duration::seconds(60);

        assert_eq!(state.record_attempt(ts(0), window), 1);
        assert_eq!(state.record_attempt(ts(1), window), 2);
        assert_eq!(state.record_attempt(ts(2), window), 3);
    }

    #[test]
    fn test_stale_attempts_are_pruned() {
        let mut state = SessionState::default();
        let window = Duration::seconds(60);

        for i in 0..5 {
            state.record_attempt(ts(i), window);
        }
        // 90 seconds later, all five earlier attempts are outside the window.
        assert_eq!(state.record_attempt(ts(95), window), 1);
    }

    #[test]
    fn test_attempts_spread_beyond_window_never_accumulate() {
        let mut state = SessionState::default();
        let window = Duration::seconds(60);

        // One attempt every 61 seconds: the window size stays at 1.
        for i in 0..20 {
            assert_eq!(state.record_attempt(ts(i * 61), window), 1);
        }
    }

    #[test]
    fn test_success_counter_increments() {
        let mut state = SessionState::default();
        assert_eq!(state.count(), 0);
        assert_eq!(state.record_success(), 1);
        assert_eq!(state.record_success(), 2);
        assert_eq!(state.count(), 2);
    }

    #[test]
    fn test_store_load_save_round_trip() {
        let store = SessionStore::new(3600, 1024);
        assert!(store.load("sid-1").is_none());

        let mut state = SessionState::default();
        state.record_success();
        store.save("sid-1", state);

        let loaded = store.load("sid-1").expect("state should be stored");
        assert_eq!(loaded.count(), 1);
    }

    #[test]
    fn test_store_isolates_sessions() {
        let store = SessionStore::new(3600, 1024);
        let mut a = SessionState::default();
        a.record_success();
        store.save("a", a);
        store.save("b", SessionState::default());

        assert_eq!(store.load("a").unwrap().count(), 1);
        assert_eq!(store.load("b").unwrap().count(), 0);
    }

    #[test]
    fn test_store_evicts_past_capacity() {
        let store = SessionStore::new(3600, 8);

        // A flood of fresh sessions must not grow the map past the cap.
        for i in 0..256 {
            store.save(&format!("sid-{}", i), SessionState::default());
        }
        store.cache.run_pending_tasks();

        assert!(
            store.cache.entry_count() <= 8,
            "store grew past capacity: {}",
            store.cache.entry_count()
        );
    }
}
