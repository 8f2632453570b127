//! Shortgate - a URL shortener with adaptive bot-mitigation gating
//!
//! A client submits a long URL, the server generates a short identifier,
//! persists the mapping, and later redirects visitors from the short
//! identifier to the original URL. Link creation is gated: a per-session
//! sliding attempt window, user-agent heuristics, cookie presence, random
//! sampling, and an operator override decide whether a request must pass a
//! CAPTCHA challenge before it is honored.
//!
//! # Architecture
//! - `api`: HTTP services (shorten pipeline, redirect resolver)
//! - `gate`: challenge heuristics and CAPTCHA verification
//! - `session`: anonymous session state, store, and cookie tokens
//! - `repository`: link persistence backends
//! - `config`: configuration management
//! - `logging`: tracing initialization

pub mod api;
pub mod config;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod repository;
pub mod session;
pub mod utils;
