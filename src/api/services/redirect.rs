//! Redirect resolver
//!
//! The hot path: short id → 302 to the original URL. A miss is a plain 404
//! for the visitor; a storage fault is a 500 and must never be reported as
//! a miss.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::repository::LinkRepository;
use crate::utils::is_valid_short_id;

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        repository: web::Data<Arc<dyn LinkRepository>>,
    ) -> impl Responder {
        let short_id = path.into_inner();

        if !is_valid_short_id(&short_id) {
            // Malformed ids never reach the store.
            trace!("Invalid short id rejected: {}", short_id);
            return Self::not_found_response();
        }

        match repository.lookup(&short_id).await {
            Ok(Some(record)) => HttpResponse::Found()
                .insert_header((header::LOCATION, record.original_url))
                .finish(),
            Ok(None) => {
                debug!("Short id not found: {}", short_id);
                Self::not_found_response()
            }
            Err(e) => {
                error!("Storage error during redirect lookup: {}", e);
                Self::error_response()
            }
        }
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }
}

/// Redirect route configuration.
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{short_id}", web::get().to(RedirectService::handle_redirect))
        .route("/{short_id}", web::head().to(RedirectService::handle_redirect))
}
