use std::sync::Arc;

use actix_web::middleware::Compress;
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use shortgate::api::{redirect_routes, shorten_routes};
use shortgate::config::AppConfig;
use shortgate::gate::BotGate;
use shortgate::gate::captcha::{CaptchaVerify, SiteVerifyClient};
use shortgate::logging::init_logging;
use shortgate::repository::RepositoryFactory;
use shortgate::session::SessionManager;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    let _log_guard = init_logging(&config.logging);

    let repository = RepositoryFactory::create(&config.database)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    info!("Using {} database backend", config.database.backend);

    if config.captcha.secret.is_empty() {
        warn!("Captcha secret not configured; challenged requests cannot pass verification");
    }
    if config.gate.force_challenge {
        info!("Forced challenge mode enabled: every creation request will be challenged");
    }

    let sessions = web::Data::new(SessionManager::new(&config.session));
    let gate = web::Data::new(BotGate::new(config.gate.clone()));
    let verifier: Arc<dyn CaptchaVerify> = Arc::new(SiteVerifyClient::new(&config.captcha));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(web::Data::new(repository.clone()))
            .app_data(sessions.clone())
            .app_data(gate.clone())
            .app_data(web::Data::new(verifier.clone()))
            .service(shorten_routes())
            .service(redirect_routes())
    })
    .bind(bind_address)?
    .run()
    .await
}
