mod config;
mod error;
mod inference;
mod resolve;
mod routes;
mod state;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use config::ClassifierConfig;
use inference::model::TorchLoader;
use inference::InferenceService;
use resolve::kaggle::KaggleRegistry;
use routes::configure_routes;
use state::{AppState, ModelState};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let mut config = ClassifierConfig::load().map_err(|e| {
        log::error!("Failed to load classifier config: {}", e);
        std::io::Error::other(format!("Config loading failed: {}", e))
    })?;
    config.apply_env_overrides();

    let frontend_dir = config.server.frontend_dir.clone().unwrap_or_else(|| {
        if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            PathBuf::from(format!("{}/../frontend/dist", manifest_dir))
        } else {
            PathBuf::from("/usr/src/app/frontend/dist")
        }
    });

    let registry = KaggleRegistry::from_env();
    let model = match InferenceService::initialize(&config, &TorchLoader, &registry).await {
        Ok(service) => {
            log::info!("Model ready: {}", service.model_path().display());
            ModelState::Ready(Arc::new(service))
        }
        Err(e) => {
            // The page reports this; the server still starts.
            log::error!("Model unavailable: {}", e);
            ModelState::Failed(e.to_api_error())
        }
    };

    let state = web::Data::new(AppState::new(&config, model));

    let bind_address = format!("0.0.0.0:{}", config.server.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, Some(frontend_dir.clone())))
    })
    .bind(&bind_address)?
    .run()
    .await
}
