use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use backend::config::ServerConfig;
use backend::context::AppContext;
use backend::inference::pipeline::ClassificationPipeline;
use backend::routes::configure_routes;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = ServerConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Loading model manifest {}", config.manifest_path.display());
    let pipeline = match ClassificationPipeline::load(&config.manifest_path) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("Failed to load model at startup: {}", e);
            return Err(std::io::Error::other(format!("Model loading failed: {}", e)));
        }
    };

    let manifest = pipeline.manifest();
    log::info!(
        "Loaded {} v{} ({} classes: {})",
        manifest.name,
        manifest.version,
        pipeline.labels().len(),
        pipeline.labels().names().join(", ")
    );

    let context = AppContext::new(pipeline, &config);
    let max_upload_bytes = config.max_upload_bytes;
    let bind_address = config.socket_address();

    log::info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
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
            .app_data(web::Data::new(context.clone()))
            .configure(|cfg| configure_routes(cfg, max_upload_bytes))
    });

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await
}
