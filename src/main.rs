//! Akuit server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use akuit_lib::api::{self, ApiDoc};
use akuit_lib::config::{Config, EnvKeys, MODEL_API_KEY_HEADER, MODEL_PROVIDER_HEADER};
use akuit_lib::db::DbPool;
use akuit_lib::middleware::RequestLogger;
use akuit_lib::services::{HttpGateway, ModelGateway, Storage};
use akuit_lib::AppState;

/// Static dashboard directory, registered only when serving the bundle.
#[derive(Clone)]
struct StaticDir(PathBuf);

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let dir = req
        .app_data::<web::Data<StaticDir>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static files are not configured"))?;
    Ok(NamedFile::open(dir.0.join("index.html"))?)
}

fn exit_with(message: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", message, err);
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and AKUIT_ENCRYPTION_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Akuit");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = DbPool::new(&config)
        .await
        .unwrap_or_else(|e| exit_with("Failed to initialize database", e));
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        exit_with("Failed to run migrations", e);
    }

    let storage = Storage::new(&config.upload_dir)
        .unwrap_or_else(|e| exit_with("Failed to prepare upload directory", e));

    let gateway: Arc<dyn ModelGateway> = Arc::new(
        HttpGateway::new(config.model.clone())
            .unwrap_or_else(|e| exit_with("Failed to create model gateway", e)),
    );

    let env_keys = EnvKeys::from_env();
    if env_keys.providers().is_empty() {
        info!("No provider key in the environment; requests must send or store one");
    } else {
        info!("Environment provider keys: {:?}", env_keys.providers());
    }
    info!(
        "Default model provider: {} ({})",
        config.model.default_provider,
        config.model.endpoint(config.model.default_provider).model
    );

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();
    let state = AppState::new(config, pool, storage, gateway, env_keys);

    if let Some(ref dir) = static_dir {
        info!("Static file serving enabled from {}", dir.display());
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let openapi = ApiDoc::openapi();

    let server = HttpServer::new(move || {
        let allowed_headers = [
            "authorization",
            "accept",
            "content-type",
            MODEL_API_KEY_HEADER,
            MODEL_PROVIDER_HEADER,
        ];
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        };

        let state = state.clone();
        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .configure(|cfg| state.register(cfg))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(web::scope("/api/v1").configure(api::configure_api));

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(StaticDir(dir.clone())))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
