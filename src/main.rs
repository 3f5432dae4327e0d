use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use game_matcher::config::{LoggingSettings, Settings};
use game_matcher::core::{Matcher, TemplateRegistry, TournamentEngine, TournamentPolicy};
use game_matcher::models::ErrorResponse;
use game_matcher::routes::{self, socket, AppState};
use game_matcher::services::OllamaJudge;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
        category: None,
    })
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "compact" {
        subscriber.compact().init();
    } else {
        subscriber.pretty().init();
    }
}

fn startup_error<E: std::fmt::Display>(context: &str, e: E) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);
    info!("Starting GAME matcher service...");

    let policy = TournamentPolicy::from_settings(&settings.tournament, &settings.judge)
        .map_err(|e| startup_error("Invalid tournament configuration", e))?;
    let registry = Arc::new(
        TemplateRegistry::builder()
            .register(game_matcher::core::templates::CELL_TYPE)
            .register(game_matcher::core::templates::SPECIES)
            .register(game_matcher::core::templates::BINDING_MOLECULE)
            .build()
            .map_err(|e| startup_error("Invalid prompt templates", e))?,
    );

    // HTTP-level timeout sits just above the per-call timeout the engine enforces
    let judge = OllamaJudge::new(
        settings.judge.base_url.clone(),
        settings.judge.model.clone(),
        settings.judge.temperature,
        policy.call_timeout + Duration::from_secs(5),
    )
    .map_err(|e| startup_error("Failed to create judge client", e))?;

    info!(
        "Judge initialized (model: {}, endpoint: {})",
        judge.model(),
        settings.judge.base_url
    );
    info!("Tournament policy: {:?}", policy);

    let engine = TournamentEngine::new(Arc::new(judge), policy);
    let matcher = Matcher::new(engine, registry);

    if settings.socket.enabled {
        let addr = (settings.socket.host.as_str(), settings.socket.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let matcher = Arc::new(matcher.clone());
        let max_frame_bytes = settings.socket.max_frame_bytes;
        actix_web::rt::spawn(async move {
            if let Err(e) = socket::serve(listener, matcher, max_frame_bytes).await {
                error!("Socket transport stopped: {}", e);
            }
        });
    }

    let app_state = AppState { matcher };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let max_body_bytes = settings.server.max_body_bytes;

    info!("Starting HTTP server on {}:{}", host, port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(
                web::JsonConfig::default()
                    .limit(max_body_bytes)
                    .error_handler(handle_json_payload_error),
            )
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    });

    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server.bind((host, port))?.run().await
}
