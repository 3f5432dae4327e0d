use actix_web::{web, HttpResponse, Responder};
use tracing::Instrument;
use uuid::Uuid;

use crate::core::{MatchError, Matcher};
use crate::models::{HealthResponse, MatchRequest, MATCHER_VERSION};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: Matcher,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/match", web::post().to(perform_match));
}

/// Health check endpoint
///
/// Reports `degraded` when the judge backend does not answer its own health check.
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let judge = state.matcher.engine().judge();
    let status = if judge.health_check().await { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        matcher_version: MATCHER_VERSION.to_string(),
        judge: judge.name().to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Match endpoint
///
/// POST /match
///
/// Request body:
/// ```json
/// {
///   "cell_type_requested": "string",
///   "cell_type_list": ["string"],
///   "species_requested": "string",
///   "species_list": ["string"]
/// }
/// ```
async fn perform_match(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> Result<HttpResponse, MatchError> {
    let request = req.into_inner();
    let span = tracing::info_span!("match_request", request_id = %Uuid::new_v4());

    async move {
        let started = std::time::Instant::now();
        let result = state.matcher.match_request(&request).await;

        match &result {
            Ok(response) => tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Match complete: {:?}",
                response
            ),
            Err(MatchError::Validation(e)) => tracing::info!("Rejected match request: {}", e),
            Err(e) => tracing::error!("Match failed: {}", e),
        }

        result.map(|response| HttpResponse::Ok().json(response))
    }
    .instrument(span)
    .await
}
