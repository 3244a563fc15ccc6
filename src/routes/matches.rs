use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::core::{
    CompatibilityEvaluator, DiscoveryError, DiscoveryOutcome, DiscoveryPipeline, ProfileStore, StoreError,
};
use crate::models::{
    Coordinates, DiscoverRequest, DiscoverResponse, ErrorResponse, EvaluateRequest, EvaluateResponse,
    HealthResponse, MatchingOptions,
};
use crate::services::{PostgresProfileStore, RequestLocationProvider};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    /// Set when the store is Postgres-backed, for health reporting
    pub postgres: Option<Arc<PostgresProfileStore>>,
    pub matching: MatchingOptions,
    pub default_location: Option<Coordinates>,
}

impl AppState {
    /// Build a discovery pipeline that treats `device` as the caller's position
    pub fn pipeline(&self, device: Option<Coordinates>) -> DiscoveryPipeline {
        let location = RequestLocationProvider::new(device.or(self.default_location));
        let evaluator = CompatibilityEvaluator::new(Arc::new(location), self.matching);
        DiscoveryPipeline::new(self.store.clone(), evaluator)
    }
}

/// Run discovery on its own task
///
/// The task keeps running if the handle is dropped; only `cancel` stops it.
fn spawn_discovery(
    pipeline: DiscoveryPipeline,
    user_id: String,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<Result<DiscoveryOutcome, DiscoveryError>> {
    tokio::spawn(async move { pipeline.discover_candidates(&user_id, &cancel).await })
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/discover", web::post().to(discover))
        .route("/matches/evaluate", web::post().to(evaluate));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn discovery_error_response(e: &DiscoveryError) -> HttpResponse {
    use actix_web::http::StatusCode;

    match e {
        DiscoveryError::ProfileNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Profile not found", e.to_string())
        }
        DiscoveryError::StoreUnavailable(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Discovery unavailable",
            e.to_string(),
        ),
        DiscoveryError::Cancelled => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Discovery cancelled",
            e.to_string(),
        ),
    }
}

fn validation_error_response(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Discover match candidates
///
/// POST /api/v1/matches/discover
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "latitude": 34.05,
///   "longitude": -118.24
/// }
/// ```
async fn discover(
    state: web::Data<AppState>,
    req: web::Json<DiscoverRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for discover request: {:?}", errors);
        return validation_error_response(errors);
    }

    // Client disconnect drops the handler, which cancels the spawned task
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let run_id = uuid::Uuid::new_v4();
    tracing::info!("Discovery {} started for user {}", run_id, req.user_id);

    let pipeline = state.pipeline(req.device_coordinates());
    let task = spawn_discovery(pipeline, req.user_id.clone(), cancel);

    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Discovery {} task failed for user {}: {}", run_id, req.user_id, e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Discovery failed",
                e.to_string(),
            );
        }
    };

    match result {
        Ok(outcome) => {
            tracing::info!(
                "Discovery {} returning {} candidates for user {}",
                run_id,
                outcome.candidates.len(),
                req.user_id
            );
            HttpResponse::Ok().json(DiscoverResponse {
                candidates: outcome.candidates,
                total_candidates: outcome.total_candidates,
                excluded: outcome.excluded,
            })
        }
        Err(e) => {
            tracing::error!("Discovery {} failed for user {}: {}", run_id, req.user_id, e);
            discovery_error_response(&e)
        }
    }
}

/// Explain compatibility between two users
///
/// POST /api/v1/matches/evaluate
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "candidateId": "string"
/// }
/// ```
async fn evaluate(
    state: web::Data<AppState>,
    req: web::Json<EvaluateRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(errors);
    }

    let pipeline = state.pipeline(req.device_coordinates());

    let user = match pipeline.load_acting_user(&req.user_id).await {
        Ok(user) => user,
        Err(e) => return discovery_error_response(&e),
    };

    let candidate = match state.store.get(&req.candidate_id).await {
        Ok(candidate) => candidate,
        Err(StoreError::NotFound(id)) => {
            return error_response(
                actix_web::http::StatusCode::NOT_FOUND,
                "Candidate not found",
                format!("Profile not found: {}", id),
            );
        }
        Err(e) => return discovery_error_response(&DiscoveryError::StoreUnavailable(e)),
    };

    let signals = pipeline.evaluator().evaluate(&user, &candidate).await;

    tracing::debug!(
        "Evaluated {} -> {}: {:?}",
        req.user_id,
        req.candidate_id,
        signals
    );

    HttpResponse::Ok().json(EvaluateResponse {
        user_id: user.id,
        candidate_id: candidate.id,
        signals,
        is_match: signals.is_match(),
    })
}
