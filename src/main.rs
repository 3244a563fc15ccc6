use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use habibeats_match::config::{LoggingSettings, Settings, StoreBackend};
use habibeats_match::core::ProfileStore;
use habibeats_match::routes::{self, matches::AppState};
use habibeats_match::services::{
    CacheManager, CachedProfileStore, FirestoreProfileStore, InMemoryProfileStore, PostgresProfileStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(message: String) -> std::io::Error {
    error!("{}", message);
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

/// Build the configured profile store
async fn build_store(
    settings: &Settings,
) -> std::io::Result<(Arc<dyn ProfileStore>, Option<Arc<PostgresProfileStore>>)> {
    match settings.store.backend {
        StoreBackend::Memory => {
            let store = match &settings.store.seed_path {
                Some(path) => InMemoryProfileStore::from_json_file(path)
                    .await
                    .map_err(|e| startup_error(format!("Failed to seed profiles: {}", e)))?,
                None => {
                    warn!("Memory store has no seed_path configured; starting empty");
                    InMemoryProfileStore::new()
                }
            };
            info!("Using in-memory profile store");
            let store: Arc<dyn ProfileStore> = Arc::new(store);
            Ok((store, None))
        }
        StoreBackend::Firestore => {
            let firestore = &settings.firestore;
            let store = FirestoreProfileStore::new(
                firestore.base_url.clone(),
                firestore.project_id.clone(),
                firestore.collection.clone(),
                firestore.api_token.clone(),
                firestore.page_size,
            )
            .map_err(|e| startup_error(format!("Failed to create Firestore client: {}", e)))?;
            info!(
                "Using Firestore profile store (project: {}, collection: {})",
                firestore.project_id, firestore.collection
            );
            let store: Arc<dyn ProfileStore> = Arc::new(store);
            Ok((store, None))
        }
        StoreBackend::Postgres => {
            let max_conn = settings.database.max_connections.unwrap_or(10);
            let min_conn = settings.database.min_connections.unwrap_or(1);
            let store = Arc::new(
                PostgresProfileStore::new(&settings.database.url, max_conn, min_conn)
                    .await
                    .map_err(|e| startup_error(format!("Failed to connect to PostgreSQL: {}", e)))?,
            );
            info!("Using PostgreSQL profile store (max: {} connections)", max_conn);
            let dyn_store: Arc<dyn ProfileStore> = store.clone();
            Ok((dyn_store, Some(store)))
        }
    }
}

/// Wrap the store with the candidate cache when enabled
async fn with_cache(store: Arc<dyn ProfileStore>, settings: &Settings) -> Arc<dyn ProfileStore> {
    let cache_settings = &settings.cache;
    if !cache_settings.enabled {
        return store;
    }

    let ttl = cache_settings.ttl_secs.unwrap_or(60);
    let l1_size = cache_settings.l1_cache_size.unwrap_or(1000);

    let cache = match &cache_settings.redis_url {
        Some(url) => match CacheManager::with_redis(url, l1_size, ttl).await {
            Ok(cache) => cache,
            Err(e) => {
                error!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(l1_size, ttl)
            }
        },
        None => CacheManager::in_memory(l1_size, ttl),
    };

    info!("Candidate cache enabled ({:?})", cache.stats());

    Arc::new(CachedProfileStore::new(store, Arc::new(cache)))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_tracing(
        &settings
            .as_ref()
            .map(|s| s.logging.clone())
            .unwrap_or_default(),
    );

    info!("Starting HabiBeats match service...");

    let settings = settings.map_err(|e| startup_error(format!("Configuration error: {}", e)))?;

    info!("Configuration loaded successfully");

    let (store, postgres) = build_store(&settings).await?;
    let store = with_cache(store, &settings).await;

    let matching = settings.matching.options();
    info!("Matching options: {:?}", matching);

    let app_state = AppState {
        store,
        postgres,
        matching,
        default_location: settings.matching.default_location,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
