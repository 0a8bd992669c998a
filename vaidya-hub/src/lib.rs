//! vaidya-hub library interface
//!
//! Exposes the router and application state so integration tests can drive
//! the service in-process.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vaidya_common::events::EventBus;

use crate::config::HubConfig;
use crate::services::identification::IdentificationService;
use crate::services::pronunciation::{matcher_for, GameContext, GameSessions};
use crate::services::{Collaborators, ProgressService, RemedyWorkflow, TranscriptMatcher, VotingService};
use crate::store::{
    CollectionRemedyRepository, KeyValueStore, LocalRemedyRepository, RemedyBackend,
    RemedyRepository, SqliteKvStore, TypedStore,
};

/// Room for a base64 photo at the upload limit plus form fields
pub const MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub config: Arc<HubConfig>,
    /// Replaced when the API key changes at runtime
    pub collaborators: Arc<RwLock<Collaborators>>,
    pub remedies: Arc<dyn RemedyRepository>,
    pub progress: Arc<ProgressService>,
    pub voting: Arc<VotingService>,
    pub workflow: Arc<RemedyWorkflow>,
    pub identification: Arc<IdentificationService>,
    pub games: GameSessions,
    pub matcher: Arc<dyn TranscriptMatcher>,
    /// TOML file that receives settings written through the API
    pub config_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Stores on the shared database, remedy backend chosen by `config`
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        config: HubConfig,
        collaborators: Collaborators,
    ) -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(db.clone()));
        let remedies: Arc<dyn RemedyRepository> = match config.remedy_backend {
            RemedyBackend::Local => Arc::new(LocalRemedyRepository::new(kv.clone())),
            RemedyBackend::Collection => Arc::new(CollectionRemedyRepository::new(db.clone())),
        };
        Self::with_stores(db, event_bus, config, collaborators, kv, remedies)
    }

    /// Explicit stores; used by tests to inject failing backends
    pub fn with_stores(
        db: SqlitePool,
        event_bus: EventBus,
        config: HubConfig,
        collaborators: Collaborators,
        kv: Arc<dyn KeyValueStore>,
        remedies: Arc<dyn RemedyRepository>,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(TypedStore::new(kv), event_bus.clone()));
        let voting = Arc::new(VotingService::new(remedies.clone(), event_bus.clone()));
        let workflow = Arc::new(RemedyWorkflow::new(
            remedies.clone(),
            progress.clone(),
            event_bus.clone(),
            config.verification,
        ));
        let identification = Arc::new(IdentificationService::new(
            progress.clone(),
            event_bus.clone(),
        ));
        let matcher = matcher_for(config.matcher);

        Self {
            db,
            event_bus,
            config: Arc::new(config),
            collaborators: Arc::new(RwLock::new(collaborators)),
            remedies,
            progress,
            voting,
            workflow,
            identification,
            games: GameSessions::new(),
            matcher,
            config_path: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Current collaborator handles
    pub async fn collaborators(&self) -> Collaborators {
        self.collaborators.read().await.clone()
    }

    pub async fn set_collaborators(&self, collaborators: Collaborators) {
        *self.collaborators.write().await = collaborators;
    }

    pub fn game_context(&self) -> GameContext {
        GameContext {
            progress: self.progress.clone(),
            events: self.event_bus.clone(),
            matcher: self.matcher.clone(),
            timing: self.config.game_timing,
        }
    }

    /// Remember a failure for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::get;

    Router::new()
        .merge(api::health_routes())
        .merge(api::catalog_routes())
        .merge(api::remedy_routes())
        .merge(api::progress_routes())
        .merge(api::chat_routes())
        .merge(api::game_routes())
        .merge(api::settings_routes())
        .merge(api::speech_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
