pub mod auth;
pub mod booking;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod openapi;
pub mod profile;
pub mod settings;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    book_class, get_class, get_profile, healthz_live, healthz_ready, list_classes,
    list_instructors, list_notifications, root, update_profile,
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::booking::{BookingBackend, BookingFlow, SimulatedBackend};
use crate::catalog::{Catalog, SharedCatalog};
use crate::notify::NotificationLog;
use crate::openapi::ApiDoc;
use crate::profile::{FileStore, KeyValueStore, ProfileStore};
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub catalog: SharedCatalog,
    pub booking: BookingFlow,
    pub profile: Arc<ProfileStore>,
    pub notifications: Arc<NotificationLog>,
}

impl AppState {
    /// Wires the catalog, booking flow and profile store around one notification log.
    pub async fn new(
        settings: Settings,
        catalog: Catalog,
        backend: Arc<dyn BookingBackend>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let notifications = Arc::new(NotificationLog::default());
        let catalog = catalog.into_shared();
        let booking = BookingFlow::new(catalog.clone(), backend, notifications.clone());
        let profile = Arc::new(ProfileStore::load(store, notifications.clone()).await);

        Self {
            settings,
            catalog,
            booking,
            profile,
            notifications,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let catalog = match &settings.catalog_path {
        Some(path) => {
            info!("Loading class catalog from {path}");
            Catalog::load_json(path).await?
        }
        None => Catalog::seed(),
    };
    let backend = Arc::new(SimulatedBackend::new(
        settings.booking_delay(),
        settings.booking_failure_rate,
    ));
    let store = Arc::new(FileStore::new(&settings.profile_store_path));

    let state = AppState::new(settings, catalog, backend, store).await;
    info!(
        classes = state.catalog.read().await.len(),
        "Class catalog ready"
    );

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Class Booking API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/classes", get(list_classes))
        .route("/classes/{id}", get(get_class))
        .route("/classes/{id}/book", post(book_class))
        .route("/instructors", get(list_instructors))
        .route("/notifications", get(list_notifications))
        .route("/profile", get(get_profile).put(update_profile))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer).layer(CorsLayer::permissive())
}
