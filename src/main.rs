//! Match tracker back-end binary entrypoint wiring the REST API and the
//! fixture store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_tracker_back::{
    config::AppConfig,
    dao::fixture_store::MemoryFixtureStore,
    routes,
    state::{AppState, SharedState},
};

/// Storage backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
}

impl StorageBackend {
    fn from_env() -> anyhow::Result<Self> {
        match env::var("STORAGE_BACKEND").ok().as_deref() {
            Some("memory") => Ok(StorageBackend::Memory),
            #[cfg(feature = "mongo-store")]
            Some("mongo") | None => Ok(StorageBackend::Mongo),
            #[cfg(not(feature = "mongo-store"))]
            None => Ok(StorageBackend::Memory),
            Some(other) => bail!("unsupported STORAGE_BACKEND `{other}`"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    let backend = StorageBackend::from_env()?;
    info!(?backend, "selected storage backend");
    match backend {
        StorageBackend::Memory => {
            app_state.set_store(Arc::new(MemoryFixtureStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => spawn_mongo_supervisor(app_state.clone()),
    }

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Keep a MongoDB fixture store installed in the background, toggling
/// degraded mode while it is unreachable.
#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState) {
    use match_tracker_back::{
        dao::{
            fixture_store::{
                FixtureStore,
                mongodb::{MongoConfig, MongoFixtureStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoFixtureStore::connect(config).await?;
            Ok::<Arc<dyn FixtureStore>, StorageError>(Arc::new(store))
        }
    }));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
