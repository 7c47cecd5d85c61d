use camcast::cache::CacheAsideCoordinator;
use camcast::config::Config;
use camcast::reports::LookupRecorder;
use camcast::server::router::{CamcastState, camcast_router};
use camcast::snapshot::{HttpSnapshotFetcher, LocalClock};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        loglevel = %cfg.basic.loglevel,
        utc_offset_minutes = ?cfg.basic.utc_offset_minutes,
        traffic_images_url = %cfg.upstream.traffic_images_url,
        weather_forecast_url = %cfg.upstream.weather_forecast_url,
        proxy = %cfg.upstream.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        single_flight = cfg.cache.single_flight,
    );

    let db = camcast::db::spawn(&cfg.basic.database_url, cfg.cache.store_timeout()).await?;

    let clock = LocalClock::new(cfg.basic.utc_offset());
    let client = HttpSnapshotFetcher::build_client(&cfg.upstream)?;
    let fetcher = HttpSnapshotFetcher::new(&cfg.upstream, client, clock);

    let coordinator = CacheAsideCoordinator::new(Arc::new(db.clone()), Arc::new(fetcher))
        .with_single_flight(cfg.cache.single_flight);
    let reports = LookupRecorder::new(Arc::new(db.clone()));

    let state = CamcastState::new(Arc::new(coordinator), reports, clock)
        .with_recent_limit(cfg.cache.recent_reports_limit)
        .with_handler_timeout(cfg.basic.handler_timeout());
    let app = camcast_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.stop();
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
