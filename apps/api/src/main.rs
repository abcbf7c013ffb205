use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use notification_cell::{sms_sender_from_config, ReminderQueueService, ReminderWorker, WorkerConfig};
use shared_config::AppConfig;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = if config.cors_allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

struct RunningWorker {
    worker: Arc<ReminderWorker>,
    handle: JoinHandle<()>,
    drain_timeout: Duration,
}

impl RunningWorker {
    /// Lets in-flight deliveries settle before the process exits.
    async fn stop(self) {
        self.worker.shutdown().await;
        if timeout(self.drain_timeout, self.handle).await.is_err() {
            warn!("Reminder worker did not stop within {:?}", self.drain_timeout);
        }
    }
}

/// Starts the reminder worker in the background. The server keeps running without it
/// when Redis cannot be reached.
async fn spawn_reminder_worker(config: &AppConfig) -> Option<RunningWorker> {
    let queue = match ReminderQueueService::new(config) {
        Ok(queue) => queue,
        Err(e) => {
            error!("Reminder queue unavailable, worker not started: {}", e);
            return None;
        }
    };
    match queue.ping().await {
        Ok(()) => match queue.pending_count().await {
            Ok(pending) => info!("{} reminders waiting in the schedule", pending),
            Err(e) => warn!("Could not count scheduled reminders: {}", e),
        },
        Err(e) => warn!("Redis did not answer ping, reminders will wait until it is reachable: {}", e),
    }

    let worker_config = WorkerConfig::default();
    let drain_timeout = Duration::from_secs(worker_config.job_timeout_seconds + 5);
    let worker = Arc::new(ReminderWorker::new(
        worker_config,
        Arc::new(queue),
        sms_sender_from_config(config),
    ));

    let running = Arc::clone(&worker);
    let handle = tokio::spawn(async move {
        if let Err(e) = running.start().await {
            error!("Reminder worker exited: {}", e);
        }
    });
    Some(RunningWorker {
        worker,
        handle,
        drain_timeout,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Clinic Queue API server");

    let config = AppConfig::from_env();
    let state = Arc::new(config);

    let worker = if state.run_reminder_worker {
        spawn_reminder_worker(&state).await
    } else {
        info!("Reminder worker disabled");
        None
    };

    let app = router::create_router(Arc::clone(&state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state));

    let listener = TcpListener::bind(&state.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", state.bind_address))?;
    info!("Listening on {}", state.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(worker) = worker {
        worker.stop().await;
    }
    Ok(())
}
