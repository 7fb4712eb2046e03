// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `snapbin serve` command implementation.
//!
//! Wires the components together: SQLite storage, the task backend
//! (Redis, or in-memory for single-process dev runs), the enqueue-side
//! producer, one worker loop per task kind, the periodic expiry scanner,
//! and the axum gateway. Everything shares one cancellation token installed
//! by the signal handler.

use std::sync::Arc;
use std::time::Duration;

use snapbin_config::SnapbinConfig;
use snapbin_core::{SnapbinError, TaskKind};
use snapbin_gateway::{start_server, AppState, GatewaySettings, JwtManager};
use snapbin_storage::Database;
use snapbin_tasks::{ExpiryScanner, MemoryBackend, RedisBackend, TaskBackend, TaskProducer, TaskWorker};
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `snapbin serve` command until a shutdown signal arrives.
pub async fn run_serve(config: SnapbinConfig) -> Result<(), SnapbinError> {
    init_tracing(&config.server.log_level);
    info!("starting snapbin serve");

    // Fail-closed: refuse to start without a signing secret rather than
    // falling back to a well-known one.
    let Some(jwt_secret) = config.auth.jwt_secret.clone() else {
        return Err(SnapbinError::Config(
            "auth.jwt_secret is required; set it in snapbin.toml or via SNAPBIN_AUTH_JWT_SECRET"
                .to_string(),
        ));
    };

    // Storage: migrations and default-user seeding run inside open().
    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "storage initialized");

    tokio::fs::create_dir_all(&config.image.upload_dir).await?;

    // Task backend selection. The trait object is the injection seam shared
    // by the producer, both workers, and the gateway.
    let backend: Arc<dyn TaskBackend> = match config.queue.backend.as_str() {
        "memory" => {
            warn!("using in-memory queue backend; queued tasks do not survive restarts");
            Arc::new(MemoryBackend::new())
        }
        _ => {
            let backend = RedisBackend::connect(&config.queue.redis_url).await?;
            info!(url = %config.queue.redis_url, "redis queue backend connected");
            Arc::new(backend)
        }
    };

    let status_ttl = Duration::from_secs(config.queue.status_ttl_secs);
    let poll_timeout = Duration::from_secs(config.queue.poll_timeout_secs);
    let producer = TaskProducer::new(backend.clone(), status_ttl);

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // One worker loop per task kind, plus the expiry scanner.
    let mut background = Vec::new();
    for kind in [TaskKind::Delete, TaskKind::Expire] {
        let worker = TaskWorker::new(
            kind,
            backend.clone(),
            db.clone(),
            poll_timeout,
            status_ttl,
        );
        background.push(tokio::spawn(worker.run(cancel.clone())));
    }

    let scanner = ExpiryScanner::new(
        db.clone(),
        producer.clone(),
        Duration::from_secs(config.image.cleanup_interval_secs),
    );
    background.push(tokio::spawn(scanner.run(cancel.clone())));

    // Serve HTTP until the token fires.
    let state = AppState {
        db,
        producer,
        jwt: Arc::new(JwtManager::new(
            &jwt_secret,
            Duration::from_secs(config.auth.token_ttl_secs),
        )),
        settings: Arc::new(GatewaySettings {
            host: config.server.host.clone(),
            port: config.server.port,
            upload_dir: config.image.upload_dir.clone(),
            max_file_size_bytes: config.image.max_file_size_bytes,
        }),
    };
    start_server(state, cancel.clone()).await?;

    // The server has drained; stop the background loops and wait for them.
    cancel.cancel();
    for handle in background {
        let _ = handle.await;
    }

    info!("snapbin serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,snapbin={log_level},snapbin_storage={log_level},snapbin_tasks={log_level},snapbin_gateway={log_level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
