//! Exam scheduler HTTP server binary.
//!
//! Loads the configuration, initializes the repository, and serves the
//! scheduling API.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory repository (default)
//! cargo run --bin exam-scheduler-server
//!
//! # Use an explicit configuration file
//! SCHEDULER_CONFIG=/etc/exam-scheduler/scheduler.toml cargo run --bin exam-scheduler-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SCHEDULER_CONFIG`: Path to `scheduler.toml` (optional)
//! - `REPOSITORY_TYPE`: Overrides `[repository] type` from the file
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use exam_scheduler::db::{self, SchedulerConfig};
use exam_scheduler::http::{create_router, AppState};
use exam_scheduler::scheduling::SchedulingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting exam scheduler");

    let config = SchedulerConfig::load()?;
    db::init_repository(&config)?;
    let repository = Arc::clone(db::get_repository()?);
    info!(
        "Repository initialized (default capacity {}, orphan policy {:?})",
        config.scheduling.default_capacity, config.scheduling.orphan_policy
    );

    let service = SchedulingService::with_system_clock(repository, config.scheduling.clone());
    let app = create_router(AppState::new(Arc::new(service)));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
