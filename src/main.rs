use std::sync::Arc;

use jumpcut::av::cmd;
use jumpcut::config::Config;
use jumpcut::http::{self, AppState};
use jumpcut::jobs::scheduler::MediaProcessor;
use jumpcut::jobs::{JobStore, Scheduler};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    cmd::check_tools();

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .expect("Failed to create work directory");

    let store = JobStore::default();
    let processor = Arc::new(MediaProcessor::new(config.process()));
    let scheduler = Scheduler::start(store.clone(), processor, config.max_concurrent_jobs);

    let state = AppState {
        store,
        scheduler,
        config: Arc::new(config.clone()),
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    println!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
