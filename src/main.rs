use std::net::SocketAddr;
use std::sync::Arc;

use deadline_tracker::store::Store;
use deadline_tracker::{app, nudge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let store = Arc::new(Store::open(data_dir).await?);

    tokio::spawn(nudge::run_sweeper(store.clone()));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Starting DeadlineTracker HTTP server on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app(store).into_make_service())
        .await?;
    Ok(())
}
