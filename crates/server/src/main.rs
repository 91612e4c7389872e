mod api;
mod dto;
mod state;

use crate::state::AppState;
use axum::routing::get;
use std::{env, path::Path, process, sync::Arc, time::Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use trailbus::config::Config;
use trailbus::deadline::{DefaultDeadlineSupplier, NoCandleLightingSource};
use trailbus::gtfs::Gtfs;
use trailbus::trail::FileTrailSource;

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let start_logo = include_str!("../start_logo.txt");
    println!("{}", start_logo);

    let gtfs_data_path = match env::var("GTFS_DATA_PATH") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            error!("Failed loading GTFS_DATA_PATH: {}", err);
            process::exit(1);
        }
    };
    let trail_index_path = match env::var("TRAIL_INDEX_PATH") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            error!("Failed loading TRAIL_INDEX_PATH: {}", err);
            process::exit(1);
        }
    };

    let app_state = AppState {
        feed: RwLock::new(None),
        trails: FileTrailSource::new(&trail_index_path),
        deadline: DefaultDeadlineSupplier::new(NoCandleLightingSource),
        gtfs_data_path,
        config: Config::default(),
    };

    if app_state.gtfs_data_path.exists() {
        info!("Loading data...");
        let now = Instant::now();
        let mut gtfs = Gtfs::new().from_zip(&app_state.gtfs_data_path).unwrap();
        let feed = gtfs.load_all().unwrap();
        let _ = app_state.feed.write().await.replace(feed);
        info!("Loading data took {:?}", now.elapsed());
    } else {
        warn!("No GTFS data found.");
    }

    info!("Starting server...");

    let app = axum::Router::new()
        .route("/plan", get(api::plan))
        .route("/gtfs/fetch-url", get(api::fetch_url))
        .route("/gtfs/age", get(api::age))
        .with_state(Arc::new(app_state));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", PORT))
        .await
        .unwrap();
    info!("Listening to port {PORT}");
    axum::serve(listener, app).await.unwrap();
}
