use std::path::PathBuf;
use tokio::sync::RwLock;
use trailbus::config::Config;
use trailbus::deadline::{DefaultDeadlineSupplier, NoCandleLightingSource};
use trailbus::gtfs::GtfsFeed;
use trailbus::trail::FileTrailSource;

pub struct AppState {
    pub gtfs_data_path: PathBuf,
    pub feed: RwLock<Option<GtfsFeed>>,
    pub trails: FileTrailSource,
    pub deadline: DefaultDeadlineSupplier<NoCandleLightingSource>,
    pub config: Config,
}
