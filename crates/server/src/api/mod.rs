mod gtfs;
mod plan;

pub use gtfs::{age, fetch_url};
pub use plan::plan;
