use thiserror::Error;

/// Crate-wide error, composed from each module's own sentinel.
#[derive(Error, Debug)]
pub enum Error {
    #[error("gtfs ingestion failed: {0}")]
    Gtfs(#[from] crate::gtfs::Error),
    #[error("schedule store: {0}")]
    Schedule(#[from] crate::schedule::Error),
    #[error("trail data unavailable: {0}")]
    Trail(#[from] crate::trail::Error),
    #[error("{0}")]
    InvalidQuery(String),
    #[error("the requested date is a Saturday, which this planner does not support")]
    SaturdayNotSupported,
    #[error("unknown origin: {0}")]
    UnknownOrigin(String),
    #[error("external feed supplier failed: {0}")]
    FeedUnavailable(String),
}

impl From<crate::deadline::Error> for Error {
    fn from(e: crate::deadline::Error) -> Self {
        match e {
            crate::deadline::Error::SaturdayNotSupported => Error::SaturdayNotSupported,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
