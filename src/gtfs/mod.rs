mod calendar;
mod config;
pub mod models;

pub use calendar::active_service_ids;
pub use config::*;

use models::*;
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;
use zip::{ZipArchive, read::ZipFile};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not find file with name: {0}")]
    FileNotFound(String),
    #[error("missing any source to pull data from")]
    MissingSource,
}

#[derive(Default)]
pub enum Source {
    #[default]
    None,
    Zip(ZipArchive<File>),
    Directory(PathBuf),
}

/// All seven GTFS tables this crate needs, read once.
#[derive(Debug, Default)]
pub struct GtfsFeed {
    pub stops: Vec<GtfsStop>,
    pub agencies: Vec<GtfsAgency>,
    pub routes: Vec<GtfsRoute>,
    pub trips: Vec<GtfsTrip>,
    pub stop_times: Vec<GtfsStopTime>,
    pub calendar: Vec<GtfsCalendar>,
    pub calendar_dates: Vec<GtfsCalendarDate>,
}

#[derive(Default)]
pub struct Gtfs {
    config: Config,
    storage: Source,
}

impl Gtfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn from_zip<P: AsRef<Path>>(mut self, path: P) -> Result<Self, self::Error> {
        let zip_file = File::open(path)?;
        let archive = ZipArchive::new(zip_file)?;
        self.storage = Source::Zip(archive);
        Ok(self)
    }

    pub fn from_zip_cache<P: AsRef<Path>>(mut self, path: P) -> Result<Self, self::Error> {
        let directory = Gtfs::get_or_create_cache_dir(&path)?;
        self.storage = Source::Directory(directory);
        Ok(self)
    }

    pub fn from_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage = Source::Directory(path.as_ref().to_path_buf());
        self
    }

    fn get_or_create_cache_dir<P: AsRef<Path>>(zip_path: P) -> Result<PathBuf, self::Error> {
        let zip_path = zip_path.as_ref();
        let mut target_dir = PathBuf::from(zip_path);
        target_dir.set_extension("");

        if !target_dir.exists() {
            info!("extracting GTFS feed to {:?}", target_dir);
            fs::create_dir_all(&target_dir)?;
            let file = fs::File::open(zip_path)?;
            let mut archive = zip::ZipArchive::new(file)?;
            archive.extract(&target_dir)?;
        } else {
            info!("using existing GTFS cache at {:?}", target_dir);
        }

        Ok(target_dir)
    }

    fn stream<T, F>(&mut self, file_name: &str, f: F) -> Result<(), self::Error>
    where
        T: DeserializeOwned,
        F: FnMut((usize, T)),
    {
        match &mut self.storage {
            Source::None => Err(self::Error::MissingSource),
            Source::Zip(archive) => stream_from_zip(archive, file_name, f),
            Source::Directory(path) => stream_from_dir(path, file_name, f),
        }
    }

    /// Reads every table into memory. Individual `stream_*` methods exist
    /// for callers that want to avoid materialising tables they don't need.
    pub fn load_all(&mut self) -> Result<GtfsFeed, self::Error> {
        let mut feed = GtfsFeed::default();
        self.stream(&self.config.stops_path.clone(), |(_, row)| {
            feed.stops.push(row)
        })?;
        self.stream(&self.config.agency_path.clone(), |(_, row)| {
            feed.agencies.push(row)
        })?;
        self.stream(&self.config.routes_path.clone(), |(_, row)| {
            feed.routes.push(row)
        })?;
        self.stream(&self.config.trips_path.clone(), |(_, row)| {
            feed.trips.push(row)
        })?;
        self.stream(&self.config.stop_times_path.clone(), |(_, row)| {
            feed.stop_times.push(row)
        })?;
        self.stream(&self.config.calendar_path.clone(), |(_, row)| {
            feed.calendar.push(row)
        })?;
        // calendar_dates.txt is optional in GTFS; treat a missing file as empty.
        match self.stream(&self.config.calendar_dates_path.clone(), |(_, row)| {
            feed.calendar_dates.push(row)
        }) {
            Ok(()) | Err(self::Error::FileNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        Ok(feed)
    }
}

fn stream_from_zip<T, F>(
    archive: &mut ZipArchive<File>,
    file_name: &str,
    mut f: F,
) -> Result<(), self::Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let file = get_file_from_zip(archive, file_name)?;
    let mut reader = csv::Reader::from_reader(file);
    for (i, result) in reader.deserialize().enumerate() {
        let record: T = result?;
        f((i, record));
    }
    Ok(())
}

fn stream_from_dir<T, F>(dir_path: &Path, file_name: &str, mut f: F) -> Result<(), self::Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let file_path = dir_path.join(file_name);
    if !file_path.exists() {
        return Err(self::Error::FileNotFound(file_name.to_string()));
    }
    let file = fs::File::open(file_path)?;
    // BufReader is critical here for speed on large feeds.
    let reader = io::BufReader::with_capacity(128 * 1024, file);
    let mut csv_reader = csv::Reader::from_reader(reader);
    for (i, result) in csv_reader.deserialize().enumerate() {
        let record: T = result?;
        f((i, record));
    }
    Ok(())
}

fn get_file_from_zip<'a>(
    archive: &'a mut ZipArchive<File>,
    name: &'a str,
) -> Result<ZipFile<'a, File>, self::Error> {
    let index = archive
        .index_for_name(name)
        .ok_or_else(|| self::Error::FileNotFound(name.to_string()))?;
    let file = archive.by_index(index)?;
    Ok(file)
}
