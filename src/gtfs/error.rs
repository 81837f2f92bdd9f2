//! Errors of the GTFS feed reader.
use thiserror::Error;

/// An error that can occur while reading a GTFS directory.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The feed path does not point to a directory (zip archives are not supported)
    #[error("Could not read GTFS: {0} is not a directory")]
    NotADirectory(String),
    /// A mandatory file is not present in the feed
    #[error("Could not find file {0}")]
    MissingFile(String),
    /// Neither calendar.txt nor calendar_dates.txt is present
    #[error("The feed has neither calendar.txt nor calendar_dates.txt")]
    NoCalendar,
    /// A file references an id that is not present
    #[error("The {kind} id {id} is not known")]
    ReferenceError {
        /// What kind of object was referenced
        kind: &'static str,
        /// The unknown id
        id: String,
    },
    /// The time is not given in the HH:MM:SS format
    #[error("'{0}' is not a valid time; HH:MM:SS format is expected.")]
    InvalidTime(String),
    /// Impossible to open a file
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        /// The file name that could not be read
        file_name: String,
        /// The initial error
        #[source]
        source: std::io::Error,
    },
    /// Impossible to parse a CSV file
    #[error("impossible to read csv file '{file_name}'")]
    Csv {
        /// File name that could not be parsed as CSV
        file_name: String,
        /// The initial error by the csv library
        #[source]
        source: csv::Error,
    },
}
