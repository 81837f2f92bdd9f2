//! Errors raised before any conversion work starts.

use thiserror::Error;

use crate::sample_day::{ALL_SERVICE_IDS, DAY_WITH_MOST_SERVICES, DAY_WITH_MOST_TRIPS};

/// Fatal errors of the conversion entry point.
///
/// Both variants abort the run before the feed is read or any output is
/// written.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConvertError {
    /// The entry point received a number of positional parameters other than 4, 5 or 6
    #[error("Wrong number of input arguments: expected 4, 5 or 6, got {0}")]
    ArgumentCount(usize),
    /// The sample day token is neither a sentinel nor a valid `yyyymmdd` date
    #[error(
        "Sample day parameter '{0}' not recognized! Allowed: date in format \"yyyymmdd\", {DAY_WITH_MOST_SERVICES}, {DAY_WITH_MOST_TRIPS}, {ALL_SERVICE_IDS}"
    )]
    InvalidSelector(String),
}
