//! Module for errors.
use std::{error::Error, fmt::Display};

use crate::{flatfile::Table, resolve::Hop, resources::ResourceKind};

/// Error from the station reference client and exporter.
#[derive(Debug)]
pub enum StationRefErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Error forwarded from the strum crate
    StrumError(strum::ParseError),
    /// General error with any cause information erased and replaced by a string
    GeneralError(String),

    // My own errors from this crate
    /// A required hop of the reference chain came back empty.
    ChainBreak {
        /// The hop that returned nothing.
        hop: Hop,
    },
    /// Calibrations, sensors, and responses must be all present or all absent.
    PartialSideData {
        /// Number of calibration versions found.
        calibrations: usize,
        /// Number of sensor versions found.
        sensors: usize,
        /// Number of response versions found.
        responses: usize,
    },
    /// The query transport failed or returned something that is not a record list.
    Transport {
        /// The resource kind being queried.
        kind: ResourceKind,
        /// The id or parent scope of the query.
        target: String,
        /// What went wrong.
        cause: String,
    },
    /// A record could not be laid out in its fixed-width table.
    Encoding {
        /// The table being encoded.
        table: Table,
        /// The offending field, if known.
        field: &'static str,
        /// What went wrong.
        cause: String,
    },
    /// Writing an output table failed.
    TableWrite {
        /// The table being written.
        table: Table,
        /// The underlying io error.
        source: ::std::io::Error,
    },
    /// A time value could not be parsed or is out of range.
    InvalidTime(String),
    /// A command line or API argument is invalid.
    InvalidArgument(String),
    /// There was an internal logic error.
    LogicError(&'static str),
}

impl Display for StationRefErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::StationRefErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            StrumError(err) => write!(f, "error forwarded from strum crate: {}", err),
            GeneralError(msg) => write!(f, "general error forwarded: {}", msg),

            ChainBreak { hop } => write!(f, "reference chain broken: no {} found", hop),
            PartialSideData {
                calibrations,
                sensors,
                responses,
            } => write!(
                f,
                "partial instrument data: {} calibrations, {} sensors, {} responses",
                calibrations, sensors, responses
            ),
            Transport { kind, target, cause } => {
                write!(f, "query for {} ({}) failed: {}", kind, target, cause)
            }
            Encoding { table, field, cause } => {
                write!(f, "unable to encode {} field '{}': {}", table, field, cause)
            }
            TableWrite { table, source } => {
                write!(f, "unable to write {}: {}", table.file_name(), source)
            }
            InvalidTime(msg) => write!(f, "invalid time: {}", msg),
            InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            LogicError(msg) => write!(f, "internal logic error: {}", msg),
        }
    }
}

impl Error for StationRefErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StationRefErr::IO(err) => Some(err),
            StationRefErr::StrumError(err) => Some(err),
            StationRefErr::TableWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<::std::io::Error> for StationRefErr {
    fn from(err: ::std::io::Error) -> StationRefErr {
        StationRefErr::IO(err)
    }
}

impl From<strum::ParseError> for StationRefErr {
    fn from(err: strum::ParseError) -> StationRefErr {
        StationRefErr::StrumError(err)
    }
}

impl From<::std::fmt::Error> for StationRefErr {
    fn from(err: ::std::fmt::Error) -> StationRefErr {
        StationRefErr::GeneralError(err.to_string())
    }
}

impl From<Box<dyn Error>> for StationRefErr {
    fn from(err: Box<dyn Error>) -> StationRefErr {
        StationRefErr::GeneralError(err.to_string())
    }
}
