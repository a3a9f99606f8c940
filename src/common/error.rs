//! Error types for ilium.

use std::io;

use thiserror::Error;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors returned by device operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// An offset or seek target falls outside the bounds of the device.
    ///
    /// Writes may start at most at `size`; reads and seeks must land strictly
    /// below it.
    #[error("position {position} is out of range for device of size {size}")]
    OutOfRange { position: i64, size: u64 },

    /// The wait for the access gate was cancelled.
    ///
    /// No device state was touched.
    #[error("interrupted while waiting for the device gate")]
    Interrupted,

    /// The initial storage region could not be allocated.
    #[error("unable to allocate {requested} bytes of device storage")]
    OutOfMemory { requested: usize },
}

impl Error {
    /// Build an `OutOfRange` from unsigned coordinates.
    pub(crate) fn out_of_range(position: u64, size: usize) -> Self {
        Error::OutOfRange {
            position: i64::try_from(position).unwrap_or(i64::MAX),
            size: size as u64,
        }
    }
}

/// `Interrupted` maps to `ErrorKind::Other` rather than
/// `ErrorKind::Interrupted`: a cancelled token stays cancelled, and the std
/// helpers (`write_all`, `read_to_end`) retry `Interrupted` forever.
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::OutOfRange { .. } => io::ErrorKind::InvalidInput,
            Error::Interrupted => io::ErrorKind::Other,
            Error::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
        };
        io::Error::new(kind, err)
    }
}
