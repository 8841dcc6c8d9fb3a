//! Command-line Error Types

use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not initialize logging: {_0}")]
    Logging(#[error(not(source))] String),
    #[display("could not open the catalog")]
    Catalog,
    #[display("could not open the blob store")]
    Storage,
    #[display("registry operation failed")]
    Registry,
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("could not write output")]
    Output,
}
