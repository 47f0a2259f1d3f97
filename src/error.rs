//! Error type shared by every stage of the compressor.
//!
//! Compression is deterministic, so none of these errors is transient. Anything other than an
//! I/O failure of the wrapped sink means a bug, and the first failure poisons the whole pipeline.

use std::fmt;
use std::io;
use std::sync::Arc;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Bz2Error>;

/// Errors that can occur while producing a bzip2 stream.
#[derive(Debug)]
pub enum Bz2Error {
    /// The wrapped byte sink failed.
    Io(io::Error),

    /// An internal invariant was violated (origin pointer missing, sort stack exhausted,
    /// code length out of range, block closed twice, ...).
    Internal(&'static str),

    /// A compression thread died without reporting a result.
    WorkerPanicked,

    /// An earlier failure halted the pipeline. Carries the original failure.
    Poisoned(Arc<Bz2Error>),

    /// Data was offered after the stream was finalized.
    StreamFinished,
}

impl fmt::Display for Bz2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bz2Error::Io(e) => write!(f, "bzip2: io error: {}", e),
            Bz2Error::Internal(msg) => write!(f, "bzip2: internal error: {}", msg),
            Bz2Error::WorkerPanicked => write!(f, "bzip2: a compression thread panicked"),
            Bz2Error::Poisoned(cause) => write!(f, "bzip2: compression pipeline halted: {}", cause),
            Bz2Error::StreamFinished => write!(f, "bzip2: stream already finished"),
        }
    }
}

impl std::error::Error for Bz2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Bz2Error::Io(e) => Some(e),
            Bz2Error::Poisoned(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Bz2Error {
    fn from(e: io::Error) -> Self {
        Bz2Error::Io(e)
    }
}

impl From<Bz2Error> for io::Error {
    fn from(e: Bz2Error) -> Self {
        match e {
            Bz2Error::Io(inner) => inner,
            Bz2Error::Poisoned(cause) => {
                // Keep the kind of an I/O failure visible through the poison
                let kind = match cause.as_ref() {
                    Bz2Error::Io(e) => e.kind(),
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, Bz2Error::Poisoned(cause))
            }
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_conversion_test() {
        let err: Bz2Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Bz2Error::Io(_)));
        let back: io::Error = err.into();
        assert_eq!(back.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn poisoned_source_test() {
        let cause = Arc::new(Bz2Error::Internal("origin pointer not found"));
        let err = Bz2Error::Poisoned(cause);
        assert!(err.to_string().contains("origin pointer not found"));
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("internal error"));
    }

    #[test]
    fn internal_maps_to_other_test() {
        let io_err: io::Error = Bz2Error::Internal("block closed twice").into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn poisoned_io_keeps_kind_test() {
        let cause = Arc::new(Bz2Error::Io(io::Error::new(io::ErrorKind::WriteZero, "disk full")));
        let io_err: io::Error = Bz2Error::Poisoned(cause).into();
        assert_eq!(io_err.kind(), io::ErrorKind::WriteZero);
    }
}
