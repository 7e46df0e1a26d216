use std::{error::Error as StdError, fmt};

use crate::field::DecodeError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error ending one of the parsing streams.
///
/// After yielding an `Error` a stream is finished and yields nothing more.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct Error {
    kind: ErrorKind,

    #[source]
    source: BoxError,
}

impl Error {
    pub(crate) fn inner<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind: ErrorKind::Source,
            source: Box::new(err),
        }
    }

    pub(crate) fn decode(err: DecodeError) -> Self {
        Self {
            kind: ErrorKind::Decode,
            source: Box::new(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The chunk source's error or the [`DecodeError`], unchanged.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A line was not valid UTF-8.
    Decode,
    /// The chunk source failed.
    Source,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "invalid event stream text"),
            Self::Source => write!(f, "chunk source failed"),
        }
    }
}
