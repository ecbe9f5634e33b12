//! Errors surfaced by terminal writes.

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::http::StatusCode;
use crate::negotiate::RangeError;
use crate::render::BoxError;

/// Why a terminal write failed.
///
/// Nothing is retried. Encoding, render and minification failures happen
/// before commit, so the caller can still pick a status and write an error
/// body. An [`Io`](Self::Io) failure mid-body leaves the bytes already
/// sent on the wire; streaming cannot take them back.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("render failed: {0}")]
    Render(#[source] BoxError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("minification failed: {0}")]
    Minify(#[source] BoxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response already committed")]
    Committed,
}

impl ResponseError {
    /// The status conventionally answered for this failure, if any.
    pub fn status_hint(&self) -> Option<StatusCode> {
        match self {
            Self::Range(_) => Some(StatusCode::RangeNotSatisfiable),
            _ => None,
        }
    }
}
