use std::io::{self, ErrorKind};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The end of the combined stream is not known before the remote stream
    /// has been drained, so end-relative seeking is not possible.
    #[error("seeking relative to the end of the stream is not supported")]
    UnsupportedSeekMode,

    #[error("cannot seek to {target}, only {cached} bytes have been cached so far")]
    SeekBeyondCached { target: u64, cached: u64 },

    #[error("cannot seek before the start of the stream")]
    SeekBeforeStart,

    /// Failure of the buffer or the remote stream, passed through untouched.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(why) => why,
            Error::UnsupportedSeekMode => io::Error::new(ErrorKind::Unsupported, err),
            other => io::Error::new(ErrorKind::InvalidInput, other),
        }
    }
}
