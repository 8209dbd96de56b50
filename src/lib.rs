//! This crate turns a forward-only [`Read`](std::io::Read) object, such as the body of a network
//! response, into a [`Read`](std::io::Read)+[`Write`](std::io::Write)+[`Seek`](std::io::Seek) stream.
//! Every byte pulled from the source (the [`RemoteStream`]) is copied into a local, seekable
//! [`CacheBuffer`], and later reads of the same offsets are served from there.
//!
//! Seeking is limited by the following constraints:
//!
//!  - The source can only be read once, so seeking is allowed only up to the end of the bytes which have been cached so far
//!  - We don't know the end of the stream, using [`SeekFrom::End`](std::io::SeekFrom::End) is not supported
//!
//! Writes replace bytes instead of inserting them: if a write reaches behind the part of the
//! source which has already been read, the overwritten source bytes are dropped when they arrive.
//!
//! A [`CachingStream`] owns both streams exclusively and is not synchronized internally.
//!
//! # Cached bytes are served from the buffer
//! ```rust
//! use std::io::{Cursor, Read, Seek, SeekFrom};
//! use cache_stream_reader::{CachingStream, RemoteStream, SequentialStream};
//!
//! let remote = SequentialStream::new(Cursor::new(b"abcdefghij".to_vec()));
//! let mut stream = CachingStream::new(remote);
//!
//! let mut buffer = [0; 4];
//! assert_eq!(stream.read(&mut buffer).unwrap(), 4);
//! assert_eq!(&buffer, b"abcd");
//!
//! /* seeking backwards does not touch the source again */
//! assert!(stream.seek(SeekFrom::Start(0)).is_ok());
//! assert_eq!(stream.read(&mut buffer).unwrap(), 4);
//! assert_eq!(&buffer, b"abcd");
//! assert_eq!(stream.get_ref().position(), 4);
//! ```
//!
//! # Seeking forward is possible only within the cached bytes
//! ```rust
//! # use std::io::{Cursor, Read, Seek, SeekFrom};
//! # use cache_stream_reader::{CachingStream, SequentialStream};
//! let remote = SequentialStream::new(Cursor::new(b"abcdefghij".to_vec()));
//! let mut stream = CachingStream::new(remote);
//!
//! let mut buffer = [0; 4];
//! stream.read_exact(&mut buffer).unwrap();
//! assert!(stream.seek(SeekFrom::Start(2)).is_ok());
//! assert!(stream.seek(SeekFrom::Start(5)).is_err());
//! assert!(stream.seek(SeekFrom::End(0)).is_err());
//! assert_eq!(stream.stream_position().unwrap(), 2);
//! ```
//!
//! # Writing replaces the matching bytes of the source
//! ```rust
//! # use std::io::{Cursor, Read, Seek, SeekFrom, Write};
//! # use cache_stream_reader::{CachingStream, SequentialStream};
//! let remote = SequentialStream::new(Cursor::new(b"abcdefghij".to_vec()));
//! let mut stream = CachingStream::new(remote);
//!
//! let mut buffer = [0; 4];
//! stream.read_exact(&mut buffer).unwrap();
//! stream.write_all(b"XY").unwrap();
//!
//! /* "ef" has been overwritten and is skipped when it arrives */
//! assert_eq!(stream.read(&mut buffer).unwrap(), 4);
//! assert_eq!(&buffer, b"ghij");
//! assert_eq!(stream.contents().unwrap(), b"abcdXYghij");
//! ```
mod buffer;
mod error;
mod reader;
mod remote;

pub use crate::buffer::CacheBuffer;
pub use crate::error::{Error, Result};
pub use crate::reader::{CachingStream, DEFAULT_MEMORY_LIMIT, MATERIALIZE_CHUNK_SIZE};
pub use crate::remote::{Metadata, RemoteStream, SequentialStream};
