use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use log::{debug, trace};
use tempfile::SpooledTempFile;

use crate::buffer::{buffer_len, CacheBuffer};
use crate::error::{Error, Result};
use crate::remote::{Metadata, RemoteStream};

/// Number of bytes the default buffer keeps in memory before it is moved
/// into an anonymous temporary file.
pub const DEFAULT_MEMORY_LIMIT: usize = 2 * 1024 * 1024;

/// Chunk size used by [`CachingStream::contents`].
pub const MATERIALIZE_CHUNK_SIZE: usize = 16 * 1024;

// upper bound for skipped bytes requested from the remote stream in one read
const MAX_SKIP_CHUNK: usize = 64 * 1024;

/// Caches every byte of a [`RemoteStream`] in a [`CacheBuffer`] and offers
/// the combination as one [`Read`] + [`Write`] + [`Seek`] stream.
///
/// The position of the caching stream is the position of the buffer. The
/// remote stream is never seeked; it only advances when a read needs bytes
/// behind the end of the buffer.
///
/// A `CachingStream` must be the only user of both streams while it is alive.
/// It has no internal locking, concurrent use requires external
/// synchronization.
pub struct CachingStream<R, B = SpooledTempFile> where R: RemoteStream, B: CacheBuffer {
    remote: R,
    buffer: B,

    /// Bytes which a local write has already placed in the buffer and which
    /// must be dropped from the next remote reads.
    pending_skip: u64,
}

impl<R> CachingStream<R> where R: RemoteStream {
    /// Creates a new CachingStream backed by a [`SpooledTempFile`] which holds
    /// up to [`DEFAULT_MEMORY_LIMIT`] bytes in memory.
    pub fn new(remote: R) -> Self {
        Self::with_memory_limit(remote, DEFAULT_MEMORY_LIMIT)
    }

    /// Creates a new CachingStream backed by a [`SpooledTempFile`] which
    /// spills to disk once it holds more than `memory_limit` bytes.
    pub fn with_memory_limit(remote: R, memory_limit: usize) -> Self {
        Self::with_buffer(remote, SpooledTempFile::new(memory_limit))
    }
}

impl<R> CachingStream<R, Cursor<Vec<u8>>> where R: RemoteStream {
    /// Creates a new CachingStream which keeps all cached bytes in memory.
    pub fn in_memory(remote: R) -> Self {
        Self::with_buffer(remote, Cursor::new(Vec::new()))
    }
}

impl<R, B> CachingStream<R, B> where R: RemoteStream, B: CacheBuffer {
    /// Creates a new CachingStream which caches into `buffer`.
    ///
    /// The buffer is normally empty. Bytes it already holds are taken as the
    /// cached beginning of `remote`, which must then be positioned directly
    /// behind them.
    pub fn with_buffer(remote: R, buffer: B) -> Self {
        Self {
            remote,
            buffer,
            pending_skip: 0,
        }
    }

    /// Returns the current position, which is the position of the buffer.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.buffer.stream_position()?)
    }

    /// Returns the number of bytes cached so far. This is the farthest
    /// position [`seek_to`](Self::seek_to) accepts.
    pub fn cached_len(&mut self) -> Result<u64> {
        Ok(buffer_len(&mut self.buffer)?)
    }

    /// Returns an upper bound of the combined size: the larger one of the
    /// cached length and the advertised remote size. An unknown remote size
    /// counts as zero.
    pub fn size(&mut self) -> Result<u64> {
        let cached = self.cached_len()?;
        Ok(cached.max(self.remote.size().unwrap_or(0)))
    }

    /// Returns `true` if neither the buffer nor the remote stream has any
    /// more bytes to offer.
    pub fn is_eof(&mut self) -> Result<bool> {
        let position = self.position()?;
        if position < self.cached_len()? {
            return Ok(false);
        }
        Ok(self.remote.is_eof()?)
    }

    /// Moves the position, but never behind the cached bytes.
    ///
    /// [`SeekFrom::End`] is rejected with [`Error::UnsupportedSeekMode`],
    /// targets behind the cached bytes with [`Error::SeekBeyondCached`]. On
    /// error the position is not changed.
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => {
                let current = self.position()?;
                if delta < 0 {
                    current.checked_sub(delta.unsigned_abs()).ok_or(Error::SeekBeforeStart)?
                } else {
                    current + delta as u64
                }
            }

            // We don't know where the end of the remote stream is
            SeekFrom::End(_) => return Err(Error::UnsupportedSeekMode),
        };

        let cached = self.cached_len()?;
        if target > cached {
            return Err(Error::SeekBeyondCached { target, cached });
        }
        Ok(self.buffer.seek(SeekFrom::Start(target))?)
    }

    /// Reads a single line, byte by byte.
    ///
    /// Reading stops after a `\n` (which is part of the result), at the end of
    /// the stream, or as soon as `max_length - 1` bytes have been collected.
    /// A `max_length` of `0` or `1` therefore imposes no limit.
    pub fn read_line(&mut self, max_length: Option<usize>) -> Result<Vec<u8>> {
        let limit = max_length.map(|max| max.saturating_sub(1)).filter(|limit| *limit > 0);
        let mut line = Vec::new();
        let mut byte = [0; 1];
        loop {
            if self.read(&mut byte)? == 0 {
                break;
            }
            line.push(byte[0]);
            if byte[0] == b'\n' || Some(line.len()) == limit {
                break;
            }
        }
        Ok(line)
    }

    /// Returns the whole content of the stream from offset zero, leaving the
    /// position unchanged.
    ///
    /// This drains the remote stream completely, so every remaining byte ends
    /// up in the buffer.
    pub fn contents(&mut self) -> Result<Vec<u8>> {
        let saved = self.position()?;
        let result = self.read_from_start();
        self.buffer.seek(SeekFrom::Start(saved))?;
        result
    }

    fn read_from_start(&mut self) -> Result<Vec<u8>> {
        self.seek_to(SeekFrom::Start(0))?;
        let mut contents = Vec::new();
        let mut chunk = vec![0; MATERIALIZE_CHUNK_SIZE];
        while !self.is_eof()? {
            let bytes = self.read(&mut chunk)?;
            if bytes == 0 {
                break;
            }
            contents.extend_from_slice(&chunk[..bytes]);
        }
        Ok(contents)
    }

    /// Closes the remote stream and then the buffer.
    ///
    /// If closing the remote stream fails, the buffer is not closed explicitly
    /// and the error is returned; its storage is released when it is dropped.
    pub fn close(mut self) -> Result<()> {
        self.remote.close()?;
        self.buffer.close()?;
        debug!("closed caching stream after {} remote bytes", self.remote.position());
        Ok(())
    }

    /// Returns the remote stream, which also serves as the handle of the
    /// underlying resource.
    pub fn get_ref(&self) -> &R {
        &self.remote
    }

    /// Returns the remote stream. Reading from it directly corrupts the
    /// content of this stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Unwraps the remote stream and the buffer without closing them.
    pub fn into_inner(self) -> (R, B) {
        (self.remote, self.buffer)
    }

    pub fn metadata(&self) -> &Metadata {
        self.remote.metadata()
    }

    pub fn metadata_entry(&self, key: &str) -> Option<&str> {
        self.remote.metadata().get(key).map(String::as_str)
    }

    pub fn set_metadata<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.remote.set_metadata(key.into(), value.into());
        self
    }

    pub fn uri(&self) -> Option<&str> {
        self.remote.uri()
    }

    /// Reads fresh bytes from the remote stream into `dst` and appends them to
    /// the buffer. Bytes still owed to `pending_skip` are dropped first.
    fn fetch_remote(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.pending_skip == 0 {
            let fetched = self.remote.read(dst)?;
            trace!("fetched {} of {} requested remote bytes", fetched, dst.len());
            self.buffer.write_all(&dst[..fetched])?;
            return Ok(fetched);
        }

        loop {
            let skip = self.pending_skip.min(MAX_SKIP_CHUNK as u64) as usize;
            let mut chunk = vec![0; dst.len() + skip];
            let fetched = self.remote.read(&mut chunk)?;
            trace!("fetched {} of {} requested remote bytes", fetched, chunk.len());
            if fetched == 0 {
                return Ok(0);
            }

            let discarded = self.pending_skip.min(fetched as u64) as usize;
            self.pending_skip -= discarded as u64;
            if discarded > 0 {
                trace!("discarded {} overwritten remote bytes, {} still pending", discarded, self.pending_skip);
            }

            let fresh = &chunk[discarded..fetched];
            if fresh.is_empty() {
                // a read returning nothing would signal the end of the stream
                continue;
            }
            self.buffer.write_all(fresh)?;
            dst[..fresh.len()].copy_from_slice(fresh);
            return Ok(fresh.len());
        }
    }
}

impl<R, B> Read for CachingStream<R, B> where R: RemoteStream, B: CacheBuffer {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        let from_buffer = self.buffer.read(dst)?;
        if from_buffer == dst.len() {
            return Ok(from_buffer);
        }
        match self.fetch_remote(&mut dst[from_buffer..]) {
            Ok(from_remote) => Ok(from_buffer + from_remote),

            // the cached bytes have been consumed, so they must be reported;
            // the next read hits the remote stream again
            Err(why) if from_buffer > 0 => {
                trace!("remote read failed after {} cached bytes: {}", from_buffer, why);
                Ok(from_buffer)
            }
            Err(why) => Err(why),
        }
    }
}

impl<R, B> Write for CachingStream<R, B> where R: RemoteStream, B: CacheBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let start = self.buffer.stream_position()?;
        let written = self.buffer.write(data)?;

        // everything up to here has been yielded by the remote stream or is
        // already owed to a previous write
        let frontier = self.remote.position() + self.pending_skip;
        let end = start + written as u64;
        if end > frontier {
            self.pending_skip += end - frontier;
            debug!("write ends {} bytes ahead of the remote stream, skipping {} remote bytes", end - frontier, self.pending_skip);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }
}

impl<R, B> Seek for CachingStream<R, B> where R: RemoteStream, B: CacheBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.buffer.stream_position()
    }
}
