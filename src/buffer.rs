use std::fs::File;
use std::io::{Cursor, Read, Result, Seek, SeekFrom, Write};

use tempfile::SpooledTempFile;

/// Random access storage which holds every byte that has passed through a
/// [`CachingStream`](crate::CachingStream).
///
/// The cursor of the buffer is the cursor of the caching stream, so
/// implementors must not move it on their own.
pub trait CacheBuffer: Read + Write + Seek {
    /// Releases the buffer. The default implementation only flushes
    /// pending writes, the storage itself is freed when the value is dropped.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

impl CacheBuffer for Cursor<Vec<u8>> {}

impl CacheBuffer for SpooledTempFile {}

impl CacheBuffer for File {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl<B> CacheBuffer for &mut B where B: CacheBuffer + ?Sized {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Number of bytes stored in `buffer`, leaving its cursor untouched.
pub(crate) fn buffer_len<B>(buffer: &mut B) -> Result<u64> where B: Seek + ?Sized {
    let current = buffer.stream_position()?;
    let len = buffer.seek(SeekFrom::End(0))?;
    if current != len {
        buffer.seek(SeekFrom::Start(current))?;
    }
    Ok(len)
}
