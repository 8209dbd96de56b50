use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Result};

pub type Metadata = BTreeMap<String, String>;

/// A source which can be consumed only once, front to back.
///
/// [`position`](RemoteStream::position) must report how many bytes have been
/// consumed through [`Read`], and nothing but `read` may advance it.
pub trait RemoteStream: Read {
    /// Number of bytes consumed so far.
    fn position(&self) -> u64;

    /// Returns `true` if the next read would yield no data.
    fn is_eof(&mut self) -> Result<bool>;

    /// Advertised total size of the source, if known.
    fn size(&self) -> Option<u64> {
        None
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> &Metadata;

    fn set_metadata(&mut self, key: String, value: String);

    fn uri(&self) -> Option<&str> {
        None
    }
}

/// Turns any [`Read`](std::io::Read) into a [`RemoteStream`].
///
/// End of data is detected by peeking into an internal [`BufReader`], so
/// asking for it never consumes bytes.
pub struct SequentialStream<R> where R: Read {
    reader: BufReader<R>,
    consumed: u64,
    size: Option<u64>,
    uri: Option<String>,
    metadata: Metadata,
}

impl<R> SequentialStream<R> where R: Read {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            consumed: 0,
            size: None,
            uri: None,
            metadata: Metadata::new(),
        }
    }

    /// Sets the advertised size, e.g. taken from a `Content-Length` header.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Gives access to the wrapped reader. Reading from it directly breaks the
    /// byte accounting of this stream.
    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Unwraps the reader. Bytes which were peeked but not consumed are lost.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R> Read for SequentialStream<R> where R: Read {
    fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        let bytes = self.reader.read(dst)?;
        self.consumed += bytes as u64;
        Ok(bytes)
    }
}

impl<R> RemoteStream for SequentialStream<R> where R: Read {
    fn position(&self) -> u64 {
        self.consumed
    }

    fn is_eof(&mut self) -> Result<bool> {
        Ok(self.reader.fill_buf()?.is_empty())
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn set_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}
