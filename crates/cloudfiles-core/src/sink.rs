//! Response body destinations.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::Result;

/// Where a response body goes.
///
/// The mode is picked by the caller before the request is sent.
pub enum Sink<'a> {
    /// Body is not expected and dropped if present.
    Discard,
    /// Body is buffered, then split into lines with [`Sink::lines`].
    TextList(BytesMut),
    /// Body is buffered as is.
    Buffer(BytesMut),
    /// Body is written to a caller-owned destination as it arrives.
    ///
    /// The destination is flushed but never shut down.
    Stream {
        writer: &'a mut (dyn AsyncWrite + Send + Unpin),
        written: u64,
    },
}

impl std::fmt::Debug for Sink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Discard => f.write_str("Discard"),
            Sink::TextList(buf) => f.debug_tuple("TextList").field(&buf.len()).finish(),
            Sink::Buffer(buf) => f.debug_tuple("Buffer").field(&buf.len()).finish(),
            Sink::Stream { written, .. } => {
                f.debug_struct("Stream").field("written", written).finish()
            }
        }
    }
}

impl<'a> Sink<'a> {
    /// Creates a sink that ignores the body.
    pub fn discard() -> Self {
        Sink::Discard
    }

    /// Creates a line-splitting sink.
    pub fn text_list() -> Self {
        Sink::TextList(BytesMut::new())
    }

    /// Creates a buffering sink.
    pub fn buffer() -> Self {
        Sink::Buffer(BytesMut::new())
    }

    /// Creates a sink writing into `writer`.
    pub fn stream(writer: &'a mut (dyn AsyncWrite + Send + Unpin)) -> Self {
        Sink::Stream { writer, written: 0 }
    }

    /// Delivers one body chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        match self {
            Sink::Discard => {}
            Sink::TextList(buf) | Sink::Buffer(buf) => buf.extend_from_slice(chunk),
            Sink::Stream { writer, written } => {
                writer.write_all(chunk).await?;
                *written += chunk.len() as u64;
            }
        }
        Ok(())
    }

    /// Flushes a stream destination.
    pub async fn finish(&mut self) -> Result<()> {
        if let Sink::Stream { writer, .. } = self {
            writer.flush().await?;
        }
        Ok(())
    }

    /// Drops anything buffered so far.
    pub fn reset(&mut self) {
        match self {
            Sink::TextList(buf) | Sink::Buffer(buf) => buf.clear(),
            Sink::Stream { written, .. } => *written = 0,
            Sink::Discard => {}
        }
    }

    /// Returns the number of body bytes received.
    pub fn len(&self) -> u64 {
        match self {
            Sink::Discard => 0,
            Sink::TextList(buf) | Sink::Buffer(buf) => buf.len() as u64,
            Sink::Stream { written, .. } => *written,
        }
    }

    /// Returns whether no body bytes were received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the buffered lines of a text-list or buffer sink.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Sink::TextList(buf) | Sink::Buffer(buf) => split_lines(buf),
            _ => Vec::new(),
        }
    }

    /// Consumes the sink, returning buffered bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Sink::TextList(buf) | Sink::Buffer(buf) => buf.freeze(),
            _ => Bytes::new(),
        }
    }
}

/// Splits a text listing into entries.
///
/// A single trailing newline is dropped first; an empty body yields no entries.
pub fn split_lines(body: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.strip_suffix('\n').unwrap_or(&text);

    if text.is_empty() {
        return Vec::new();
    }

    text.split('\n').map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_strips_single_trailing_newline() {
        assert_eq!(split_lines(b"a\nb\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(split_lines(b"a\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines(b"a\n\n"), vec!["a", ""]);
        assert!(split_lines(b"").is_empty());
        assert!(split_lines(b"\n").is_empty());
    }

    #[tokio::test]
    async fn test_text_list_sink() {
        let mut sink = Sink::text_list();
        sink.write_chunk(b"photos\nvid").await.unwrap();
        sink.write_chunk(b"eos\n").await.unwrap();
        sink.finish().await.unwrap();
        assert_eq!(sink.lines(), vec!["photos", "videos"]);
        assert_eq!(sink.len(), 14);
    }

    #[tokio::test]
    async fn test_buffer_sink_keeps_bytes() {
        let mut sink = Sink::buffer();
        sink.write_chunk(b"{\"a\":1}\n").await.unwrap();
        assert_eq!(&sink.into_bytes()[..], b"{\"a\":1}\n");
    }

    #[tokio::test]
    async fn test_stream_sink_writes_through() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut sink = Sink::stream(&mut out);
            sink.write_chunk(b"hello ").await.unwrap();
            sink.write_chunk(b"world").await.unwrap();
            sink.finish().await.unwrap();
            assert_eq!(sink.len(), 11);
            assert!(sink.into_bytes().is_empty());
        }
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn test_discard_and_reset() {
        let mut sink = Sink::discard();
        sink.write_chunk(b"ignored").await.unwrap();
        assert!(sink.is_empty());

        let mut sink = Sink::buffer();
        sink.write_chunk(b"partial").await.unwrap();
        sink.reset();
        assert!(sink.is_empty());
    }
}
