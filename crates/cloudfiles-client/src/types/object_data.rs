//! Upload data sources.

use std::io::SeekFrom;

use bytes::Bytes;
use cloudfiles_core::{Result, UploadBody, UploadSource};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Data written to an object.
///
/// In-memory data is sent with a fixed length. A reader is sent with its
/// declared length, or chunked when the length is unknown; hashing a reader
/// reads it to the end and seeks back to where it started.
pub enum ObjectData {
    /// Bytes held in memory.
    Bytes(Bytes),
    /// A seekable reader.
    Reader {
        /// Source of the content.
        reader: Box<dyn UploadSource>,
        /// Content length, if known.
        length: Option<u64>,
    },
}

impl std::fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Reader { length, .. } => {
                f.debug_struct("Reader").field("length", length).finish()
            }
        }
    }
}

impl ObjectData {
    /// Creates data from a seekable reader.
    pub fn from_reader(reader: impl UploadSource + 'static, length: Option<u64>) -> Self {
        Self::Reader {
            reader: Box::new(reader),
            length,
        }
    }

    /// Returns the content length, if known.
    pub fn length(&self) -> Option<u64> {
        match self {
            Self::Bytes(data) => Some(data.len() as u64),
            Self::Reader { length, .. } => *length,
        }
    }

    /// Returns whether the data is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.length() == Some(0)
    }

    /// Computes the lowercase hex MD5 of the content.
    pub async fn md5(&mut self) -> Result<String> {
        match self {
            Self::Bytes(data) => Ok(compute_md5(data)),
            Self::Reader { reader, .. } => {
                let start = reader.stream_position().await?;
                let mut context = md5::Context::new();
                let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

                loop {
                    let read = reader.read(&mut buffer).await?;
                    if read == 0 {
                        break;
                    }
                    context.consume(&buffer[..read]);
                }

                reader.seek(SeekFrom::Start(start)).await?;
                Ok(format!("{:x}", context.compute()))
            }
        }
    }

    /// Returns a copy of in-memory data, which can be sent again.
    pub(crate) fn replayable(&self) -> Option<Bytes> {
        match self {
            Self::Bytes(data) => Some(data.clone()),
            Self::Reader { .. } => None,
        }
    }

    pub(crate) fn into_upload_body(self) -> UploadBody {
        match self {
            Self::Bytes(data) => UploadBody::from_bytes(data),
            Self::Reader { reader, length } => UploadBody::from_reader(reader, length),
        }
    }
}

/// Computes the lowercase hex MD5 of `data`.
pub(crate) fn compute_md5(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

impl From<Bytes> for ObjectData {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for ObjectData {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data.into())
    }
}

impl From<&'static [u8]> for ObjectData {
    fn from(data: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(data))
    }
}

impl From<String> for ObjectData {
    fn from(data: String) -> Self {
        Self::Bytes(data.into())
    }
}

impl From<&'static str> for ObjectData {
    fn from(data: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(data.as_bytes()))
    }
}
