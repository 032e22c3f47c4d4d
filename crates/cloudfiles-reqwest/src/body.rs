//! Streamed upload bodies.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use cloudfiles_core::{MAX_OBJECT_SIZE, ProgressFn, UploadBody};
use futures::future::ready;
use futures::{Stream, TryStreamExt};
use reqwest::Body;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// An upload body ready to be attached to a request.
pub(crate) struct StreamedBody {
    pub body: Body,
    pub length: Option<u64>,
    pub guard: SizeGuard,
}

/// Flag raised when the source produced more than [`MAX_OBJECT_SIZE`]
/// bytes, which aborts the request.
#[derive(Debug, Clone, Default)]
pub(crate) struct SizeGuard(Arc<AtomicBool>);

impl SizeGuard {
    pub fn exceeded(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Turns an upload body into a streaming reqwest body.
///
/// Every chunk read from the source is reported to `progress` before it is
/// handed to the connection.
pub(crate) fn streaming_body(upload: UploadBody, progress: Option<ProgressFn>) -> StreamedBody {
    let (reader, length) = upload.into_parts();
    let guard = SizeGuard::default();
    let stream = limited_stream(reader, MAX_OBJECT_SIZE, guard.clone(), progress);

    StreamedBody {
        body: Body::wrap_stream(stream),
        length,
        guard,
    }
}

fn limited_stream(
    reader: impl AsyncRead + Send + Sync + Unpin + 'static,
    limit: u64,
    guard: SizeGuard,
    progress: Option<ProgressFn>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
    let mut sent = 0u64;
    ReaderStream::new(reader).and_then(move |chunk| {
        sent += chunk.len() as u64;
        if sent > limit {
            guard.0.store(true, Ordering::Release);
            return ready(Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("upload exceeds {limit} bytes"),
            )));
        }

        if let Some(callback) = &progress {
            callback(chunk.len() as u64);
        }
        ready(Ok(chunk))
    })
}
