//! Transfer progress callbacks.

use std::sync::Arc;

/// Callback invoked with the byte count of each transferred chunk.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Upload and download progress callbacks held by a transport session.
///
/// Callbacks run synchronously on the data path; a slow callback slows the
/// transfer.
#[derive(Clone, Default)]
pub struct ProgressHooks {
    upload: Option<ProgressFn>,
    download: Option<ProgressFn>,
}

impl std::fmt::Debug for ProgressHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHooks")
            .field("upload", &self.upload.is_some())
            .field("download", &self.download.is_some())
            .finish()
    }
}

impl ProgressHooks {
    /// Creates hooks with no callbacks installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the upload callback.
    #[must_use]
    pub fn with_upload(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.upload = Some(Arc::new(callback));
        self
    }

    /// Sets the download callback.
    #[must_use]
    pub fn with_download(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.download = Some(Arc::new(callback));
        self
    }

    /// Replaces or clears the upload callback.
    pub fn set_upload(&mut self, callback: Option<ProgressFn>) {
        self.upload = callback;
    }

    /// Replaces or clears the download callback.
    pub fn set_download(&mut self, callback: Option<ProgressFn>) {
        self.download = callback;
    }

    /// Returns the upload callback, if any.
    pub fn upload(&self) -> Option<&ProgressFn> {
        self.upload.as_ref()
    }

    /// Returns the download callback, if any.
    pub fn download(&self) -> Option<&ProgressFn> {
        self.download.as_ref()
    }

    /// Reports an uploaded chunk.
    #[inline]
    pub fn report_upload(&self, bytes: u64) {
        if let Some(callback) = &self.upload {
            callback(bytes);
        }
    }

    /// Reports a downloaded chunk.
    #[inline]
    pub fn report_download(&self, bytes: u64) {
        if let Some(callback) = &self.download {
            callback(bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[test]
    fn test_callbacks_are_independent() {
        let uploaded = Arc::new(AtomicU64::new(0));
        let counter = uploaded.clone();
        let hooks = ProgressHooks::new().with_upload(move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        });

        hooks.report_upload(10);
        hooks.report_upload(5);
        hooks.report_download(100);

        assert_eq!(uploaded.load(Ordering::SeqCst), 15);
        assert!(hooks.download().is_none());
    }

    #[test]
    fn test_clear_callback() {
        let mut hooks = ProgressHooks::new().with_download(|_| {});
        assert!(hooks.download().is_some());
        hooks.set_download(None);
        assert!(hooks.download().is_none());
    }
}
