//! Object handle: reads, writes and metadata.

use std::path::Path;
use std::time::Instant;

use bytes::Bytes;
use cloudfiles_core::headers::{CONTENT_TYPE, ETAG, encode_metadata};
use cloudfiles_core::{
    Error, Metadata, Method, Request, RequestShape, ResponseFields, Result, Sink, UploadBody,
    validate_object_size,
};
use tokio::io::AsyncWrite;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::Container;
use super::status::unexpected;
use crate::types::{ObjectData, ObjectInfo, guess_content_type};
use crate::{Connection, TRACING_TARGET_OBJECTS};

/// An object within a container.
///
/// A handle created with [`Container::create_object`] exists only locally
/// until it is written. Its fields mirror the last successful HEAD, listing
/// or write.
#[derive(Debug, Clone)]
pub struct Object {
    container: Container,
    name: String,
    etag: Option<String>,
    etag_override: bool,
    last_modified: Option<String>,
    content_type: Option<String>,
    content_length: u64,
    metadata: Metadata,
}

impl Object {
    pub(crate) fn new(container: Container, name: String) -> Self {
        Self {
            container,
            name,
            etag: None,
            etag_override: false,
            last_modified: None,
            content_type: None,
            content_length: 0,
            metadata: Metadata::new(),
        }
    }

    pub(crate) fn from_info(container: Container, info: ObjectInfo) -> Self {
        Self {
            etag: info.hash,
            last_modified: info.last_modified,
            content_type: info.content_type,
            content_length: info.bytes,
            ..Self::new(container, info.name)
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the MD5 checksum as lowercase hex, when known.
    #[inline]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    #[inline]
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[inline]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the metadata for editing; changes are sent by the next write
    /// or [`sync_metadata`](Self::sync_metadata).
    #[inline]
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Sets the content type sent by the next write.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Sets the checksum sent by the next verified write instead of hashing
    /// the data.
    pub fn set_etag(&mut self, etag: impl Into<String>) {
        self.etag = Some(etag.into());
        self.etag_override = true;
    }

    /// Computes the lowercase hex MD5 of `data`, rewinding readers.
    pub async fn compute_md5(data: &mut ObjectData) -> Result<String> {
        data.md5().await
    }

    /// Returns the public CDN URI of the object when its container is
    /// published.
    pub fn public_uri(&self) -> Option<Url> {
        if !self.container.is_public() {
            return None;
        }

        let mut url = Url::parse(self.container.cdn().uri.as_deref()?).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(self.name.split('/'));
        Some(url)
    }

    /// Loads the object's fields from the service.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the object does not exist.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(container = %self.container.name(), object = %self.name))]
    pub async fn refresh(&mut self) -> Result<()> {
        let this = &*self;
        let fields = this
            .connection()
            .retry(move || async move {
                let request = Request::new(RequestShape::MetadataOnly, this.url().await?);
                let fields = this.connection().send(request, &mut Sink::discard()).await?;

                match fields.status {
                    200..=299 => Ok(fields),
                    404 => Err(this.not_found()),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await?;

        self.etag = fields.etag;
        self.etag_override = false;
        self.last_modified = fields.last_modified;
        self.content_type = fields.content_type;
        self.content_length = fields.content_length.unwrap_or_default();
        self.metadata = fields.metadata;
        Ok(())
    }

    /// Reads the whole object into memory.
    ///
    /// `headers` are sent as is, e.g. `Range` or `If-None-Match`. A 304 or
    /// 412 answer to a conditional request yields an empty buffer.
    #[instrument(skip(self, headers), target = TRACING_TARGET_OBJECTS, fields(container = %self.container.name(), object = %self.name))]
    pub async fn read(&self, headers: &[(&str, &str)]) -> Result<Bytes> {
        self.connection()
            .retry(move || async move {
                let mut sink = Sink::buffer();
                self.fetch(&mut sink, headers).await?;
                Ok(sink.into_bytes())
            })
            .await
    }

    /// Streams the object into `writer` and returns the number of bytes
    /// written. The writer is flushed but not shut down.
    #[instrument(skip(self, writer, headers), target = TRACING_TARGET_OBJECTS, fields(container = %self.container.name(), object = %self.name))]
    pub async fn stream(
        &self,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
        headers: &[(&str, &str)],
    ) -> Result<u64> {
        let start = Instant::now();
        let mut sink = Sink::stream(writer);

        let result = match self.fetch(&mut sink, headers).await {
            Err(e) if self.connection().should_reauthenticate(&e) => {
                self.connection().reauthenticate().await?;
                self.fetch(&mut sink, headers).await
            }
            result => result,
        };

        match result {
            Ok(_) => {
                info!(
                    target: TRACING_TARGET_OBJECTS,
                    object = %self.name,
                    bytes = sink.len(),
                    elapsed = ?start.elapsed(),
                    "Object downloaded"
                );
                Ok(sink.len())
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    object = %self.name,
                    error = %e,
                    "Failed to download object"
                );
                Err(e)
            }
        }
    }

    /// Uploads `data` as the object's content.
    ///
    /// The content type is the one set on the handle, or else guessed from
    /// the name's extension. With `verify` the MD5 of the data (or the value
    /// given to [`set_etag`](Self::set_etag)) is sent as `ETag` and the
    /// service rejects mismatching content.
    ///
    /// # Errors
    ///
    /// - `Syntax` when the data exceeds the object size limit or the metadata
    ///   breaks its limits, before any request. A reader of unknown length
    ///   is counted while it streams and the upload aborts past the limit.
    /// - `ContentType` when no content type can be determined, or the service
    ///   answers 412.
    /// - `ChecksumMismatch` when the service answers 422.
    #[instrument(skip(self, data), target = TRACING_TARGET_OBJECTS, fields(container = %self.container.name(), object = %self.name))]
    pub async fn write(&mut self, data: impl Into<ObjectData>, verify: bool) -> Result<()> {
        let mut data = data.into();
        let length = data.length();
        if let Some(length) = length {
            validate_object_size(length)?;
        }

        let content_type = self.resolve_content_type()?;
        let mut headers = encode_metadata(&self.metadata)?;
        headers.push((CONTENT_TYPE.to_owned(), content_type.clone()));

        let etag = match (verify, self.etag_override) {
            (false, _) => None,
            (true, true) => self.etag.clone(),
            (true, false) => Some(data.md5().await?),
        };
        if let Some(etag) = &etag {
            headers.push((ETAG.to_owned(), etag.clone()));
        }

        debug!(
            target: TRACING_TARGET_OBJECTS,
            object = %self.name,
            length = ?length,
            content_type = %content_type,
            verify,
            "Uploading object"
        );

        let start = Instant::now();
        let replay = data.replayable();
        let result = match self.put(headers.clone(), data.into_upload_body()).await {
            Err(e) if self.connection().should_reauthenticate(&e) => {
                self.connection().reauthenticate().await?;
                match replay {
                    Some(bytes) => self.put(headers, UploadBody::from_bytes(bytes)).await,
                    None => {
                        warn!(
                            target: TRACING_TARGET_OBJECTS,
                            object = %self.name,
                            "Streamed upload is not replayed after re-authentication"
                        );
                        Err(e)
                    }
                }
            }
            result => result,
        };
        let elapsed = start.elapsed();

        let fields = match result {
            Ok(fields) => fields,
            Err(e) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    object = %self.name,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to upload object"
                );
                return Err(e);
            }
        };

        info!(
            target: TRACING_TARGET_OBJECTS,
            object = %self.name,
            elapsed = ?elapsed,
            "Object uploaded"
        );

        self.etag = if verify { etag } else { fields.etag };
        self.etag_override = false;
        self.content_type = Some(content_type);
        if let Some(length) = length {
            self.content_length = length;
        }
        if fields.last_modified.is_some() {
            self.last_modified = fields.last_modified;
        }
        Ok(())
    }

    /// Sends the handle's metadata without re-uploading the content.
    ///
    /// Returns `false` without a request when there is no metadata. The
    /// service replaces the whole metadata set.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(container = %self.container.name(), object = %self.name))]
    pub async fn sync_metadata(&self) -> Result<bool> {
        if self.metadata.is_empty() {
            return Ok(false);
        }

        let headers = &encode_metadata(&self.metadata)?;
        self.connection()
            .retry(move || async move {
                let request = Request::new(RequestShape::DeleteOrUpdate, self.url().await?)
                    .with_method(Method::Post)
                    .with_headers(headers.clone());
                let fields = self.connection().send(request, &mut Sink::discard()).await?;

                match fields.status {
                    202 => Ok(true),
                    404 => Err(self.not_found()),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await
    }

    /// Uploads the file at `path`, streaming it from disk.
    pub async fn load_from_path(&mut self, path: impl AsRef<Path>, verify: bool) -> Result<()> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        let length = file.metadata().await?.len();
        self.write(ObjectData::from_reader(file, Some(length)), verify)
            .await
    }

    /// Downloads the object into a file at `path`, creating or truncating it.
    pub async fn save_to_path(&self, path: impl AsRef<Path>) -> Result<u64> {
        let mut file = tokio::fs::File::create(path.as_ref()).await?;
        self.stream(&mut file, &[]).await
    }

    #[inline]
    fn connection(&self) -> &Connection {
        self.container.connection()
    }

    fn not_found(&self) -> Error {
        Error::NotFound(format!("Object '{}/{}'", self.container.name(), self.name))
    }

    async fn url(&self) -> Result<Url> {
        self.connection()
            .endpoints()
            .await
            .storage_path(Some(self.container.name()), Some(&self.name))
    }

    fn resolve_content_type(&self) -> Result<String> {
        if let Some(content_type) = self.content_type.as_deref().filter(|c| !c.is_empty()) {
            return Ok(content_type.to_owned());
        }

        guess_content_type(&self.name)
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::ContentType(format!(
                    "Cannot determine the content type of '{}'",
                    self.name
                ))
            })
    }

    async fn fetch(&self, sink: &mut Sink<'_>, headers: &[(&str, &str)]) -> Result<ResponseFields> {
        let request = Request::new(RequestShape::Read, self.url().await?)
            .with_headers(headers.iter().copied());
        let fields = self.connection().send(request, sink).await?;

        match fields.status {
            200..=299 | 304 | 412 => Ok(fields),
            404 => Err(self.not_found()),
            _ => Err(unexpected(&fields)),
        }
    }

    async fn put(&self, headers: Vec<(String, String)>, body: UploadBody) -> Result<ResponseFields> {
        let request = Request::new(RequestShape::WriteStreamed, self.url().await?)
            .with_headers(headers)
            .with_body(body);
        let fields = self.connection().send(request, &mut Sink::discard()).await?;

        match fields.status {
            201 => Ok(fields),
            412 => Err(Error::ContentType(format!(
                "Content type of '{}' was rejected",
                self.name
            ))),
            422 => Err(Error::ChecksumMismatch(format!(
                "Uploaded content of '{}' does not match its ETag",
                self.name
            ))),
            _ => Err(unexpected(&fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use cloudfiles_core::{Credentials, MAX_OBJECT_SIZE};

    use super::*;
    use crate::client::{Authentication, ReauthPolicy};
    use crate::mock::{MockTransport, auth_ok};

    async fn object(transport: &Arc<MockTransport>, name: &str) -> Object {
        let connection = Connection::new(transport.clone()).await.unwrap();
        Container::new(connection, "photos".into(), 0, 0)
            .create_object(name)
            .unwrap()
    }

    fn created(etag: &str) -> ResponseFields {
        let mut fields = ResponseFields::with_status(201, "Created");
        fields.etag = Some(etag.into());
        fields
    }

    #[tokio::test]
    async fn test_verified_write_sends_local_md5() {
        let transport = Arc::new(MockTransport::authenticated());
        let hash = "0f343b0931126a20f133d67c2b018a3b";
        transport.push_fields(created(hash));

        let mut object = object(&transport, "pic.jpg").await;
        object.metadata_mut().insert("Author", "EJ");
        object.write(vec![0u8; 1024], true).await.unwrap();

        let last = transport.last();
        assert_eq!(last.method, Method::Put);
        assert_eq!(last.url.as_str(), "https://storage.example/v1/acct/photos/pic.jpg");
        assert_eq!(last.header("ETag"), Some(hash));
        assert_eq!(last.header("Content-Type"), Some("image/jpeg"));
        assert_eq!(last.header("X-Object-Meta-Author"), Some("EJ"));
        assert_eq!(last.body.as_ref().map(Vec::len), Some(1024));

        assert_eq!(object.etag(), Some(hash));
        assert_eq!(object.content_length(), 1024);
    }

    #[tokio::test]
    async fn test_unverified_write_takes_response_etag() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push_fields(created("feedface"));

        let mut object = object(&transport, "notes.txt").await;
        object.write("hello", false).await.unwrap();

        assert!(transport.last().header("ETag").is_none());
        assert_eq!(object.etag(), Some("feedface"));
        assert_eq!(object.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_write_status_mapping() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(422).push(412).push(500);

        let mut object = object(&transport, "pic.jpg").await;
        assert!(object.write("x", true).await.unwrap_err().is_checksum_mismatch());
        assert!(object.write("x", true).await.unwrap_err().is_content_type());
        assert_eq!(object.write("x", true).await.unwrap_err().status(), Some(500));
    }

    #[tokio::test]
    async fn test_write_needs_content_type() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(201);

        let mut object = object(&transport, "README").await;
        assert!(object.write("x", false).await.unwrap_err().is_content_type());
        assert!(transport.requests().is_empty());

        object.set_content_type("text/plain");
        object.write("x", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_object_size_boundary() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(201);

        let mut object = object(&transport, "big.bin").await;
        object.set_content_type("application/octet-stream");

        let over = ObjectData::from_reader(Cursor::new(Vec::new()), Some(MAX_OBJECT_SIZE + 1));
        assert!(object.write(over, false).await.unwrap_err().is_syntax());
        assert!(transport.requests().is_empty());

        let at_limit = ObjectData::from_reader(Cursor::new(Vec::new()), Some(MAX_OBJECT_SIZE));
        object.write(at_limit, false).await.unwrap();
        assert_eq!(object.content_length(), MAX_OBJECT_SIZE);
    }

    #[tokio::test]
    async fn test_set_etag_overrides_hash_once() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(201).push(201);

        let mut object = object(&transport, "pic.jpg").await;
        object.set_etag("abc");
        object.write("data", true).await.unwrap();
        assert_eq!(transport.last().header("ETag"), Some("abc"));

        object.write("data", true).await.unwrap();
        assert_eq!(
            transport.last().header("ETag"),
            Some("8d777f385d3dfec8815d20f7496026dc")
        );
    }

    #[tokio::test]
    async fn test_reader_upload_with_unknown_length() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(201);

        let content = vec![9u8; 70_000];
        let mut object = object(&transport, "blob.zip").await;
        object
            .write(ObjectData::from_reader(Cursor::new(content.clone()), None), true)
            .await
            .unwrap();

        let last = transport.last();
        assert_eq!(last.body.as_deref(), Some(content.as_slice()));
        assert_eq!(
            last.header("ETag"),
            Some(format!("{:x}", md5::compute(&content)).as_str())
        );
    }

    #[tokio::test]
    async fn test_write_replays_bytes_after_reauth() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(401).push(201);
        transport.push_auth(auth_ok("fresh"));

        let policy = ReauthPolicy::once(Authentication::new(Credentials::new("u", "k")));
        let connection = Connection::with_policy(transport.clone(), policy)
            .await
            .unwrap();
        let mut object = Container::new(connection, "photos".into(), 0, 0)
            .create_object("pic.jpg")
            .unwrap();

        object.write(vec![1u8; 10], true).await.unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body.as_ref().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn test_read_statuses() {
        let transport = Arc::new(MockTransport::authenticated());
        transport
            .push_body(ResponseFields::with_status(200, "OK"), "content")
            .push(304)
            .push(404);

        let object = object(&transport, "pic.jpg").await;
        assert_eq!(object.read(&[]).await.unwrap(), "content");

        let empty = object.read(&[("If-None-Match", "abc")]).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(transport.last().header("If-None-Match"), Some("abc"));

        assert!(object.read(&[]).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stream_into_writer() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push_body(ResponseFields::with_status(200, "OK"), "streamed body");

        let object = object(&transport, "pic.jpg").await;
        let mut out = Vec::new();
        let written = object.stream(&mut out, &[]).await.unwrap();

        assert_eq!(written, 13);
        assert_eq!(out, b"streamed body");
    }

    #[tokio::test]
    async fn test_refresh() {
        let transport = Arc::new(MockTransport::authenticated());
        let mut fields = ResponseFields::with_status(200, "OK");
        fields.etag = Some("abc".into());
        fields.content_type = Some("image/jpeg".into());
        fields.content_length = Some(42);
        fields.metadata = Metadata::new().with("author", "EJ");
        transport.push_fields(fields).push(404);

        let mut object = object(&transport, "pic.jpg").await;
        object.refresh().await.unwrap();
        assert_eq!(object.etag(), Some("abc"));
        assert_eq!(object.content_length(), 42);
        assert_eq!(object.metadata().get("author").map(String::as_str), Some("EJ"));
        assert_eq!(transport.last().method, Method::Head);

        object.metadata_mut().insert("Author", "EJ2");
        assert_eq!(object.metadata().len(), 1);
        assert_eq!(object.metadata().get("author").map(String::as_str), Some("EJ2"));

        assert!(object.refresh().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sync_metadata() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(202).push(404);

        let mut object = object(&transport, "pic.jpg").await;
        assert!(!object.sync_metadata().await.unwrap());
        assert!(transport.requests().is_empty());

        object.metadata_mut().insert("Year", "2024");
        assert!(object.sync_metadata().await.unwrap());
        let last = transport.last();
        assert_eq!(last.method, Method::Post);
        assert_eq!(last.header("X-Object-Meta-Year"), Some("2024"));

        assert!(object.sync_metadata().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_public_uri() {
        let transport = Arc::new(MockTransport::authenticated());
        let mut published = ResponseFields::with_status(201, "Created");
        published.cdn_uri = Some("https://c1.cdn.example".into());
        transport.push_fields(published);

        let connection = Connection::new(transport.clone()).await.unwrap();
        let mut container = Container::new(connection, "photos".into(), 0, 0);
        assert!(container.create_object("a b.jpg").unwrap().public_uri().is_none());

        container.make_public(None).await.unwrap();
        let uri = container
            .create_object("2024/a b.jpg")
            .unwrap()
            .public_uri()
            .unwrap();
        assert_eq!(uri.as_str(), "https://c1.cdn.example/2024/a%20b.jpg");
    }

    #[tokio::test]
    async fn test_file_helpers() {
        let transport = Arc::new(MockTransport::authenticated());
        transport
            .push(201)
            .push_body(ResponseFields::with_status(200, "OK"), "from service");

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("upload.txt");
        tokio::fs::write(&source, b"file content").await.unwrap();

        let mut object = object(&transport, "upload.txt").await;
        object.load_from_path(&source, true).await.unwrap();
        assert_eq!(transport.last().body.as_deref(), Some(&b"file content"[..]));
        assert_eq!(object.content_length(), 12);

        let target = dir.path().join("download.txt");
        assert_eq!(object.save_to_path(&target).await.unwrap(), 12);
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"from service");
    }

    #[tokio::test]
    async fn test_compute_md5() {
        let mut data = ObjectData::from("data");
        assert_eq!(
            Object::compute_md5(&mut data).await.unwrap(),
            "8d777f385d3dfec8815d20f7496026dc"
        );
    }
}
