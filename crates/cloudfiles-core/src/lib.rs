#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for credential and authentication handling.
pub const TRACING_TARGET_CREDENTIALS: &str = "cloudfiles_core::credentials";

/// Tracing target for header decoding.
pub const TRACING_TARGET_HEADERS: &str = "cloudfiles_core::headers";

mod credentials;
mod endpoint;
mod error;
mod limits;
mod metadata;
mod progress;
mod request;
mod sink;
mod transport;

pub mod headers;

pub use credentials::{AuthRequest, AuthSession, Credentials, DEFAULT_API_VERSION, DEFAULT_AUTH_HOST};
pub use endpoint::{Endpoints, join_path};
pub use error::{BoxedError, Error, Result};
pub use headers::ResponseFields;
pub use limits::{
    MAX_CONTAINER_NAME_LEN, MAX_META_KEY_LEN, MAX_META_VALUE_LEN, MAX_OBJECT_NAME_LEN,
    MAX_OBJECT_SIZE, validate_container_name, validate_object_name, validate_object_size,
};
pub use metadata::Metadata;
pub use progress::{ProgressFn, ProgressHooks};
pub use request::{Method, Request, RequestShape, UploadBody, UploadSource};
pub use sink::{Sink, split_lines};
pub use transport::Transport;
