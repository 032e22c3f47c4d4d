#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_CLIENT: &str = "cloudfiles_client::client";
pub const TRACING_TARGET_ACCOUNT: &str = "cloudfiles_client::account";
pub const TRACING_TARGET_CONTAINERS: &str = "cloudfiles_client::containers";
pub const TRACING_TARGET_OBJECTS: &str = "cloudfiles_client::objects";
pub const TRACING_TARGET_CDN: &str = "cloudfiles_client::cdn";

pub mod client;
pub mod operations;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use cloudfiles_core::{
    AuthSession, Credentials, Error, MAX_CONTAINER_NAME_LEN, MAX_OBJECT_NAME_LEN,
    MAX_OBJECT_SIZE, Metadata, ProgressFn, Result, Transport,
};
pub use cloudfiles_reqwest::{HttpSession, ReqwestConfig};

// Re-export for convenience
pub use crate::client::{Authentication, ClientConfig, Connection, ReauthPolicy};
pub use crate::operations::{Container, Object};
pub use crate::types::{
    AccountInfo, CdnInfo, ContainerInfo, DEFAULT_CDN_TTL, ListParams, ObjectData, ObjectInfo,
    ObjectListParams, guess_content_type,
};
