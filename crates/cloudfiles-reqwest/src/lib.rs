#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for request execution.
pub const TRACING_TARGET_SESSION: &str = "cloudfiles_reqwest::session";

/// Tracing target for the connection pool.
pub const TRACING_TARGET_POOL: &str = "cloudfiles_reqwest::pool";

mod body;
mod config;
mod error;
mod pool;
mod response;
mod session;

pub use cloudfiles_core::{Error, Result};
pub use config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, ReqwestConfig};
pub use response::decode_response;
pub use session::HttpSession;
