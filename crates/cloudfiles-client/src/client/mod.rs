//! Authentication, configuration and the account-level connection.
//!
//! A [`Connection`] wraps an authenticated [`Transport`](cloudfiles_core::Transport)
//! and hands out [`Container`](crate::Container) handles. [`Authentication`]
//! runs the token exchange and installs the result on the transport, and
//! [`ReauthPolicy`] decides whether an expired token is refreshed.

mod authentication;
mod client_config;
mod connection;
mod reauth;

pub use authentication::Authentication;
pub use client_config::{ClientConfig, SERVICENET_ENV};
pub use connection::Connection;
pub use reauth::ReauthPolicy;
