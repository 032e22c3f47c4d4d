//! Account, container and object operations.
//!
//! Account operations are implemented directly on
//! [`Connection`](crate::Connection); containers and objects are handles that
//! keep a clone of the connection they came from.
//!
//! Every operation validates its arguments before any network call, sends a
//! single request and maps the response status against its own table: 401
//! always becomes an authentication error, and statuses outside the table
//! become `InvalidResponse`.

mod account_operations;
mod container;
mod object;
mod status;

pub use container::Container;
pub use object::Object;
