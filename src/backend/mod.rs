//! Hosted-platform client layer.
//!
//! Everything the crate delegates to the managed service — auth, row
//! storage, realtime change feed — goes through the [`BackendApi`] trait,
//! with an HTTP implementation for production and an in-process SQLite
//! stand-in for tests and the demo binary.

pub mod api;
#[cfg(feature = "network")]
pub mod http;
pub mod local;
pub mod realtime;

pub use api::{BackendApi, SharedBackend};
pub use realtime::{CancelToken, ChangeEvent, Subscription};
