//! Session-scoped managers: auth, mutations, and the list store.

pub mod auth_gateway;
pub mod list_store;
pub mod mutations;
