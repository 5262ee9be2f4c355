use serde::{Deserialize, Serialize};

/// Opaque identity handle for the signed-in user.
///
/// Owned by the auth gateway for the session lifetime; this crate only ever
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}
