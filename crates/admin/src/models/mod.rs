//! Types the admin keeps between requests.

pub mod session;

pub use session::{CurrentAdmin, Flash, keys as session_keys};
