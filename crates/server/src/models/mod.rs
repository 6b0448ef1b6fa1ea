//! Session models.

pub mod session;

pub use session::{CurrentUser, DEMO_TOKEN, DEMO_USER_ID, keys as session_keys};
