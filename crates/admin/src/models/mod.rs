//! Types stored in the admin session.

pub mod session;

pub use session::{AdminSession, keys};
