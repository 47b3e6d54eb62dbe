//! Services used by the gallery route handlers.

pub mod catalog;

pub use catalog::Catalog;
