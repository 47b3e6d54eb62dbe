//! Admin services.
//!
//! - [`media`] - crop and JPEG-encode uploaded images
//! - [`uploads`] - simulated progress for in-flight uploads
//! - [`session_watcher`] - sign-out events from the auth service

pub mod media;
pub mod session_watcher;
pub mod uploads;

pub use media::{CroppedImage, MediaError, crop_to_jpeg};
pub use session_watcher::SessionWatcher;
pub use uploads::UploadTracker;
