//! Image upload & caption viewer.
//!
//! A single form component: pick an image, POST it to a captioning
//! endpoint, show the returned caption and detected colors. The component
//! is a pure state machine ([`ViewerState`]) driven by a caption client
//! ([`CaptionService`]) and rendered by [`render`]. The [`web`] module hosts
//! it for a browser.

pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod preview;
pub mod render;
pub mod state;
pub mod web;

pub use client::{CaptionService, HttpCaptionClient};
pub use config::{ConfigError, ViewerConfig};
pub use error::ViewerError;
pub use file::SelectedFile;
pub use preview::{PreviewHandle, PreviewStore};
pub use state::{CaptionResult, UploadRequest, ViewerState};
