//! Mentor Image crate - illustration lookup for assistant replies.
//!
//! Image search is best effort: every failure is logged, remembered as the
//! last error, and turned into `None` so it never blocks a reply.

pub mod wikimedia;

use async_trait::async_trait;
use thiserror::Error;

use mentor_core::config::ImageConfig;

pub use wikimedia::WikimediaClient;

/// Minimum acceptable image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl From<&ImageConfig> for ImageSize {
    fn from(config: &ImageConfig) -> Self {
        Self {
            width: config.min_width,
            height: config.min_height,
        }
    }
}

/// Reasons a lookup came back empty.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("query is empty")]
    EmptyQuery,
    #[error("No images found for query: \"{0}\". Try a different search term.")]
    NoResults(String),
    #[error("No suitable images found matching the size requirements ({width}x{height})")]
    NoSuitableImage { width: u32, height: u32 },
}

/// Best-effort image search.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    /// URL of the first ranked image at least `preferred` in size, or `None`.
    async fn fetch_image(&self, query: &str, preferred: ImageSize) -> Option<String>;

    /// Message of the most recent failed lookup, cleared when a lookup starts.
    fn last_error(&self) -> Option<String>;
}
