//! fOS Font - Platform Font Resolution
//!
//! This crate turns style requests from the text-layout pipeline into
//! concrete installed faces:
//! - Style descriptors and normalized cache keys
//! - Fallback resolution (family list, generic family, character coverage,
//!   last-resort family)
//! - Synthetic bold/italic derivation
//! - A process-wide, thread-safe font cache
//! - A system matcher backed by fontdb

pub mod cache;
pub mod charset;
pub mod config;
pub mod face;
pub mod matcher;
pub mod resolver;
pub mod style;
pub mod system;

pub use cache::{FontCache, FontCacheStats};
pub use charset::CharSet;
pub use config::FontConfig;
pub use face::{FaceId, FaceResource, FaceTraits, PlatformFaceHandle};
pub use matcher::{FaceLoader, FontBackend, LoadError, MatchRequest, MatchedFace, PlatformPolicy, SystemMatcher};
pub use resolver::FallbackResolver;
pub use style::{FallbackCacheKey, FontWeight, GenericFamily, Script, StyleDescriptor, StyleDescriptorBuilder};
pub use system::SystemFonts;

/// Font resolution error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FontError {
    /// No installed face satisfies the request. Callers fall back.
    #[error("No face found for {0}")]
    NotFound(String),

    /// A platform policy hook has no implementation here.
    #[error("Not supported on this platform: {0}")]
    Unsupported(&'static str),

    /// Even the last-resort families are missing.
    #[error("No last-resort font available (tried {tried:?})")]
    FatalConfiguration { tried: Vec<String> },

    #[error("Invalid style descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid font configuration: {0}")]
    Config(String),
}

impl FontError {
    /// Whether layout can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FontError::NotFound(_) | FontError::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, FontError>;
