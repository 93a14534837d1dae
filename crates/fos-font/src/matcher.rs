//! Interfaces to the platform font collaborators
//!
//! The resolver never talks to a font library directly. It asks a
//! [`SystemMatcher`] for the best installed face, a [`FaceLoader`] to turn
//! that face into a [`FaceResource`], and a [`PlatformPolicy`] for the
//! optional aliasing hooks.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::charset::CharSet;
use crate::face::{FaceId, FaceResource, FaceTraits};
use crate::style::{FontWeight, Script, StyleDescriptor};
use crate::{FontError, Result};

/// Constraints for a single best-match query.
///
/// Weight and italic are preferences; the matcher may substitute.
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    /// Family name or generic keyword, `None` for the system default
    pub family: Option<&'a str>,
    pub weight: FontWeight,
    pub italic: bool,
    /// Code points the face should cover. Matchers rank by closeness and
    /// may return a face that covers only part of the set.
    pub charset: Option<&'a CharSet>,
}

/// The matcher's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFace {
    pub face_id: FaceId,
    pub family: String,
    /// Traits the face reports for itself
    pub bold: bool,
    pub italic: bool,
}

/// System font-matching engine
pub trait SystemMatcher: Send + Sync {
    fn best_match(&self, request: &MatchRequest<'_>) -> Option<MatchedFace>;
}

/// Rasterization collaborator that constructs face resources.
pub trait FaceLoader: Send + Sync {
    fn load_face(&self, face: &MatchedFace) -> std::result::Result<Arc<FaceResource>, LoadError>;
}

/// Platform-specific policy hooks.
///
/// Every hook defaults to [`FontError::Unsupported`], which callers treat as
/// "no extra information".
pub trait PlatformPolicy: Send + Sync {
    /// Alias for a family name, `Ok(None)` when the platform knows of none.
    fn alternate_family_name(&self, _family: &str) -> Result<Option<String>> {
        Err(FontError::Unsupported("alternate family names"))
    }

    /// Preferred family for a script.
    fn script_family(&self, _script: Script, _descriptor: &StyleDescriptor) -> Result<Option<String>> {
        Err(FontError::Unsupported("script-specific families"))
    }

    /// Weight/italic variants installed for a family.
    fn traits_in_family(&self, _family: &str) -> Result<BTreeSet<FaceTraits>> {
        Err(FontError::Unsupported("family traits enumeration"))
    }
}

/// Everything the resolver needs from the platform.
pub trait FontBackend: SystemMatcher + FaceLoader + PlatformPolicy {}

impl<T: SystemMatcher + FaceLoader + PlatformPolicy> FontBackend for T {}

/// Face construction failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Unknown face: {0}")]
    UnknownFace(FaceId),

    #[error("Failed to parse font: {0}")]
    Parse(String),
}
