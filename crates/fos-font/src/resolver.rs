//! Fallback resolution
//!
//! Turns a [`StyleDescriptor`] or a run of characters into exactly one
//! [`PlatformFaceHandle`], or a definitive error:
//!
//! 1. Requested families, in order (plus any platform alias of each).
//! 2. Otherwise the generic family's platform name, or the system default.
//! 3. For uncovered characters, a character-set coverage search.
//! 4. The configured last-resort families, only when asked explicitly.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::charset::CharSet;
use crate::config::FontConfig;
use crate::face::{FaceTraits, PlatformFaceHandle};
use crate::matcher::{FontBackend, MatchRequest, MatchedFace};
use crate::style::{Script, StyleDescriptor};
use crate::{FontError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CoverageKey {
    charset: CharSet,
    weight_bucket: u8,
    italic: bool,
}

/// Coverage matches keyed by the full character set
#[derive(Debug, Default)]
struct CoverageCache {
    entries: HashMap<CoverageKey, MatchedFace>,
    capacity: usize,
    /// Bumped on every clear
    generation: u64,
}

impl CoverageCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            generation: 0,
        }
    }

    fn get(&self, key: &CoverageKey) -> Option<MatchedFace> {
        self.entries.get(key).cloned()
    }

    /// Store `face` unless the cache was cleared since `generation` was read.
    fn insert(&mut self, generation: u64, key: CoverageKey, face: MatchedFace) {
        if self.capacity == 0 || generation != self.generation {
            return;
        }
        // Evict half when full
        if self.entries.len() >= self.capacity {
            let target = self.capacity / 2;
            let excess: Vec<_> = self
                .entries
                .keys()
                .take(self.entries.len() - target)
                .cloned()
                .collect();
            for key in excess {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(key, face);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}

/// Drives the platform backend through the fallback policy
pub struct FallbackResolver<B> {
    backend: B,
    config: FontConfig,
    coverage: Mutex<CoverageCache>,
}

impl<B: FontBackend> FallbackResolver<B> {
    pub fn new(backend: B, config: FontConfig) -> Self {
        let coverage = Mutex::new(CoverageCache::new(config.coverage_cache_capacity));
        Self {
            backend,
            config,
            coverage,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    /// Resolve a style request without consulting any cache.
    pub fn resolve_by_style(&self, descriptor: &StyleDescriptor) -> Result<PlatformFaceHandle> {
        if !descriptor.families().is_empty() {
            for family in descriptor.families() {
                if let Some(handle) = self.resolve_named(family, descriptor) {
                    return Ok(handle);
                }
            }
            return Err(FontError::NotFound(format!(
                "families {:?}",
                descriptor.families()
            )));
        }

        let hint = descriptor.generic_family().platform_name();
        self.resolve_family(hint, descriptor).ok_or_else(|| {
            FontError::NotFound(format!("generic family {:?}", descriptor.generic_family()))
        })
    }

    /// Find a face covering `characters`, sized and styled like `from_font`.
    ///
    /// Finding nothing is a normal outcome: many character sets have no
    /// installed covering face.
    pub fn resolve_by_character_coverage<I>(&self, characters: I, from_font: &StyleDescriptor) -> Result<PlatformFaceHandle>
    where
        I: IntoIterator<Item = char>,
    {
        let charset: CharSet = characters.into_iter().collect();
        if charset.is_empty() {
            return Err(FontError::NotFound("empty character run".to_string()));
        }

        let key = CoverageKey {
            charset,
            weight_bucket: from_font.weight().bucket(),
            italic: from_font.italic(),
        };
        let charset = &key.charset;

        let (cached, generation) = {
            let coverage = self.coverage.lock();
            (coverage.get(&key), coverage.generation)
        };
        let matched = match cached {
            Some(face) => {
                trace!("Coverage cache hit for charset {:016x} -> {:?}", charset.signature(), face.family);
                face
            }
            None => {
                let request = MatchRequest {
                    family: None,
                    weight: from_font.weight().normalized(),
                    italic: from_font.italic(),
                    charset: Some(charset),
                };
                let Some(face) = self.backend.best_match(&request) else {
                    debug!("No installed face covers {} chars", charset.len());
                    return Err(FontError::NotFound(format!(
                        "coverage for {} characters",
                        charset.len()
                    )));
                };
                self.coverage.lock().insert(generation, key.clone(), face.clone());
                face
            }
        };

        self.wrap(&matched, from_font).ok_or_else(|| {
            FontError::NotFound(format!("coverage face {:?} failed to load", matched.family))
        })
    }

    /// Resolve against the configured last-resort families.
    ///
    /// Failure means the installation has no usable font at all.
    pub fn resolve_last_resort(&self, descriptor: &StyleDescriptor) -> Result<PlatformFaceHandle> {
        for family in self.config.last_resort_families() {
            if let Some(handle) = self.resolve_named(family, descriptor) {
                return Ok(handle);
            }
        }
        Err(self.fatal_configuration())
    }

    pub(crate) fn fatal_configuration(&self) -> FontError {
        let tried: Vec<String> = self
            .config
            .last_resort_families()
            .map(str::to_string)
            .collect();
        error!("No last-resort font is installed (tried {:?})", tried);
        FontError::FatalConfiguration { tried }
    }

    /// Platform alias for a family name.
    pub fn alternate_family_name(&self, family: &str) -> Result<Option<String>> {
        self.backend.alternate_family_name(family)
    }

    /// Family to use for `script`. Configured substitutions win over the platform.
    pub fn script_specific_family(&self, script: Script, descriptor: &StyleDescriptor) -> Result<Option<String>> {
        if let Some(family) = self.config.script_families.get(&script) {
            return Ok(Some(family.clone()));
        }
        self.backend.script_family(script, descriptor)
    }

    /// Weight/italic variants installed for `family`.
    pub fn traits_available(&self, family: &str) -> Result<BTreeSet<FaceTraits>> {
        self.backend.traits_in_family(family)
    }

    /// Forget remembered coverage matches.
    pub fn clear_coverage_cache(&self) {
        self.coverage.lock().clear();
    }

    /// A named family, then its platform alias.
    fn resolve_named(&self, family: &str, descriptor: &StyleDescriptor) -> Option<PlatformFaceHandle> {
        if let Some(handle) = self.resolve_family(Some(family), descriptor) {
            return Some(handle);
        }
        let Ok(Some(alternate)) = self.backend.alternate_family_name(family) else {
            return None;
        };
        debug!("Trying alternate family {:?} for {:?}", alternate, family);
        self.resolve_family(Some(alternate.as_str()), descriptor)
    }

    fn resolve_family(&self, family: Option<&str>, descriptor: &StyleDescriptor) -> Option<PlatformFaceHandle> {
        let request = MatchRequest {
            family,
            weight: descriptor.weight().normalized(),
            italic: descriptor.italic(),
            charset: None,
        };
        let matched = self.backend.best_match(&request)?;
        debug!("Matched {:?} for family hint {:?}", matched.family, family);
        self.wrap(&matched, descriptor)
    }

    fn wrap(&self, matched: &MatchedFace, descriptor: &StyleDescriptor) -> Option<PlatformFaceHandle> {
        match self.backend.load_face(matched) {
            Ok(face) => Some(PlatformFaceHandle::new(
                face,
                descriptor.size_px(),
                descriptor.weight(),
                descriptor.italic(),
            )),
            Err(e) => {
                warn!("Failed to load {:?} ({}): {}", matched.family, matched.face_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::face::{FaceId, FaceResource};
    use crate::matcher::{FaceLoader, LoadError, PlatformPolicy, SystemMatcher};
    use crate::style::GenericFamily;

    /// Answers every family query with one face, counting queries.
    struct OneFace {
        broken: bool,
        queries: AtomicUsize,
    }

    impl OneFace {
        fn new(broken: bool) -> Self {
            Self {
                broken,
                queries: AtomicUsize::new(0),
            }
        }
    }

    impl SystemMatcher for OneFace {
        fn best_match(&self, request: &MatchRequest<'_>) -> Option<MatchedFace> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if let Some(charset) = request.charset {
                if charset.iter().any(|c| !c.is_ascii()) {
                    return None;
                }
            }
            Some(MatchedFace {
                face_id: FaceId::new(1),
                family: "Only".to_string(),
                bold: false,
                italic: false,
            })
        }
    }

    impl FaceLoader for OneFace {
        fn load_face(&self, face: &MatchedFace) -> std::result::Result<Arc<FaceResource>, LoadError> {
            if self.broken {
                return Err(LoadError::Parse("truncated".to_string()));
            }
            Ok(Arc::new(FaceResource::new(face.face_id, face.family.clone(), face.bold, face.italic, Arc::from(Vec::new()), 0)))
        }
    }

    impl PlatformPolicy for OneFace {}

    fn descriptor() -> StyleDescriptor {
        StyleDescriptor::builder().generic(GenericFamily::Serif).build().unwrap()
    }

    #[test]
    fn test_load_failure_is_not_found() {
        let resolver = FallbackResolver::new(OneFace::new(true), FontConfig::default());
        let err = resolver.resolve_by_style(&descriptor()).unwrap_err();
        assert!(matches!(err, FontError::NotFound(_)));
    }

    #[test]
    fn test_coverage_matches_are_remembered() {
        let resolver = FallbackResolver::new(OneFace::new(false), FontConfig::default());
        let d = descriptor();
        resolver.resolve_by_character_coverage("abc".chars(), &d).unwrap();
        resolver.resolve_by_character_coverage("cba".chars(), &d).unwrap();
        assert_eq!(resolver.backend().queries.load(Ordering::SeqCst), 1);

        resolver.clear_coverage_cache();
        resolver.resolve_by_character_coverage("abc".chars(), &d).unwrap();
        assert_eq!(resolver.backend().queries.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_coverage_misses_are_not_remembered() {
        let resolver = FallbackResolver::new(OneFace::new(false), FontConfig::default());
        let d = descriptor();
        assert!(resolver.resolve_by_character_coverage("漢".chars(), &d).is_err());
        assert!(resolver.resolve_by_character_coverage("漢".chars(), &d).is_err());
        assert_eq!(resolver.backend().queries.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_coverage_cache_disabled() {
        let config = FontConfig::default().with_coverage_cache_capacity(0);
        let resolver = FallbackResolver::new(OneFace::new(false), config);
        let d = descriptor();
        resolver.resolve_by_character_coverage("abc".chars(), &d).unwrap();
        resolver.resolve_by_character_coverage("abc".chars(), &d).unwrap();
        assert_eq!(resolver.backend().queries.load(Ordering::SeqCst), 2);
    }

    fn coverage_key(text: &str) -> CoverageKey {
        CoverageKey {
            charset: text.chars().collect(),
            weight_bucket: 4,
            italic: false,
        }
    }

    fn only(n: u64) -> MatchedFace {
        MatchedFace {
            face_id: FaceId::new(n),
            family: "Only".to_string(),
            bold: false,
            italic: false,
        }
    }

    #[test]
    fn test_coverage_cache_evicts_half() {
        let mut cache = CoverageCache::new(4);
        for (n, text) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.insert(0, coverage_key(text), only(n as u64));
        }
        assert_eq!(cache.entries.len(), 4);

        cache.insert(0, coverage_key("z"), only(99));
        assert_eq!(cache.entries.len(), 3);
        assert_eq!(cache.get(&coverage_key("z")).map(|f| f.face_id), Some(FaceId::new(99)));
    }

    #[test]
    fn test_coverage_insert_after_clear_is_dropped() {
        let mut cache = CoverageCache::new(4);
        let generation = cache.generation;
        cache.clear();
        cache.insert(generation, coverage_key("abc"), only(1));
        assert!(cache.get(&coverage_key("abc")).is_none());

        cache.insert(cache.generation, coverage_key("abc"), only(1));
        assert!(cache.get(&coverage_key("abc")).is_some());
    }

    #[test]
    fn test_coverage_keys_compare_whole_charset() {
        let mut cache = CoverageCache::new(4);
        cache.insert(0, coverage_key("abc"), only(1));
        assert!(cache.get(&coverage_key("cab")).is_some());
        assert!(cache.get(&coverage_key("abd")).is_none());
        assert!(cache.get(&coverage_key("ab")).is_none());
    }

    #[test]
    fn test_script_family_prefers_config() {
        let config = FontConfig::default().with_script_family(Script::Han, "Noto Sans CJK SC");
        let resolver = FallbackResolver::new(OneFace::new(false), config);
        let d = descriptor();
        assert_eq!(
            resolver.script_specific_family(Script::Han, &d).unwrap().as_deref(),
            Some("Noto Sans CJK SC")
        );
        assert!(matches!(
            resolver.script_specific_family(Script::Thai, &d),
            Err(FontError::Unsupported(_))
        ));
    }
}
