//! Process-wide Font Cache
//!
//! Memoizes style → face handle and family → traits lookups so repeated
//! layout requests do not re-query the system matcher. Shared across layout
//! threads; the matcher is never queried while a cache lock is held.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::FontConfig;
use crate::face::{FaceTraits, PlatformFaceHandle};
use crate::matcher::FontBackend;
use crate::resolver::FallbackResolver;
use crate::style::{FallbackCacheKey, StyleDescriptor};
use crate::{FontError, Result};

/// Font cache in front of a [`FallbackResolver`]
///
/// Entries are never evicted on their own; each distinct family list,
/// weight bucket, style and 1/64 px size keeps one. Callers are expected to
/// call [`FontCache::invalidate_all`] when the installed font set changes
/// or memory pressure asks for it.
pub struct FontCache<B> {
    resolver: FallbackResolver<B>,
    faces: RwLock<HashMap<FallbackCacheKey, PlatformFaceHandle>>,
    families: RwLock<HashMap<String, Arc<BTreeSet<FaceTraits>>>>,
    /// Bumped by `invalidate_all`; results resolved under an older
    /// generation are returned but not stored.
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<B: FontBackend> FontCache<B> {
    pub fn new(backend: B, config: FontConfig) -> Self {
        Self::with_resolver(FallbackResolver::new(backend, config))
    }

    pub fn with_resolver(resolver: FallbackResolver<B>) -> Self {
        Self {
            resolver,
            faces: RwLock::new(HashMap::new()),
            families: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn resolver(&self) -> &FallbackResolver<B> {
        &self.resolver
    }

    /// Look up a face for `descriptor`, resolving and caching it on a miss.
    ///
    /// Failures are returned unchanged and never cached. When two threads
    /// miss on the same key, the first to insert wins and the other adopts
    /// its handle.
    pub fn get_or_resolve(&self, descriptor: &StyleDescriptor) -> Result<PlatformFaceHandle> {
        let key = descriptor.cache_key();
        let generation = self.generation.load(Ordering::Acquire);

        if let Some(handle) = self.faces.read().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Font cache hit: {:?} -> {}", key, handle.face_id());
            return Ok(handle);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Font cache miss for {:?}", key);

        let resolved = self.resolver.resolve_by_style(descriptor)?;

        let mut faces = self.faces.write();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("Font cache invalidated during resolve, not storing {}", resolved.face_id());
            return Ok(resolved);
        }
        let handle = match faces.entry(key) {
            Entry::Occupied(entry) => {
                debug!("Lost font cache insert race, dropping {}", resolved.face_id());
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry.insert(resolved).clone(),
        };
        Ok(handle)
    }

    /// Find a face covering `characters`. Coverage results are cached by the resolver.
    pub fn resolve_by_character_coverage<I>(&self, characters: I, from_font: &StyleDescriptor) -> Result<PlatformFaceHandle>
    where
        I: IntoIterator<Item = char>,
    {
        self.resolver.resolve_by_character_coverage(characters, from_font)
    }

    /// Resolve through the cache against the last-resort families,
    /// keeping the descriptor's weight, style and size.
    pub fn resolve_last_resort(&self, descriptor: &StyleDescriptor) -> Result<PlatformFaceHandle> {
        for family in self.resolver.config().last_resort_families() {
            match self.get_or_resolve(&descriptor.with_families([family])) {
                Ok(handle) => return Ok(handle),
                Err(FontError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(self.resolver.fatal_configuration())
    }

    /// Installed variants of `family`. `Unsupported` passes through uncached.
    pub fn traits_available(&self, family: &str) -> Result<Arc<BTreeSet<FaceTraits>>> {
        let key = family.trim().to_lowercase();
        let generation = self.generation.load(Ordering::Acquire);
        if let Some(traits) = self.families.read().get(&key).cloned() {
            return Ok(traits);
        }

        let traits = Arc::new(self.resolver.traits_available(family)?);
        let mut families = self.families.write();
        if self.generation.load(Ordering::Acquire) != generation {
            return Ok(traits);
        }
        Ok(families.entry(key).or_insert(traits).clone())
    }

    /// Drop every cache entry, e.g. after the installed font set changed.
    ///
    /// Handles already handed out remain valid.
    pub fn invalidate_all(&self) {
        let dropped = {
            let mut faces = self.faces.write();
            let mut families = self.families.write();
            self.generation.fetch_add(1, Ordering::AcqRel);
            let count = faces.len();
            faces.clear();
            families.clear();
            count
        };
        self.resolver.clear_coverage_cache();
        debug!("Font cache invalidated ({} entries dropped)", dropped);
    }

    /// Number of cached style entries
    pub fn len(&self) -> usize {
        self.faces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.read().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> FontCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        FontCacheStats {
            size: self.len(),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct FontCacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
