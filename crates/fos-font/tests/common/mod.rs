//! Stub platform backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use fos_font::{
    FaceId, FaceLoader, FaceResource, FaceTraits, FontError, FontWeight, LoadError, MatchRequest, MatchedFace,
    PlatformPolicy, StyleDescriptor, StyleDescriptorBuilder, SystemMatcher,
};

pub struct StubFace {
    pub family: &'static str,
    pub bold: bool,
    pub italic: bool,
    pub covers: HashSet<char>,
}

impl StubFace {
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            bold: false,
            italic: false,
            covers: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ".chars().collect(),
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn covering(mut self, chars: &str) -> Self {
        self.covers = chars.chars().collect();
        self
    }
}

/// Counting in-memory matcher, loader and policy
#[derive(Default)]
pub struct StubBackend {
    faces: Vec<StubFace>,
    broken: HashSet<&'static str>,
    aliases: Vec<(&'static str, &'static str)>,
    delay: Option<Duration>,
    traits: bool,
    queries: AtomicUsize,
    trait_queries: AtomicUsize,
    loads: AtomicUsize,
    hints: Mutex<Vec<Option<String>>>,
}

impl StubBackend {
    pub fn new(faces: Vec<StubFace>) -> Self {
        Self {
            faces,
            ..Default::default()
        }
    }

    /// Faces of `family` fail to load
    pub fn broken(mut self, family: &'static str) -> Self {
        self.broken.insert(family);
        self
    }

    pub fn alias(mut self, family: &'static str, alternate: &'static str) -> Self {
        self.aliases.push((family, alternate));
        self
    }

    /// Make every matcher query block for a while
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer family trait enumeration instead of reporting `Unsupported`
    pub fn with_traits(mut self) -> Self {
        self.traits = true;
        self
    }

    pub fn trait_queries(&self) -> usize {
        self.trait_queries.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Family hints seen by the matcher, in order
    pub fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap().clone()
    }

    fn matched(&self, index: usize) -> MatchedFace {
        let face = &self.faces[index];
        MatchedFace {
            face_id: FaceId::new(index as u64),
            family: face.family.to_string(),
            bold: face.bold,
            italic: face.italic,
        }
    }
}

impl SystemMatcher for StubBackend {
    fn best_match(&self, request: &MatchRequest<'_>) -> Option<MatchedFace> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().unwrap().push(request.family.map(str::to_string));
        self.pause();

        if let Some(charset) = request.charset {
            let (index, covered) = self
                .faces
                .iter()
                .enumerate()
                .map(|(i, face)| (i, charset.covered_by(|c| face.covers.contains(&c))))
                .max_by_key(|&(i, covered)| (covered, std::cmp::Reverse(i)))?;
            return (covered > 0).then(|| self.matched(index));
        }

        let want_bold = request.weight.is_bold();
        let candidates = self.faces.iter().enumerate().filter(|(_, face)| match request.family {
            Some(family) => face.family.eq_ignore_ascii_case(family),
            None => true,
        });
        let (index, _) = candidates.max_by_key(|(i, face)| {
            (
                face.italic == request.italic,
                face.bold == want_bold,
                std::cmp::Reverse(*i),
            )
        })?;
        Some(self.matched(index))
    }
}

impl FaceLoader for StubBackend {
    fn load_face(&self, face: &MatchedFace) -> Result<Arc<FaceResource>, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(face.family.as_str()) {
            return Err(LoadError::Parse("bad table directory".to_string()));
        }
        Ok(Arc::new(FaceResource::new(
            face.face_id,
            face.family.clone(),
            face.bold,
            face.italic,
            Arc::from(Vec::new()),
            0,
        )))
    }
}

impl PlatformPolicy for StubBackend {
    fn alternate_family_name(&self, family: &str) -> fos_font::Result<Option<String>> {
        if self.aliases.is_empty() {
            return Err(FontError::Unsupported("alternate family names"));
        }
        Ok(self
            .aliases
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(family))
            .map(|(_, alternate)| alternate.to_string()))
    }

    fn traits_in_family(&self, family: &str) -> fos_font::Result<BTreeSet<FaceTraits>> {
        if !self.traits {
            return Err(FontError::Unsupported("family traits"));
        }
        self.trait_queries.fetch_add(1, Ordering::SeqCst);
        self.pause();
        Ok(self
            .faces
            .iter()
            .filter(|face| face.family.eq_ignore_ascii_case(family))
            .map(|face| FaceTraits {
                weight: if face.bold { FontWeight::BOLD } else { FontWeight::NORMAL },
                italic: face.italic,
            })
            .collect())
    }
}

/// A typical desktop install
pub fn desktop() -> Vec<StubFace> {
    vec![
        StubFace::new("sans-serif"),
        StubFace::new("serif"),
        StubFace::new("monospace"),
        StubFace::new("Arial"),
        StubFace::new("Arial").bold(),
        StubFace::new("Georgia"),
        StubFace::new("Georgia").italic(),
        StubFace::new("Noto Sans CJK").covering("漢字かなカナ한글"),
    ]
}

pub fn descriptor() -> StyleDescriptorBuilder {
    StyleDescriptor::builder()
}
