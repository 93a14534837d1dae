//! System font backend built on fontdb
//!
//! Implements [`SystemMatcher`], [`FaceLoader`] and [`PlatformPolicy`] over a
//! `fontdb::Database`. Face data is loaded once per installed face and shared
//! by every handle until the last one is dropped.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::charset::CharSet;
use crate::config::FontConfig;
use crate::face::{FaceId, FaceResource, FaceTraits};
use crate::matcher::{FaceLoader, LoadError, MatchRequest, MatchedFace, PlatformPolicy, SystemMatcher};
use crate::style::FontWeight;
use crate::Result;

/// Faces at or above this weight report themselves as bold
const BOLD_FACE_WEIGHT: u16 = 600;

/// Metric-compatible family aliases, usable in both directions
const FAMILY_ALIASES: &[(&str, &str)] = &[
    ("Courier", "Courier New"),
    ("Times", "Times New Roman"),
    ("Arial", "Helvetica"),
];

/// Installed fonts known to fontdb
pub struct SystemFonts {
    db: Database,
    /// `FaceId(n)` names `ids[n]`
    ids: Vec<ID>,
    lookup: HashMap<ID, FaceId>,
    resources: Mutex<HashMap<FaceId, Weak<FaceResource>>>,
}

impl SystemFonts {
    /// Wrap an already populated database
    pub fn new(db: Database) -> Self {
        let ids: Vec<ID> = db.faces().map(|face| face.id).collect();
        let lookup = ids
            .iter()
            .enumerate()
            .map(|(n, id)| (*id, FaceId::new(n as u64)))
            .collect();
        Self {
            db,
            ids,
            lookup,
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Create a backend with the fonts the configuration asks for
    pub fn from_config(config: &FontConfig) -> Self {
        let mut db = Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            db.load_fonts_dir(dir);
        }
        info!("Loaded {} font faces", db.len());
        Self::new(db)
    }

    /// Number of installed faces
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// List all installed font families
    pub fn families(&self) -> BTreeSet<&str> {
        self.db
            .faces()
            .filter_map(|f| f.families.first().map(|(name, _)| name.as_str()))
            .collect()
    }

    fn matched_face(&self, id: ID) -> Option<MatchedFace> {
        let info = self.db.face(id)?;
        let face_id = *self.lookup.get(&id)?;
        Some(MatchedFace {
            face_id,
            family: info
                .families
                .first()
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            bold: reports_bold(info.weight),
            italic: info.style != Style::Normal,
        })
    }

    fn best_by_family(&self, request: &MatchRequest<'_>) -> Option<MatchedFace> {
        let mut families: Vec<Family<'_>> = Vec::new();
        match request.family.map(generic_candidates) {
            Some(Some((generic, candidates))) => {
                families.push(generic);
                families.extend(candidates.iter().copied().map(Family::Name));
            }
            Some(None) => families.push(Family::Name(request.family?)),
            None => {
                // The system default is sans-serif.
                let (generic, candidates) = generic_candidates("sans-serif")?;
                families.push(generic);
                families.extend(candidates.iter().copied().map(Family::Name));
            }
        }

        let id = self.db.query(&Query {
            families: &families,
            weight: Weight(request.weight.0),
            stretch: Stretch::Normal,
            style: if request.italic { Style::Italic } else { Style::Normal },
        })?;
        self.matched_face(id)
    }

    fn best_by_coverage(&self, request: &MatchRequest<'_>, charset: &CharSet) -> Option<MatchedFace> {
        let mut best: Option<(Score, ID)> = None;

        for info in self.db.faces() {
            if let Some(family) = request.family {
                if !info.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)) {
                    continue;
                }
            }

            let covered = self
                .db
                .with_face_data(info.id, |data, index| {
                    ttf_parser::Face::parse(data, index)
                        .map(|face| charset.covered_by(|c| face.glyph_index(c).is_some()))
                        .unwrap_or(0)
                })
                .unwrap_or(0);
            if covered == 0 {
                continue;
            }

            let score = Score {
                covered,
                italic_match: (info.style != Style::Normal) == request.italic,
                weight_distance: info.weight.0.abs_diff(request.weight.0),
            };
            if best.as_ref().is_none_or(|(current, _)| score.beats(current)) {
                best = Some((score, info.id));
            }
        }

        let (score, id) = best?;
        debug!("Best coverage: {}/{} chars", score.covered, charset.len());
        self.matched_face(id)
    }
}

fn reports_bold(weight: Weight) -> bool {
    weight.0 >= BOLD_FACE_WEIGHT
}

/// Ranking for coverage candidates
#[derive(Debug)]
struct Score {
    covered: usize,
    italic_match: bool,
    weight_distance: u16,
}

impl Score {
    fn beats(&self, other: &Score) -> bool {
        (self.covered, self.italic_match, std::cmp::Reverse(self.weight_distance))
            > (other.covered, other.italic_match, std::cmp::Reverse(other.weight_distance))
    }
}

/// Resolve generic font family to fontdb's generic plus common system families
fn generic_candidates(family: &str) -> Option<(Family<'static>, &'static [&'static str])> {
    let resolved: (Family<'static>, &'static [&'static str]) = match family.to_lowercase().as_str() {
        "serif" => (Family::Serif, &["Times New Roman", "Times", "DejaVu Serif", "Noto Serif", "Liberation Serif"]),
        "sans-serif" => (Family::SansSerif, &["Arial", "Helvetica", "DejaVu Sans", "Noto Sans", "Liberation Sans"]),
        "monospace" => (Family::Monospace, &["Courier New", "Consolas", "DejaVu Sans Mono", "Noto Sans Mono", "Liberation Mono"]),
        "cursive" => (Family::Cursive, &["Comic Sans MS", "Brush Script MT"]),
        "fantasy" => (Family::Fantasy, &["Impact", "Papyrus"]),
        _ => return None,
    };
    Some(resolved)
}

impl SystemMatcher for SystemFonts {
    fn best_match(&self, request: &MatchRequest<'_>) -> Option<MatchedFace> {
        match request.charset {
            Some(charset) if charset.is_empty() => None,
            Some(charset) => self.best_by_coverage(request, charset),
            None => self.best_by_family(request),
        }
    }
}

impl FaceLoader for SystemFonts {
    fn load_face(&self, face: &MatchedFace) -> std::result::Result<Arc<FaceResource>, LoadError> {
        if let Some(live) = self.resources.lock().get(&face.face_id).and_then(Weak::upgrade) {
            return Ok(live);
        }

        let id = self
            .ids
            .get(face.face_id.raw() as usize)
            .copied()
            .ok_or(LoadError::UnknownFace(face.face_id))?;

        // Read outside the table lock; file-backed sources hit the disk.
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (Arc::<[u8]>::from(data), index))
            .ok_or(LoadError::UnknownFace(face.face_id))?;
        if let Err(e) = ttf_parser::Face::parse(&data, index) {
            warn!("Installed face {:?} does not parse: {}", face.family, e);
            return Err(LoadError::Parse(e.to_string()));
        }

        let resource = Arc::new(FaceResource::new(
            face.face_id,
            face.family.clone(),
            face.bold,
            face.italic,
            data,
            index,
        ));

        let mut resources = self.resources.lock();
        if let Some(live) = resources.get(&face.face_id).and_then(Weak::upgrade) {
            return Ok(live);
        }
        resources.retain(|_, weak| weak.strong_count() > 0);
        resources.insert(face.face_id, Arc::downgrade(&resource));
        Ok(resource)
    }
}

impl PlatformPolicy for SystemFonts {
    fn alternate_family_name(&self, family: &str) -> Result<Option<String>> {
        let family = family.trim();
        let alternate = FAMILY_ALIASES.iter().find_map(|(a, b)| {
            if a.eq_ignore_ascii_case(family) {
                Some(*b)
            } else if b.eq_ignore_ascii_case(family) {
                Some(*a)
            } else {
                None
            }
        });
        Ok(alternate.map(str::to_string))
    }

    fn traits_in_family(&self, family: &str) -> Result<BTreeSet<FaceTraits>> {
        let family = family.trim();
        Ok(self
            .db
            .faces()
            .filter(|info| info.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)))
            .map(|info| FaceTraits {
                weight: FontWeight(info.weight.0),
                italic: info.style != Style::Normal,
            })
            .collect())
    }
}
