//! Style descriptors and cache keys

use serde::Deserialize;

use crate::{FontError, Result};

/// Font weight (CSS numeric weight)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const EXTRA_LIGHT: FontWeight = FontWeight(200);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const EXTRA_BOLD: FontWeight = FontWeight(800);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Bold-or-heavier, the point at which emphasis is synthesized.
    pub fn is_bold(self) -> bool {
        self >= Self::BOLD
    }

    /// Hundreds bucket used for cache keys (0..=10).
    ///
    /// Buckets never straddle the bold threshold.
    pub fn bucket(self) -> u8 {
        (self.0 / 100).min(10) as u8
    }

    /// Representative weight of this weight's bucket.
    pub fn normalized(self) -> FontWeight {
        FontWeight(self.bucket() as u16 * 100)
    }
}

impl From<u16> for FontWeight {
    fn from(value: u16) -> Self {
        FontWeight(value)
    }
}

/// Generic font family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenericFamily {
    #[default]
    None,
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

const GENERIC_FAMILY_NAMES: &[(GenericFamily, &str)] = &[
    (GenericFamily::Serif, "serif"),
    (GenericFamily::SansSerif, "sans-serif"),
    (GenericFamily::Monospace, "monospace"),
    (GenericFamily::Cursive, "cursive"),
    (GenericFamily::Fantasy, "fantasy"),
];

impl GenericFamily {
    /// Family hint handed to the system matcher, `None` meaning the system default.
    pub fn platform_name(self) -> Option<&'static str> {
        GENERIC_FAMILY_NAMES
            .iter()
            .find(|(generic, _)| *generic == self)
            .map(|(_, name)| *name)
    }

    /// Parse a CSS generic family keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        GENERIC_FAMILY_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(keyword))
            .map(|(generic, _)| *generic)
    }
}

/// Scripts that get per-script family substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Greek,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Devanagari,
    Bengali,
    Tamil,
    Thai,
    Georgian,
    Hangul,
    Ethiopic,
    Khmer,
    Hiragana,
    Katakana,
    Han,
}

impl Script {
    /// Detect the script of a character from its Unicode block.
    pub fn of(c: char) -> Option<Script> {
        let script = match c as u32 {
            0x0041..=0x024F => Script::Latin,
            0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
            0x0400..=0x052F => Script::Cyrillic,
            0x0530..=0x058F => Script::Armenian,
            0x0590..=0x05FF => Script::Hebrew,
            0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => Script::Arabic,
            0x0900..=0x097F => Script::Devanagari,
            0x0980..=0x09FF => Script::Bengali,
            0x0B80..=0x0BFF => Script::Tamil,
            0x0E00..=0x0E7F => Script::Thai,
            0x10A0..=0x10FF => Script::Georgian,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => Script::Hangul,
            0x1200..=0x139F => Script::Ethiopic,
            0x1780..=0x17FF => Script::Khmer,
            0x3040..=0x309F => Script::Hiragana,
            0x30A0..=0x30FF => Script::Katakana,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F => Script::Han,
            _ => return None,
        };
        Some(script)
    }
}

/// Normalized font request from the layout engine.
///
/// Immutable once built. Use [`StyleDescriptor::builder`] to construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    families: Vec<String>,
    generic: GenericFamily,
    weight: FontWeight,
    italic: bool,
    size_px: f32,
    script: Option<Script>,
}

impl StyleDescriptor {
    pub fn builder() -> StyleDescriptorBuilder {
        StyleDescriptorBuilder::default()
    }

    /// Requested families in priority order (may be empty)
    pub fn families(&self) -> &[String] {
        &self.families
    }

    pub fn generic_family(&self) -> GenericFamily {
        self.generic
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn italic(&self) -> bool {
        self.italic
    }

    /// Computed pixel size
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn script(&self) -> Option<Script> {
        self.script
    }

    /// Copy of this descriptor requesting `families` instead.
    pub fn with_families<I, S>(&self, families: I) -> StyleDescriptor
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StyleDescriptor {
            families: clean_families(families),
            ..self.clone()
        }
    }

    /// Key under which the font cache stores this request.
    pub fn cache_key(&self) -> FallbackCacheKey {
        let mut families: Vec<String> = Vec::with_capacity(self.families.len());
        for family in &self.families {
            let lowered = family.to_lowercase();
            if !families.contains(&lowered) {
                families.push(lowered);
            }
        }

        // The generic family is only consulted when no family is named.
        let generic = if families.is_empty() {
            self.generic
        } else {
            GenericFamily::None
        };

        FallbackCacheKey {
            families,
            generic,
            weight_bucket: self.weight.bucket(),
            italic: self.italic,
            size_scaled: (self.size_px * 64.0).round() as u32,
        }
    }
}

fn clean_families<I, S>(families: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    families
        .into_iter()
        .map(|family| family.into().trim().to_string())
        .filter(|family| !family.is_empty())
        .collect()
}

/// Builder for [`StyleDescriptor`]
#[derive(Debug, Clone)]
pub struct StyleDescriptorBuilder {
    families: Vec<String>,
    generic: GenericFamily,
    weight: FontWeight,
    italic: bool,
    size_px: f32,
    script: Option<Script>,
}

impl Default for StyleDescriptorBuilder {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            generic: GenericFamily::None,
            weight: FontWeight::NORMAL,
            italic: false,
            size_px: 16.0,
            script: None,
        }
    }
}

impl StyleDescriptorBuilder {
    /// Append a family to the priority list
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.families.push(family.into());
        self
    }

    /// Replace the family list
    pub fn families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.families = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn generic(mut self, generic: GenericFamily) -> Self {
        self.generic = generic;
        self
    }

    pub fn weight(mut self, weight: impl Into<FontWeight>) -> Self {
        self.weight = weight.into();
        self
    }

    /// Set bold weight
    pub fn bold(self) -> Self {
        self.weight(FontWeight::BOLD)
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn size(mut self, size_px: f32) -> Self {
        self.size_px = size_px;
        self
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn build(self) -> Result<StyleDescriptor> {
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(FontError::InvalidDescriptor(format!(
                "size must be a positive pixel value, got {}",
                self.size_px
            )));
        }

        Ok(StyleDescriptor {
            families: clean_families(self.families),
            generic: self.generic,
            weight: self.weight,
            italic: self.italic,
            size_px: self.size_px,
            script: self.script,
        })
    }
}

/// Cache key derived from a descriptor's normalized fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FallbackCacheKey {
    /// Lowercased, deduplicated family names
    families: Vec<String>,
    generic: GenericFamily,
    weight_bucket: u8,
    italic: bool,
    /// Size in 1/64 px, to avoid float hashing
    size_scaled: u32,
}
