//! Character sets for coverage queries

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Ordered set of code points a text run needs glyphs for
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    chars: BTreeSet<char>,
}

impl CharSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, c: char) -> bool {
        self.chars.insert(c)
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Number of characters for which `has_glyph` answers true
    pub fn covered_by(&self, mut has_glyph: impl FnMut(char) -> bool) -> usize {
        self.chars.iter().filter(|&&c| has_glyph(c)).count()
    }

    /// Stable hash of the set contents, independent of insertion order.
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.chars.hash(&mut hasher);
        hasher.finish()
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}

impl Extend<char> for CharSet {
    fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
        self.chars.extend(iter);
    }
}
