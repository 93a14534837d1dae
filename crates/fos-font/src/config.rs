//! Font Configuration

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::style::Script;
use crate::{FontError, Result};

/// Font resolution configuration options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Family that must always resolve
    pub last_resort_family: String,

    /// Tried in order when the last-resort family is missing
    pub extra_last_resort_families: Vec<String>,

    /// Per-script family substitutions
    pub script_families: HashMap<Script, String>,

    /// Load installed system fonts into the fontdb backend
    pub load_system_fonts: bool,

    /// Additional directories to scan for fonts
    pub font_dirs: Vec<PathBuf>,

    /// Coverage matches remembered by the resolver (0 disables)
    pub coverage_cache_capacity: usize,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            last_resort_family: "Arial".to_string(),
            extra_last_resort_families: vec!["Liberation Sans".to_string(), "DejaVu Sans".to_string()],
            script_families: HashMap::new(),
            load_system_fonts: true,
            font_dirs: Vec::new(),
            coverage_cache_capacity: 256,
        }
    }
}

impl FontConfig {
    /// Parse a JSON configuration document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FontError::Config(e.to_string()))
    }

    /// Last-resort families in the order they are tried
    pub fn last_resort_families(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.last_resort_family.as_str())
            .chain(self.extra_last_resort_families.iter().map(String::as_str))
    }

    pub fn with_last_resort_family(mut self, family: impl Into<String>) -> Self {
        self.last_resort_family = family.into();
        self
    }

    pub fn with_extra_last_resort_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_last_resort_families = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_script_family(mut self, script: Script, family: impl Into<String>) -> Self {
        self.script_families.insert(script, family.into());
        self
    }

    /// Enables or disables system font discovery.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.load_system_fonts = enabled;
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    pub fn with_coverage_cache_capacity(mut self, capacity: usize) -> Self {
        self.coverage_cache_capacity = capacity;
        self
    }
}
