use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Image extensions accepted as stimuli, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Substring marking practice-only images.
pub const PRACTICE_MARKER: &str = "PR_";

/// Byte offset of the lure-bin code in object-task filenames.
pub const LURE_CODE_POSITION: usize = 5;

/// Semantic role of a stimulus file, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Target,
    LureHigh,
    LureLow,
    Practice,
    Single,
}

/// How a filename maps to a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingRule {
    /// Object-task images: byte 5 holds `1` (lure high), `2` (lure low)
    /// or `3` (single). Any other code is rejected.
    LureCoded,
    /// Spatial and temporal images: every non-practice image is a target.
    Plain,
}

impl NamingRule {
    /// Classifies an image filename. Non-image files should be filtered out
    /// with [`is_supported_image`] before calling this.
    pub fn classify(self, name: &str) -> Result<Category, LoadError> {
        if is_practice(name) {
            return Ok(Category::Practice);
        }
        match self {
            NamingRule::Plain => Ok(Category::Target),
            NamingRule::LureCoded => match name.as_bytes().get(LURE_CODE_POSITION) {
                Some(b'1') => Ok(Category::LureHigh),
                Some(b'2') => Ok(Category::LureLow),
                Some(b'3') => Ok(Category::Single),
                _ => Err(LoadError::UnrecognizedName {
                    name: name.to_string(),
                    position: LURE_CODE_POSITION,
                }),
            },
        }
    }
}

pub fn is_practice(name: &str) -> bool {
    name.contains(PRACTICE_MARKER)
}

pub fn is_supported_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// A classified stimulus image. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StimulusFile {
    name: String,
    category: Category,
}

impl StimulusFile {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl fmt::Display for StimulusFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
