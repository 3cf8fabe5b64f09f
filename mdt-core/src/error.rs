use std::path::PathBuf;

use thiserror::Error;

use crate::stimulus::Category;

/// The stimulus pool could not be built. Always fatal: raised before any
/// trial runs and before the session log is opened.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("stimulus directory {path} could not be read: {source}")]
    MissingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized stimulus name {name:?}: expected lure code 1, 2 or 3 at byte {position}")]
    UnrecognizedName { name: String, position: usize },

    #[error("not enough {category:?} stimuli in {path}: need {needed}, found {found}")]
    Insufficient {
        path: PathBuf,
        category: Category,
        needed: usize,
        found: usize,
    },
}

/// A quota or geometric constraint could not be met.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("lure bin {bin} has {available} pairs, {needed} required")]
    InsufficientPairs {
        bin: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("only {available} leftover stimuli for singles, {needed} required")]
    InsufficientSingles { needed: usize, available: usize },

    #[error("only {available} stimuli available, {needed} required")]
    InsufficientStimuli { needed: usize, available: usize },

    #[error("no valid {class} placement after {attempts} attempts")]
    PlacementExhausted { class: &'static str, attempts: usize },

    #[error("display {width}x{height} leaves no interior for {image_size}px stimuli")]
    DegenerateGeometry {
        width: f64,
        height: f64,
        image_size: f64,
    },

    #[error("{count} x {per} stimuli overflows the addressable quota")]
    QuotaOverflow { count: usize, per: usize },

    #[error("sequence block of {num_stim} stimuli is not a positive multiple of 8")]
    InvalidBlockSize { num_stim: usize },

    #[error("sequence pairs could not be placed in {attempts} attempts")]
    AttemptsExhausted { attempts: usize },

    #[error("practice round {round} has {found} images, exactly {expected} required")]
    PracticeRoundSize {
        round: usize,
        expected: usize,
        found: usize,
    },
}
