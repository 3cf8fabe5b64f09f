use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// First key pressed in a response window.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    pub key: String,
    pub reaction_time: Duration,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, reaction_time: Duration) -> Self {
        Self {
            key: key.into(),
            reaction_time,
        }
    }
}

/// Recorded result per trial, exported alongside the text log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub phase: Phase,
    pub practice: bool,
    pub block: usize,
    pub trial: usize,
    pub stimulus: String,
    pub condition: String,
    pub expected: Option<String>,
    /// `None` when the window closed without a key.
    pub response: Option<String>,
    pub reaction_time_s: f64,
    /// The pause key was pressed instead of a response.
    #[serde(default)]
    pub paused: bool,
}

impl TrialRecord {
    pub fn correct(&self) -> Option<bool> {
        match (&self.expected, &self.response) {
            (Some(expected), Some(response)) => Some(expected == response),
            _ => None,
        }
    }
}
