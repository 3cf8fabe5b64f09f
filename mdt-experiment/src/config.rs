use std::fmt;
use std::ops::Range;
use std::time::Duration;

use mdt_core::NamingRule;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presenter::{ResponseWindow, Side};

/// Key that aborts the running phase.
pub const ESCAPE_KEY: &str = "escape";

/// Response buttons of the ECog procedure, left then right.
pub const ECOG_KEYS: [&str; 2] = ["1", "2"];
pub const ECOG_STUDY_DURATION: Duration = Duration::from_secs(2);
pub const ECOG_TEST_DURATION: Duration = Duration::from_secs(1);
pub const ECOG_ISI: Duration = Duration::from_millis(500);
/// How long the response screen waits after the stimulus is gone.
pub const ECOG_RESPONSE_WINDOW: Duration = Duration::from_millis(1500);
/// Inter-trial interval in milliseconds, drawn uniformly per trial.
pub const ECOG_ITI_MS: Range<u64> = 1000..1400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Object,
    Spatial,
    Temporal,
}

impl TaskKind {
    /// Short code used in log filenames.
    pub fn code(self) -> &'static str {
        match self {
            TaskKind::Object => "MDTO",
            TaskKind::Spatial => "MDTS",
            TaskKind::Temporal => "MDTT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Object => "Object",
            TaskKind::Spatial => "Spatial",
            TaskKind::Temporal => "Temporal",
        }
    }

    pub fn naming_rule(self) -> NamingRule {
        match self {
            TaskKind::Object => NamingRule::LureCoded,
            TaskKind::Spatial | TaskKind::Temporal => NamingRule::Plain,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trial procedure. `ECog` is the electrocorticography paradigm of the
/// object task: fixed stimulus durations with a photodiode marker, then a
/// separate response screen answered with `1` or `2`, then a jittered
/// inter-trial interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Normal,
    ECog,
}

impl Variant {
    pub fn label(self) -> &'static str {
        match self {
            Variant::Normal => "Normal",
            Variant::ECog => "ECog",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("subset must be a number 1-10, got {0}")]
    SubsetOutOfRange(u8),

    #[error("trial duration must be greater than 0, got {0}")]
    TrialDuration(f64),

    #[error("ISI must be greater than 0, got {0}")]
    Isi(f64),

    #[error("exactly two distinct response buttons are required")]
    Buttons,

    #[error("pause button must be one key distinct from the response buttons, got {0:?}")]
    PauseKey(String),

    #[error("trials per condition must be at least 1")]
    ZeroTrials,

    #[error("at least one block must be run")]
    ZeroBlocks,

    #[error("the {variant} variant is only available for the object task, not {task}")]
    VariantUnsupported { variant: Variant, task: TaskKind },
}

/// Parameters of one session, as entered by the experimenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub task: TaskKind,
    pub subject_id: u64,
    pub subset: u8,
    pub trial_duration_s: f64,
    pub isi_s: f64,
    pub self_paced: bool,
    pub practice: bool,
    pub left_key: String,
    pub right_key: String,
    pub pause_key: String,
    /// Object and spatial tasks.
    pub trials_per_condition: usize,
    /// Temporal task.
    pub blocks: usize,
    /// Temporal task: stimuli shown per study block.
    pub stimuli_per_block: usize,
    pub variant: Variant,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            task: TaskKind::Object,
            subject_id: 999,
            subset: 1,
            trial_duration_s: 2.0,
            isi_s: 0.5,
            self_paced: false,
            practice: true,
            left_key: "z".into(),
            right_key: "m".into(),
            pause_key: "p".into(),
            trials_per_condition: 40,
            blocks: 10,
            stimuli_per_block: 32,
            variant: Variant::Normal,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10).contains(&self.subset) {
            return Err(ConfigError::SubsetOutOfRange(self.subset));
        }
        if !self.self_paced && !(self.trial_duration_s > 0.0 && self.trial_duration_s.is_finite()) {
            return Err(ConfigError::TrialDuration(self.trial_duration_s));
        }
        if !(self.isi_s > 0.0 && self.isi_s.is_finite()) {
            return Err(ConfigError::Isi(self.isi_s));
        }
        if self.left_key.is_empty() || self.right_key.is_empty() || self.left_key == self.right_key {
            return Err(ConfigError::Buttons);
        }
        if self.variant == Variant::ECog && self.task != TaskKind::Object {
            return Err(ConfigError::VariantUnsupported {
                variant: self.variant,
                task: self.task,
            });
        }
        if self.pause_key.chars().count() != 1
            || self.pause_key == self.key_for(Side::Left)
            || self.pause_key == self.key_for(Side::Right)
        {
            return Err(ConfigError::PauseKey(self.pause_key.clone()));
        }
        if self.trials_per_condition == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        if self.blocks == 0 {
            return Err(ConfigError::ZeroBlocks);
        }
        Ok(())
    }

    pub fn response_window(&self) -> ResponseWindow {
        if self.self_paced {
            ResponseWindow::SelfPaced
        } else {
            ResponseWindow::Fixed(Duration::try_from_secs_f64(self.trial_duration_s).unwrap_or_default())
        }
    }

    pub fn isi(&self) -> Duration {
        Duration::try_from_secs_f64(self.isi_s).unwrap_or_default()
    }

    /// Response button for `side`. The ECog procedure has its own fixed
    /// buttons.
    pub fn key_for(&self, side: Side) -> &str {
        match (self.variant, side) {
            (Variant::ECog, Side::Left) => ECOG_KEYS[0],
            (Variant::ECog, Side::Right) => ECOG_KEYS[1],
            (Variant::Normal, Side::Left) => &self.left_key,
            (Variant::Normal, Side::Right) => &self.right_key,
        }
    }

    /// Keys accepted while waiting for a trial response.
    pub fn trial_keys(&self) -> [&str; 4] {
        [
            self.key_for(Side::Left),
            self.key_for(Side::Right),
            &self.pause_key,
            ESCAPE_KEY,
        ]
    }
}
