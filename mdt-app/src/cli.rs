use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mdt_experiment::{DisplayGeometry, LeftoverStart, SessionConfig, TaskKind, Variant};

#[derive(Debug, Parser)]
#[command(
    name = "mdt",
    about = "Mnemonic discrimination task runner (object, spatial, temporal)",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a session in the terminal and write its log.
    Run(SessionArgs),

    /// Print the seeded trial allocation as JSON without running anything.
    Plan(SessionArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    Object,
    Spatial,
    Temporal,
}

impl From<TaskArg> for TaskKind {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Object => TaskKind::Object,
            TaskArg::Spatial => TaskKind::Spatial,
            TaskArg::Temporal => TaskKind::Temporal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Normal,
    /// Object task with intracranial recording: fixed timings, numeric buttons, photodiode box.
    Ecog,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Normal => Variant::Normal,
            VariantArg::Ecog => Variant::ECog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LeftoverArg {
    /// Leftovers start one past the quota and stop at the high bin's end.
    SkipOne,
    /// Leftovers start at the quota, run to the longer bin and take dedicated singles.
    AfterQuota,
}

impl From<LeftoverArg> for LeftoverStart {
    fn from(arg: LeftoverArg) -> Self {
        match arg {
            LeftoverArg::AfterQuota => LeftoverStart::AfterQuota,
            LeftoverArg::SkipOne => LeftoverStart::SkipOne,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    #[arg(long, value_enum, default_value_t = TaskArg::Object)]
    pub task: TaskArg,

    #[arg(long = "subject", default_value_t = 999)]
    pub subject_id: u64,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub subset: u8,

    /// Seconds each stimulus stays on screen.
    #[arg(long = "trial-duration", default_value_t = 2.0)]
    pub trial_duration_s: f64,

    /// Seconds of blank screen between trials.
    #[arg(long = "isi", default_value_t = 0.5)]
    pub isi_s: f64,

    #[arg(long)]
    pub self_paced: bool,

    #[arg(long)]
    pub no_practice: bool,

    #[arg(long, default_value = "z")]
    pub left_key: String,

    #[arg(long, default_value = "m")]
    pub right_key: String,

    #[arg(long, default_value = "p")]
    pub pause_key: String,

    /// Object and spatial tasks.
    #[arg(long = "trials", default_value_t = 40)]
    pub trials_per_condition: usize,

    /// Temporal task.
    #[arg(long, default_value_t = 10)]
    pub blocks: usize,

    /// Temporal task: a positive multiple of 8.
    #[arg(long, default_value_t = 32)]
    pub stimuli_per_block: usize,

    #[arg(long, value_enum, default_value_t = VariantArg::Normal)]
    pub variant: VariantArg,

    /// Object task: where unselected lure pairs start feeding singles.
    #[arg(long, value_enum, default_value_t = LeftoverArg::SkipOne)]
    pub leftover_start: LeftoverArg,

    /// Temporal task: pairing attempts per block before giving up.
    #[arg(long, default_value_t = mdt_experiment::temporal::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    #[arg(long = "images", default_value = "images")]
    pub image_dir: PathBuf,

    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,

    #[arg(long, default_value_t = 1920.0)]
    pub width: f64,

    #[arg(long, default_value_t = 1080.0)]
    pub height: f64,
}

impl SessionArgs {
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            task: self.task.into(),
            subject_id: self.subject_id,
            subset: self.subset,
            trial_duration_s: self.trial_duration_s,
            isi_s: self.isi_s,
            self_paced: self.self_paced,
            practice: !self.no_practice,
            left_key: self.left_key.clone(),
            right_key: self.right_key.clone(),
            pause_key: self.pause_key.clone(),
            trials_per_condition: self.trials_per_condition,
            blocks: self.blocks,
            stimuli_per_block: self.stimuli_per_block,
            variant: self.variant.into(),
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry {
            width: self.width,
            height: self.height,
        }
    }
}
