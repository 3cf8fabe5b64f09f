use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use mdt_core::{Condition, TrialRecord, pair_seed};
use mdt_experiment::{
    BlockPlan, DisplayGeometry, ObjectTask, Session, SessionConfig, SpatialTask, StdFilesystem, StimulusPool, Task, TaskKind,
    TemporalTask, WriterSink,
};
use mdt_timing::HighPrecisionTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::cli::{Commands, SessionArgs};
use crate::console::ConsolePresenter;

pub struct App {
    command: Commands,
}

impl App {
    pub fn new(command: Commands) -> Self {
        Self { command }
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run_session(&args),
            Commands::Plan(args) => {
                println!("{}", plan(&args)?);
                Ok(())
            }
        }
    }
}

/// Output files of one subject and task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub log: PathBuf,
    pub trials: PathBuf,
}

impl LogPaths {
    pub fn new(dir: &Path, subject_id: u64, task: TaskKind) -> Self {
        let stem = format!("{subject_id}_{}", task.code());
        Self {
            log: dir.join(format!("{stem}_log.txt")),
            trials: dir.join(format!("{stem}_trials.json")),
        }
    }
}

/// Moves a previous log for the same subject and task out of the way,
/// stamping the new name with `now`.
pub fn archive_existing(
    dir: &Path,
    subject_id: u64,
    task: TaskKind,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    let current = LogPaths::new(dir, subject_id, task).log;
    if !current.exists() {
        return Ok(None);
    }
    let archived = dir.join(format!(
        "{subject_id}_{}_old_{}.txt",
        task.code(),
        now.format("%m%d%y_%H%M%S")
    ));
    fs::rename(&current, &archived)
        .with_context(|| format!("failed to archive {}", current.display()))?;
    warn!(from = %current.display(), to = %archived.display(), "existing log archived");
    Ok(Some(archived))
}

pub fn export_records(path: &Path, records: &[TrialRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), trials = records.len(), "trial records exported");
    Ok(())
}

fn load_pool<T: Task>(task: &T, args: &SessionArgs, config: &SessionConfig) -> Result<StimulusPool> {
    StimulusPool::load(
        &StdFilesystem,
        &args.image_dir,
        config.task.naming_rule(),
        config.practice,
        &task.required_stimuli(config),
    )
    .with_context(|| format!("cannot load stimuli from {}", args.image_dir.display()))
}

fn object_task(args: &SessionArgs) -> ObjectTask {
    ObjectTask {
        leftover_start: args.leftover_start.into(),
    }
}

fn temporal_task(args: &SessionArgs) -> TemporalTask {
    TemporalTask {
        max_attempts: args.max_attempts,
    }
}

/// The allocation a session with these arguments would run, as JSON.
pub fn plan(args: &SessionArgs) -> Result<String> {
    let config = args.config();
    config.validate()?;
    match config.task {
        TaskKind::Object => plan_json(&object_task(args), args, &config),
        TaskKind::Spatial => plan_json(&SpatialTask, args, &config),
        TaskKind::Temporal => plan_json(&temporal_task(args), args, &config),
    }
}

/// Draws the allocation a session seeded from `config` will run.
fn seeded_plan<T: Task>(
    task: &T,
    pool: &StimulusPool,
    config: &SessionConfig,
    geometry: DisplayGeometry,
) -> Result<(u64, Vec<BlockPlan<T::Item>>)> {
    let seed = pair_seed(config.subject_id, config.subset);
    let mut rng = StdRng::seed_from_u64(seed);
    let blocks = task
        .plan(pool, config, geometry, &mut rng)
        .with_context(|| format!("cannot allocate {} trials", config.task))?;
    Ok((seed, blocks))
}

fn plan_json<T: Task>(task: &T, args: &SessionArgs, config: &SessionConfig) -> Result<String> {
    let pool = load_pool(task, args, config)?;
    let (seed, blocks) = seeded_plan(task, &pool, config, args.geometry())?;
    let doc = serde_json::json!({
        "task": config.task.code(),
        "subject": config.subject_id,
        "subset": config.subset,
        "seed": seed,
        "blocks": blocks,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn run_session(args: &SessionArgs) -> Result<()> {
    let config = args.config();
    config.validate()?;
    match config.task {
        TaskKind::Object => run_task(object_task(args), args, config),
        TaskKind::Spatial => run_task(SpatialTask, args, config),
        TaskKind::Temporal => run_task(temporal_task(args), args, config),
    }
}

fn run_task<T: Task>(task: T, args: &SessionArgs, config: SessionConfig) -> Result<()> {
    // Stimuli and the allocation are checked before any log file is touched.
    let pool = load_pool(&task, args, &config)?;
    let (seed, _) = seeded_plan(&task, &pool, &config, args.geometry())?;
    debug!(seed, "allocation checked");

    fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("cannot create {}", args.log_dir.display()))?;
    let now = Local::now();
    archive_existing(&args.log_dir, config.subject_id, config.task, now)?;
    let paths = LogPaths::new(&args.log_dir, config.subject_id, config.task);
    let file = File::create(&paths.log)
        .with_context(|| format!("cannot create {}", paths.log.display()))?;
    info!(log = %paths.log.display(), "session log opened");

    let timer = HighPrecisionTimer::new();
    let presenter = ConsolePresenter::stdin(args.geometry(), timer.clone());
    let sink = WriterSink::new(BufWriter::new(file));
    let mut session = Session::new(task, config, presenter, sink, timer);

    let started_at = now.format("%H:%M on %m/%d/%y").to_string();
    let result = session.run(&pool, &started_at);
    export_records(&paths.trials, &session.records)?;

    match result {
        Ok(outcome) => {
            println!("Session complete (seed {}).", outcome.seed);
            for (condition, (correct, _)) in outcome.scores.ratios() {
                println!("  {:<10} {:>5.2}", condition.label(), correct);
            }
            Ok(())
        }
        Err(err) if err.is_termination() => {
            println!("Session ended early: {err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
