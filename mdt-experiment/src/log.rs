use std::io::{self, Write};

use mdt_core::{Condition, Scorer};

use crate::config::{SessionConfig, TaskKind};

/// Destination of the session log, one line per call.
pub trait LogSink {
    fn append(&mut self, line: &str) -> io::Result<()>;

    /// Flushes and releases the sink. Called exactly once per session,
    /// whether or not it completed.
    fn close(&mut self) -> io::Result<()>;
}

/// Keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Writes lines to any `Write`, typically a buffered log file.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn append(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.inner, "{line}")
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Session parameters at the top of the log. `started_at` is already
/// formatted by the caller.
pub fn write_header<S: LogSink + ?Sized>(
    sink: &mut S,
    config: &SessionConfig,
    started_at: &str,
) -> io::Result<()> {
    sink.append(&format!("MDT-{} Task: {}", config.task.label(), started_at))?;
    sink.append(&format!("Subject ID: {}", config.subject_id))?;
    if config.self_paced {
        sink.append("Trial Duration: Self paced by subject")?;
    } else {
        sink.append(&format!("Trial Duration: {:.2}", config.trial_duration_s))?;
    }
    sink.append(&format!("ISI: {:.2}", config.isi_s))?;
    match config.task {
        TaskKind::Temporal => sink.append(&format!("Blocks ran: {}", config.blocks))?,
        TaskKind::Object | TaskKind::Spatial => sink.append(&format!(
            "Trials/Condition: {}",
            config.trials_per_condition
        ))?,
    }
    sink.append(&format!("Task Variant: {}", config.variant))
}

/// Count table followed by ratio table.
pub fn write_scores<C: Condition, S: LogSink + ?Sized>(
    sink: &mut S,
    scorer: &Scorer<C>,
) -> io::Result<()> {
    sink.append("")?;
    sink.append("Scores:")?;
    for (condition, cell) in scorer.cells() {
        let label = condition.label();
        for (name, value) in [
            ("Correct", cell.correct),
            ("Incorrect", cell.incorrect),
            ("Responses", cell.responses),
        ] {
            sink.append(&format!("{:<20}{:>2}", format!("{label} {name}:"), value))?;
        }
    }
    sink.append("")?;
    for (condition, (correct, incorrect)) in scorer.ratios() {
        let label = condition.label();
        sink.append(&format!("{:<25}{:>2.2}", format!("Correct | {label}"), correct))?;
        sink.append(&format!("{:<25}{:>2.2}", format!("Incorrect | {label}"), incorrect))?;
    }
    Ok(())
}
