use std::fmt;
use std::time::Duration;

use mdt_core::{Category, KeyPress, Phase, Scorer, TrialRecord, pair_seed};
use mdt_timing::Timer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{
    ECOG_ISI, ECOG_ITI_MS, ECOG_RESPONSE_WINDOW, ECOG_STUDY_DURATION, ECOG_TEST_DURATION,
    ESCAPE_KEY, SessionConfig, Variant,
};
use crate::error::{Result, SessionError};
use crate::log::{LogSink, write_header, write_scores};
use crate::pool::StimulusPool;
use crate::presenter::{Presentation, Presenter, ResponseWindow, Side};
use crate::task::{BlockPlan, LogRow, Task};

/// A practice round passes, ending practice, above this fraction correct.
pub const PRACTICE_PASS_RATIO: f64 = 0.6;

/// Where in the session the driver is; reported when the subject escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Welcome,
    Practice(usize),
    Study(usize),
    Test(usize),
}

impl Stage {
    fn of(phase: Phase, practice: bool, block: usize) -> Self {
        match (practice, phase) {
            (true, _) => Stage::Practice(block),
            (false, Phase::Study) => Stage::Study(block),
            (false, Phase::Test) => Stage::Test(block),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Welcome => write!(f, "welcome"),
            Stage::Practice(round) => write!(f, "practice round {round}"),
            Stage::Study(block) => write!(f, "study block {block}"),
            Stage::Test(block) => write!(f, "test block {block}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOutcome<C: mdt_core::Condition> {
    pub seed: u64,
    pub scores: Scorer<C>,
    pub practice_ratios: Vec<f64>,
}

/// Runs one session of a task variant against a presenter and a log sink.
pub struct Session<T, P, S, Tm>
where
    T: Task,
    P: Presenter,
    S: LogSink,
    Tm: Timer,
{
    pub task: T,
    pub config: SessionConfig,
    pub presenter: P,
    pub sink: S,
    pub timer: Tm,
    /// Every trial run so far, practice included. Kept after an escape.
    pub records: Vec<TrialRecord>,
}

impl<T, P, S, Tm> Session<T, P, S, Tm>
where
    T: Task,
    P: Presenter,
    S: LogSink,
    Tm: Timer,
{
    pub fn new(task: T, config: SessionConfig, presenter: P, sink: S, timer: Tm) -> Self {
        Self {
            task,
            config,
            presenter,
            sink,
            timer,
            records: Vec::new(),
        }
    }

    /// Plans and runs the whole session. The sink is closed on every path;
    /// scores are written only when every block ran to completion.
    pub fn run(
        &mut self,
        pool: &StimulusPool,
        started_at: &str,
    ) -> Result<SessionOutcome<T::Condition>> {
        self.records.clear();
        let result = self.run_blocks(pool, started_at);
        let closed = self.sink.close();
        match &result {
            Ok(_) => info!(trials = self.records.len(), "session complete"),
            Err(err) if err.is_termination() => warn!(%err, "session ended early"),
            Err(err) => error!(%err, "session failed"),
        }
        let outcome = result?;
        closed?;
        Ok(outcome)
    }

    fn run_blocks(
        &mut self,
        pool: &StimulusPool,
        started_at: &str,
    ) -> Result<SessionOutcome<T::Condition>> {
        self.config.validate()?;
        write_header(&mut self.sink, &self.config, started_at)?;

        let seed = pair_seed(self.config.subject_id, self.config.subset);
        let mut rng = StdRng::seed_from_u64(seed);
        info!(
            task = %self.task.kind(),
            subject = self.config.subject_id,
            subset = self.config.subset,
            seed,
            "session seeded"
        );

        // Main blocks are planned before practice so practice never shifts
        // the allocation a seed produces.
        let geometry = self.presenter.geometry();
        let blocks = match self.task.plan(pool, &self.config, geometry, &mut rng) {
            Ok(blocks) => blocks,
            Err(err) => {
                self.sink.append("")?;
                self.sink.append(&format!("Allocation failed: {err}"))?;
                return Err(err.into());
            }
        };

        self.welcome()?;

        let mut practice_ratios = Vec::new();
        let practice = pool.get(Category::Practice);
        if self.config.practice && !practice.is_empty() {
            match self.task.practice_rounds(practice, geometry, &mut rng) {
                Ok(rounds) => practice_ratios = self.run_practice(&rounds, &mut rng)?,
                Err(err) => {
                    warn!(%err, "practice skipped");
                    self.sink.append("")?;
                    self.sink.append(&format!("Practice skipped: {err}"))?;
                }
            }
        }

        let mut scores = Scorer::new();
        for (i, block) in blocks.iter().enumerate() {
            let number = i + 1;
            let mut phase = Some(Phase::Study);
            while let Some(current) = phase {
                self.prompt_phase(current, number)?;
                self.run_phase(
                    current,
                    false,
                    number,
                    block.phase(current),
                    Some(&mut scores),
                    &mut rng,
                )?;
                phase = current.next();
            }
            debug!(block = number, responses = scores.total_responses(), "block done");
        }

        write_scores(&mut self.sink, &scores)?;
        Ok(SessionOutcome {
            seed,
            scores,
            practice_ratios,
        })
    }

    fn welcome(&mut self) -> Result<()> {
        let pause = self.config.pause_key.as_str();
        self.presenter.show_message(&format!(
            "MDT-{} Task\n\nPress '{pause}' to begin",
            self.task.kind()
        ));
        if self.presenter.wait_for_key(&[pause, ESCAPE_KEY]) == ESCAPE_KEY {
            self.sink.append("")?;
            self.sink.append("Terminated early.")?;
            return Err(SessionError::Terminated {
                stage: Stage::Welcome,
            });
        }
        Ok(())
    }

    /// Runs rounds until one passes. Returns the fraction correct per round.
    fn run_practice(
        &mut self,
        rounds: &[BlockPlan<T::Item>],
        rng: &mut StdRng,
    ) -> Result<Vec<f64>> {
        let mut ratios = Vec::with_capacity(rounds.len());
        for (i, round) in rounds.iter().enumerate() {
            let number = i + 1;
            let pause = self.config.pause_key.as_str();
            self.presenter
                .show_message(&format!("Let's practice\n\n('{pause}' to continue)"));
            if self.presenter.wait_for_key(&[pause, ESCAPE_KEY]) == ESCAPE_KEY {
                return self.terminate(Stage::Practice(number), "Practice terminated early");
            }

            self.practice_prompt(Phase::Study, number)?;
            self.run_phase(Phase::Study, true, number, &round.study, None, rng)?;
            self.practice_prompt(Phase::Test, number)?;
            let correct = self.run_phase(Phase::Test, true, number, &round.test, None, rng)?;
            let ratio = if round.test.is_empty() {
                0.0
            } else {
                correct as f64 / round.test.len() as f64
            };
            ratios.push(ratio);
            info!(round = number, ratio, "practice round finished");

            let pause = self.config.pause_key.as_str();
            self.presenter.show_message(&format!(
                "You got {}% correct! ('{pause}' to continue)",
                (ratio * 100.0) as u32
            ));
            self.presenter.wait_for_key(&[pause]);
            if ratio > PRACTICE_PASS_RATIO {
                break;
            }
        }
        Ok(ratios)
    }

    fn practice_prompt(&mut self, phase: Phase, round: usize) -> Result<()> {
        let text = self.task.practice_instructions(phase, &self.config);
        self.presenter.show_message(&text);
        let pause = self.config.pause_key.as_str();
        if self.presenter.wait_for_key(&[pause, ESCAPE_KEY]) == ESCAPE_KEY {
            return self.terminate(Stage::Practice(round), "Practice terminated early");
        }
        Ok(())
    }

    fn prompt_phase(&mut self, phase: Phase, block: usize) -> Result<()> {
        let text = self.task.instructions(phase, &self.config);
        self.presenter.show_message(&text);
        let pause = self.config.pause_key.as_str();
        if self.presenter.wait_for_key(&[pause, ESCAPE_KEY]) == ESCAPE_KEY {
            let marker = format!("{} Not Run", phase.label());
            return self.terminate(Stage::of(phase, false, block), &marker);
        }
        Ok(())
    }

    fn terminate<R>(&mut self, stage: Stage, marker: &str) -> Result<R> {
        self.sink.append("")?;
        self.sink.append(marker)?;
        Err(SessionError::Terminated { stage })
    }

    /// Presents every item of one phase. Returns how many scored trials
    /// were answered correctly.
    fn run_phase(
        &mut self,
        phase: Phase,
        practice: bool,
        block: usize,
        items: &[T::Item],
        mut scores: Option<&mut Scorer<T::Condition>>,
        rng: &mut StdRng,
    ) -> Result<usize> {
        let label = phase.label();
        let banner = match (practice, self.task.numbered_blocks()) {
            (true, _) => format!("Begin Practice {label} {block}"),
            (false, true) => format!("Begin {label} {block}"),
            (false, false) => format!("Begin {label}"),
        };
        self.sink.append("")?;
        self.sink.append(&banner)?;
        self.sink.append(&self.task.header(phase))?;

        // Practice keeps the plain trial flow in every variant.
        let ecog = !practice && self.config.variant == Variant::ECog;
        let mut correct = 0;

        for (i, item) in items.iter().enumerate() {
            let trial = i + 1;
            let press = if ecog {
                self.ecog_trial(item, phase, rng)
            } else {
                self.plain_trial(item, phase)
            };

            let (key, reaction_time_s) = match &press {
                Some(press) => (press.key.as_str(), press.reaction_time.as_secs_f64()),
                None => ("", 0.0),
            };
            if key == ESCAPE_KEY {
                self.sink.append("")?;
                self.sink.append(&format!("{label} terminated early"))?;
                return Err(SessionError::Terminated {
                    stage: Stage::of(phase, practice, block),
                });
            }

            let paused = key == self.config.pause_key;
            let expected = self
                .task
                .expected(item, phase)
                .map(|side| self.config.key_for(side));
            self.sink.append(&self.task.row(&LogRow {
                trial,
                item,
                phase,
                expected_key: expected.unwrap_or(""),
                response: key,
                reaction_time_s,
            }))?;

            let response = (press.is_some() && !paused).then_some(key);
            let condition = self.task.condition(item);
            if phase.is_scored() {
                if let (Some(condition), Some(expected)) = (condition, expected) {
                    if let Some(scores) = scores.as_deref_mut() {
                        scores.record(condition, response, expected);
                    }
                    if response == Some(expected) {
                        correct += 1;
                    }
                }
            }

            self.records.push(TrialRecord {
                phase,
                practice,
                block,
                trial,
                stimulus: self.task.presentation(item, phase).images().join(" | "),
                condition: self.task.item_label(item),
                expected: expected.map(str::to_string),
                response: response.map(str::to_string),
                reaction_time_s,
                paused,
            });

            if paused {
                let pause = self.config.pause_key.as_str();
                debug!(trial, "paused");
                self.presenter
                    .show_message(&format!("Experiment Paused\n\nPress '{pause}' to continue"));
                self.presenter.wait_for_key(&[pause]);
            }
        }
        Ok(correct)
    }

    fn plain_trial(&mut self, item: &T::Item, phase: Phase) -> Option<KeyPress> {
        let keys = self.config.trial_keys();
        self.presenter.present(&self.task.presentation(item, phase));
        let press = self
            .presenter
            .wait_for_response(&keys, self.config.response_window());
        self.presenter.blank();
        self.timer.sleep(self.config.isi());
        press
    }

    /// Marked stimulus for a fixed time, a blank gap, then a two-button
    /// choice screen with a fixed window and a jittered inter-trial blank.
    fn ecog_trial(&mut self, item: &T::Item, phase: Phase, rng: &mut StdRng) -> Option<KeyPress> {
        let shown_for = match phase {
            Phase::Study => ECOG_STUDY_DURATION,
            Phase::Test => ECOG_TEST_DURATION,
        };
        self.presenter
            .present(&self.task.presentation(item, phase).marked());
        self.timer.sleep(shown_for);
        self.presenter.blank();
        self.timer.sleep(ECOG_ISI);

        let [left, right] = self.task.choice_labels(phase);
        self.presenter.present(&Presentation::Choice {
            left: format!("{left}\n\n{}", self.config.key_for(Side::Left)),
            right: format!("{right}\n\n{}", self.config.key_for(Side::Right)),
        });
        let keys = self.config.trial_keys();
        let press = self
            .presenter
            .wait_for_response(&keys, ResponseWindow::Fixed(ECOG_RESPONSE_WINDOW));
        self.presenter.blank();
        let iti = Duration::from_millis(rng.random_range(ECOG_ITI_MS));
        debug!(?iti, "inter-trial interval");
        self.timer.sleep(iti);
        press
    }
}
