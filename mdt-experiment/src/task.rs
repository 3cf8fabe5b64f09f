use std::fmt::Debug;

use mdt_core::{AllocationError, Category, Condition, Phase, StimulusFile};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::{SessionConfig, TaskKind};
use crate::pool::StimulusPool;
use crate::presenter::{DisplayGeometry, Presentation, Side};

/// Ordered study and test trials of one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockPlan<I> {
    pub study: Vec<I>,
    pub test: Vec<I>,
}

impl<I> BlockPlan<I> {
    pub fn phase(&self, phase: Phase) -> &[I] {
        match phase {
            Phase::Study => &self.study,
            Phase::Test => &self.test,
        }
    }
}

/// Everything a variant needs to format one log row.
#[derive(Debug)]
pub struct LogRow<'a, I> {
    pub trial: usize,
    pub item: &'a I,
    pub phase: Phase,
    pub expected_key: &'a str,
    pub response: &'a str,
    pub reaction_time_s: f64,
}

/// A task variant: how it allocates stimuli to conditions, what each trial
/// shows and expects, and how its log is laid out. The session driver is
/// generic over this trait.
pub trait Task {
    type Condition: Condition;
    type Item: Clone + Debug + Serialize;

    fn kind(&self) -> TaskKind;

    /// Minimum number of files per category `plan` draws from under
    /// `config`, checked when the pool is loaded.
    fn required_stimuli(&self, config: &SessionConfig) -> Vec<(Category, usize)>;

    /// Allocates and orders every block of the session.
    fn plan(
        &self,
        pool: &StimulusPool,
        config: &SessionConfig,
        geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<Self::Item>>, AllocationError>;

    /// Practice rounds built from the `Practice` images, run in order.
    fn practice_rounds(
        &self,
        practice: &[StimulusFile],
        geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<Self::Item>>, AllocationError>;

    fn presentation(&self, item: &Self::Item, phase: Phase) -> Presentation;

    /// Score-table condition, or `None` for items that are never scored.
    fn condition(&self, item: &Self::Item) -> Option<Self::Condition>;

    /// Correct response side; `None` when any response is acceptable.
    fn expected(&self, item: &Self::Item, phase: Phase) -> Option<Side>;

    /// Short trial-type label for logs and exported records.
    fn item_label(&self, item: &Self::Item) -> String;

    fn instructions(&self, phase: Phase, config: &SessionConfig) -> String;

    /// Short prompt before each phase of a practice round.
    fn practice_instructions(&self, phase: Phase, config: &SessionConfig) -> String;

    /// Captions of the two response choices, left then right, on the ECog
    /// response screen.
    fn choice_labels(&self, _phase: Phase) -> [&'static str; 2] {
        ["Left", "Right"]
    }

    /// Whether phase banners carry the block number.
    fn numbered_blocks(&self) -> bool {
        false
    }

    fn header(&self, phase: Phase) -> String;

    fn row(&self, row: &LogRow<'_, Self::Item>) -> String;
}

/// Splits `items` into `parts` runs whose lengths differ by at most one,
/// longer runs first.
pub fn split_even<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    if parts == 0 {
        return Vec::new();
    }
    let base = items.len() / parts;
    let extra = items.len() % parts;
    let mut out = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        out.push(items[start..start + len].to_vec());
        start += len;
    }
    out
}
