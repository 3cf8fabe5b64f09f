//! Temporal task: a studied sequence is tested with image pairs whose
//! distance in the sequence falls in one of four bands, and the subject
//! reports which of the two came first.

use std::ops::RangeInclusive;

use mdt_core::{AllocationError, CONDITION_COUNT, Category, Condition, Phase, StimulusFile};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::{SessionConfig, TaskKind};
use crate::pool::StimulusPool;
use crate::presenter::{DisplayGeometry, Presentation, Side};
use crate::task::{BlockPlan, LogRow, Task, split_even};

pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Sequence positions are allocated in groups of eight: two per class.
const BLOCK_GRANULARITY: usize = 8;

const PRACTICE_ROUNDS: usize = 3;
const PRACTICE_ROUND_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DistanceClass {
    Adjacent,
    Mid1,
    Mid2,
    Edge,
}

impl DistanceClass {
    /// Allowed index distances for the spaced classes. Edge pairs are
    /// positional instead.
    pub fn band(self) -> Option<RangeInclusive<usize>> {
        match self {
            DistanceClass::Adjacent => Some(1..=1),
            DistanceClass::Mid1 => Some(7..=9),
            DistanceClass::Mid2 => Some(15..=17),
            DistanceClass::Edge => None,
        }
    }

    /// Number written in the TType log column.
    pub fn code(self) -> u8 {
        self as u8 + 1
    }

    const SPACED: [DistanceClass; 3] = [
        DistanceClass::Adjacent,
        DistanceClass::Mid1,
        DistanceClass::Mid2,
    ];
}

impl Condition for DistanceClass {
    const ALL: [Self; CONDITION_COUNT] = [
        DistanceClass::Adjacent,
        DistanceClass::Mid1,
        DistanceClass::Mid2,
        DistanceClass::Edge,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            DistanceClass::Adjacent => "Adjacent",
            DistanceClass::Mid1 => "Eight",
            DistanceClass::Mid2 => "Sixteen",
            DistanceClass::Edge => "PR",
        }
    }
}

/// Two sequence positions, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequencePair {
    pub first: usize,
    pub second: usize,
    pub class: DistanceClass,
}

/// Finds the lowest unused index with an unused partner inside `band`.
/// The search starts at a random distance and walks down, wrapping to the
/// band maximum, until the whole band has been tried.
fn split_range<R: Rng + ?Sized>(
    used: &mut [bool],
    band: &RangeInclusive<usize>,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let (min, max) = (*band.start(), *band.end());
    for i in 0..used.len() {
        if used[i] {
            continue;
        }
        let start = rng.random_range(min..=max);
        let mut added = start;
        loop {
            let j = i + added;
            if j < used.len() && !used[j] {
                used[i] = true;
                used[j] = true;
                return Some((i, j));
            }
            added = if added > min { added - 1 } else { max };
            if added == start {
                break;
            }
        }
    }
    None
}

fn attempt_split<R: Rng + ?Sized>(num_stim: usize, rng: &mut R) -> Option<Vec<SequencePair>> {
    let trials_per = num_stim / BLOCK_GRANULARITY;
    let mut used = vec![false; num_stim];

    let mut starts: Vec<usize> = (0..trials_per).collect();
    let mut ends: Vec<usize> = (num_stim - trials_per..num_stim).collect();
    starts.shuffle(rng);
    ends.shuffle(rng);

    let mut pairs = Vec::with_capacity(num_stim / 2);
    for (&first, &second) in starts.iter().zip(&ends) {
        used[first] = true;
        used[second] = true;
        pairs.push(SequencePair {
            first,
            second,
            class: DistanceClass::Edge,
        });
    }

    let mut schedule: Vec<usize> = (0..trials_per * 3).collect();
    schedule.shuffle(rng);

    let mut spaced = Vec::with_capacity(trials_per * 3);
    for slot in schedule {
        let class = DistanceClass::SPACED[slot % 3];
        let band = class.band()?;
        let (first, second) = split_range(&mut used, &band, rng)?;
        spaced.push(SequencePair {
            first,
            second,
            class,
        });
    }
    spaced.shuffle(rng);
    pairs.extend(spaced);
    Some(pairs)
}

/// Pairs every position of a `num_stim` sequence: `num_stim / 8` pairs per
/// class, Edge pairs first. Failed attempts are discarded whole and retried
/// up to `max_attempts` times.
pub fn create_pairs_spaced<R: Rng + ?Sized>(
    num_stim: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<SequencePair>, AllocationError> {
    if num_stim == 0 || num_stim % BLOCK_GRANULARITY != 0 {
        return Err(AllocationError::InvalidBlockSize { num_stim });
    }
    for attempt in 1..=max_attempts {
        if let Some(pairs) = attempt_split(num_stim, rng) {
            debug!(num_stim, attempt, "sequence pairs placed");
            return Ok(pairs);
        }
        trace!(attempt, "sequence split failed");
    }
    Err(AllocationError::AttemptsExhausted {
        attempts: max_attempts,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemporalItem {
    Study {
        position: usize,
        image: String,
    },
    Test {
        class: DistanceClass,
        left: usize,
        right: usize,
        left_image: String,
        right_image: String,
    },
}

impl TemporalItem {
    fn test(class: DistanceClass, images: &[StimulusFile], left: usize, right: usize) -> Self {
        TemporalItem::Test {
            class,
            left,
            right,
            left_image: images[left].name().to_string(),
            right_image: images[right].name().to_string(),
        }
    }
}

fn study_items(images: &[StimulusFile]) -> Vec<TemporalItem> {
    images
        .iter()
        .enumerate()
        .map(|(position, image)| TemporalItem::Study {
            position,
            image: image.name().to_string(),
        })
        .collect()
}

/// Half the pairs, chosen by the parity of a shuffled permutation, are
/// shown with the later image on the left.
fn test_items<R: Rng + ?Sized>(
    images: &[StimulusFile],
    pairs: &[SequencePair],
    rng: &mut R,
) -> Vec<TemporalItem> {
    let mut sides: Vec<usize> = (0..pairs.len()).collect();
    sides.shuffle(rng);
    pairs
        .iter()
        .zip(sides)
        .map(|(pair, side)| {
            let (left, right) = if side % 2 == 0 {
                (pair.first, pair.second)
            } else {
                (pair.second, pair.first)
            };
            TemporalItem::test(pair.class, images, left, right)
        })
        .collect()
}

fn practice_pairs<R: Rng + ?Sized>(rng: &mut R) -> Vec<(usize, usize, DistanceClass)> {
    let adjacent = if rng.random_bool(0.5) { (0, 1) } else { (1, 2) };
    let mut pairs: Vec<_> = [
        (0, 3, DistanceClass::Edge),
        (0, 2, DistanceClass::Mid1),
        (1, 3, DistanceClass::Mid1),
        (adjacent.0, adjacent.1, DistanceClass::Adjacent),
    ]
    .into_iter()
    .map(|(a, b, class)| if rng.random_bool(0.5) { (b, a, class) } else { (a, b, class) })
    .collect();
    pairs.shuffle(rng);
    pairs
}

#[derive(Debug, Clone, Copy)]
pub struct TemporalTask {
    pub max_attempts: usize,
}

impl Default for TemporalTask {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Task for TemporalTask {
    type Condition = DistanceClass;
    type Item = TemporalItem;

    fn kind(&self) -> TaskKind {
        TaskKind::Temporal
    }

    fn required_stimuli(&self, config: &SessionConfig) -> Vec<(Category, usize)> {
        let images = config.blocks.saturating_mul(config.stimuli_per_block);
        vec![(Category::Target, images)]
    }

    fn plan(
        &self,
        pool: &StimulusPool,
        config: &SessionConfig,
        _geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<TemporalItem>>, AllocationError> {
        let num_stim = config.stimuli_per_block;
        if num_stim == 0 || num_stim % BLOCK_GRANULARITY != 0 {
            return Err(AllocationError::InvalidBlockSize { num_stim });
        }
        let targets = pool.get(Category::Target);
        let needed = num_stim
            .checked_mul(config.blocks)
            .ok_or(AllocationError::QuotaOverflow {
                count: config.blocks,
                per: num_stim,
            })?;
        if targets.len() < needed {
            return Err(AllocationError::InsufficientStimuli {
                needed,
                available: targets.len(),
            });
        }
        let mut images = targets.to_vec();
        images.shuffle(rng);
        images.truncate(needed);

        let mut blocks = Vec::with_capacity(config.blocks);
        for block in images.chunks(num_stim) {
            let pairs = create_pairs_spaced(num_stim, self.max_attempts, rng)?;
            blocks.push(BlockPlan {
                study: study_items(block),
                test: test_items(block, &pairs, rng),
            });
        }
        info!(blocks = blocks.len(), num_stim, "temporal blocks allocated");
        Ok(blocks)
    }

    fn practice_rounds(
        &self,
        practice: &[StimulusFile],
        _geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<TemporalItem>>, AllocationError> {
        let mut images = practice.to_vec();
        images.shuffle(rng);

        let mut rounds = Vec::with_capacity(PRACTICE_ROUNDS);
        for (i, mut round) in split_even(&images, PRACTICE_ROUNDS).into_iter().enumerate() {
            if round.len() != PRACTICE_ROUND_SIZE {
                return Err(AllocationError::PracticeRoundSize {
                    round: i + 1,
                    expected: PRACTICE_ROUND_SIZE,
                    found: round.len(),
                });
            }
            round.shuffle(rng);
            let test = practice_pairs(rng)
                .into_iter()
                .map(|(left, right, class)| TemporalItem::test(class, &round, left, right))
                .collect();
            rounds.push(BlockPlan {
                study: study_items(&round),
                test,
            });
        }
        Ok(rounds)
    }

    fn presentation(&self, item: &TemporalItem, _phase: Phase) -> Presentation {
        match item {
            TemporalItem::Study { image, .. } => Presentation::Centered {
                image: image.clone(),
            },
            TemporalItem::Test {
                left_image,
                right_image,
                ..
            } => Presentation::SideBySide {
                left: left_image.clone(),
                right: right_image.clone(),
            },
        }
    }

    fn condition(&self, item: &TemporalItem) -> Option<DistanceClass> {
        match item {
            TemporalItem::Study { .. } => None,
            TemporalItem::Test { class, .. } => Some(*class),
        }
    }

    fn expected(&self, item: &TemporalItem, _phase: Phase) -> Option<Side> {
        match item {
            TemporalItem::Study { .. } => None,
            TemporalItem::Test { left, right, .. } if left < right => Some(Side::Left),
            TemporalItem::Test { .. } => Some(Side::Right),
        }
    }

    fn item_label(&self, item: &TemporalItem) -> String {
        match item {
            TemporalItem::Study { position, .. } => position.to_string(),
            TemporalItem::Test { class, .. } => class.code().to_string(),
        }
    }

    fn instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        match phase {
            Phase::Study => format!(
                "Are the following objects indoor or outdoor?\n\n('{}' to continue)",
                config.pause_key
            ),
            Phase::Test => format!(
                "In this phase, the same series of objects will be shown\n\n\
                 Which came first: Left or Right?\n\n('{}' to continue)",
                config.pause_key
            ),
        }
    }

    fn practice_instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        match phase {
            Phase::Study => format!("Indoor or Outdoor?\n\n('{}' to continue)", config.pause_key),
            Phase::Test => format!(
                "Which came first? Left or right? ('{}' to continue)",
                config.pause_key
            ),
        }
    }

    fn numbered_blocks(&self) -> bool {
        true
    }

    fn header(&self, phase: Phase) -> String {
        match phase {
            Phase::Study => format!("{:<6}{:<23}{:<10}{}", "Trial", "Image", "Response", "RT"),
            Phase::Test => format!(
                "{:<7}{:<7}{:<23}{:<23}{:<7}{:<7}{:<10}{:<7}{}",
                "Trial", "TType", "LeftImage", "RightImage", "LNum", "RNum", "CorResp", "Resp", "RT"
            ),
        }
    }

    fn row(&self, row: &LogRow<'_, TemporalItem>) -> String {
        match row.item {
            TemporalItem::Study { image, .. } => format!(
                "{:^5}{:<23}{:^11}{:<1.3}",
                row.trial, image, row.response, row.reaction_time_s
            ),
            TemporalItem::Test {
                class,
                left,
                right,
                left_image,
                right_image,
            } => format!(
                "{:^5}{:^9}{:<23}{:<23}{:<7}{:<10}{:<8}{:<6}{:<1.3}",
                row.trial,
                class.code(),
                left_image,
                right_image,
                left,
                right,
                row.expected_key,
                row.response,
                row.reaction_time_s
            ),
        }
    }
}
