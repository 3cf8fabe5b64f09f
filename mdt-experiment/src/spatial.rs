//! Spatial task: each image reappears at test either where it was studied
//! or moved by a small, large or corner-to-corner distance.

use mdt_core::{AllocationError, CONDITION_COUNT, Category, Condition, Phase, StimulusFile};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{SessionConfig, TaskKind};
use crate::pool::StimulusPool;
use crate::presenter::{DisplayGeometry, Point, Presentation, Side};
use crate::task::{BlockPlan, LogRow, Task, split_even};

/// Upper bound on start/end redraws for one position pair.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Stimulus render size as a fraction of the display height.
const IMAGE_SIZE_DIVISOR: f64 = 6.0;

const PRACTICE_ROUNDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveClass {
    None,
    Small,
    Large,
    Corner,
}

impl MoveClass {
    /// Code written in the Type log column.
    pub fn code(self) -> &'static str {
        match self {
            MoveClass::None => "Same",
            MoveClass::Small => "Small",
            MoveClass::Large => "Large",
            MoveClass::Corner => "Crnr",
        }
    }
}

impl Condition for MoveClass {
    const ALL: [Self; CONDITION_COUNT] = [
        MoveClass::None,
        MoveClass::Small,
        MoveClass::Large,
        MoveClass::Corner,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            MoveClass::None => "Repeat",
            MoveClass::Small => "Small",
            MoveClass::Large => "Large",
            MoveClass::Corner => "Corners",
        }
    }
}

/// Usable interior of the display in bottom-left-origin pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub image_size: f64,
    width: f64,
    height: f64,
}

impl Arena {
    pub fn new(geometry: DisplayGeometry) -> Result<Self, AllocationError> {
        let image_size = geometry.height / IMAGE_SIZE_DIVISOR;
        let half = image_size / 2.0;
        let arena = Self {
            x1: half.floor(),
            x2: (geometry.width - half).ceil(),
            y1: half.floor(),
            y2: (geometry.height - half).ceil(),
            image_size,
            width: geometry.width,
            height: geometry.height,
        };
        if !(arena.x1 < arena.x2 && arena.y1 < arena.y2) {
            return Err(AllocationError::DegenerateGeometry {
                width: geometry.width,
                height: geometry.height,
                image_size,
            });
        }
        Ok(arena)
    }

    pub fn max_distance(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    /// Move length for `class`. Corner moves are fixed and have no radius.
    pub fn radius(&self, class: MoveClass) -> f64 {
        match class {
            MoveClass::None | MoveClass::Corner => 0.0,
            MoveClass::Small => (self.max_distance() / 4.0).floor(),
            MoveClass::Large => (self.max_distance() * 2.0 / 4.0).floor(),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }

    /// Inside the `image_size` square at any interior corner.
    pub fn near_corner(&self, x: f64, y: f64) -> bool {
        let d = self.image_size;
        let left = x <= self.x1 + d;
        let right = x >= self.x2 - d;
        let bottom = y <= self.y1 + d;
        let top = y >= self.y2 - d;
        (left || right) && (bottom || top)
    }

    /// Translates to centre-origin coordinates.
    pub fn centred(&self, x: f64, y: f64) -> Point {
        Point::new(x - self.width / 2.0, y - self.height / 2.0)
    }

    fn corners(&self) -> [(Point, Point); 4] {
        let (x1, x2, y1, y2) = (self.x1, self.x2, self.y1, self.y2);
        [
            (self.centred(x2, y2), self.centred(x1, y1)),
            (self.centred(x1, y2), self.centred(x2, y1)),
            (self.centred(x1, y1), self.centred(x2, y2)),
            (self.centred(x2, y1), self.centred(x1, y2)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionPair {
    pub start: Point,
    pub end: Point,
    pub class: MoveClass,
}

pub fn position_pair<R: Rng + ?Sized>(
    class: MoveClass,
    arena: &Arena,
    rng: &mut R,
) -> Result<PositionPair, AllocationError> {
    if class == MoveClass::Corner {
        let corners = arena.corners();
        let (start, end) = corners[rng.random_range(0..corners.len())];
        return Ok(PositionPair { start, end, class });
    }

    let radius = arena.radius(class);
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let x = rng.random_range(arena.x1 as i64..=arena.x2 as i64) as f64;
        let y = rng.random_range(arena.y1 as i64..=arena.y2 as i64) as f64;
        if arena.near_corner(x, y) {
            continue;
        }
        let angle = f64::from(rng.random_range(0..360u16)).to_radians();
        let end_x = x + radius * angle.cos();
        let end_y = y + radius * angle.sin();
        if !arena.contains(end_x, end_y) || arena.near_corner(end_x, end_y) {
            continue;
        }
        return Ok(PositionPair {
            start: arena.centred(x, y),
            end: arena.centred(end_x, end_y),
            class,
        });
    }
    Err(AllocationError::PlacementExhausted {
        class: class.label(),
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialItem {
    pub image: String,
    pub class: MoveClass,
    pub start: Point,
    pub end: Point,
}

/// Gives each group of images the move class at the same index.
fn place_groups<R: Rng + ?Sized>(
    groups: &[Vec<StimulusFile>],
    arena: &Arena,
    rng: &mut R,
) -> Result<Vec<SpatialItem>, AllocationError> {
    let mut items = Vec::new();
    for (group, class) in groups.iter().zip(MoveClass::ALL) {
        for image in group {
            let pair = position_pair(class, arena, rng)?;
            items.push(SpatialItem {
                image: image.name().to_string(),
                class,
                start: pair.start,
                end: pair.end,
            });
        }
    }
    Ok(items)
}

/// Shuffled targets cut into one block of `trials_per` images per class.
pub fn allocate<R: Rng + ?Sized>(
    targets: &[StimulusFile],
    trials_per: usize,
    geometry: DisplayGeometry,
    rng: &mut R,
) -> Result<Vec<SpatialItem>, AllocationError> {
    if trials_per == 0 {
        return Ok(Vec::new());
    }
    let needed = trials_per
        .checked_mul(CONDITION_COUNT)
        .ok_or(AllocationError::QuotaOverflow {
            count: trials_per,
            per: CONDITION_COUNT,
        })?;
    if targets.len() < needed {
        return Err(AllocationError::InsufficientStimuli {
            needed,
            available: targets.len(),
        });
    }
    let arena = Arena::new(geometry)?;
    let mut images = targets.to_vec();
    images.shuffle(rng);
    images.truncate(needed);

    let groups: Vec<Vec<StimulusFile>> = images.chunks(trials_per).map(<[_]>::to_vec).collect();
    let items = place_groups(&groups, &arena, rng)?;
    debug!(
        images = items.len(),
        small_radius = arena.radius(MoveClass::Small),
        large_radius = arena.radius(MoveClass::Large),
        "spatial allocation"
    );
    Ok(items)
}

fn phase_orders<R: Rng + ?Sized>(items: Vec<SpatialItem>, rng: &mut R) -> BlockPlan<SpatialItem> {
    let mut study = items.clone();
    let mut test = items;
    study.shuffle(rng);
    test.shuffle(rng);
    BlockPlan { study, test }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialTask;

impl Task for SpatialTask {
    type Condition = MoveClass;
    type Item = SpatialItem;

    fn kind(&self) -> TaskKind {
        TaskKind::Spatial
    }

    fn required_stimuli(&self, config: &SessionConfig) -> Vec<(Category, usize)> {
        let images = config.trials_per_condition.saturating_mul(CONDITION_COUNT);
        vec![(Category::Target, images)]
    }

    fn plan(
        &self,
        pool: &StimulusPool,
        config: &SessionConfig,
        geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<SpatialItem>>, AllocationError> {
        let items = allocate(pool.get(Category::Target), config.trials_per_condition, geometry, rng)?;
        let block = phase_orders(items, rng);
        info!(trials = block.test.len(), "spatial trials allocated");
        Ok(vec![block])
    }

    fn practice_rounds(
        &self,
        practice: &[StimulusFile],
        geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<SpatialItem>>, AllocationError> {
        let arena = Arena::new(geometry)?;
        let mut images = practice.to_vec();
        images.shuffle(rng);

        let mut rounds = Vec::new();
        for round in split_even(&images, PRACTICE_ROUNDS) {
            if round.is_empty() {
                continue;
            }
            let groups = split_even(&round, CONDITION_COUNT);
            let items = place_groups(&groups, &arena, rng)?;
            rounds.push(phase_orders(items, rng));
        }
        Ok(rounds)
    }

    fn presentation(&self, item: &SpatialItem, phase: Phase) -> Presentation {
        let at = match phase {
            Phase::Study => item.start,
            Phase::Test => item.end,
        };
        Presentation::Positioned {
            image: item.image.clone(),
            at,
        }
    }

    fn condition(&self, item: &SpatialItem) -> Option<MoveClass> {
        Some(item.class)
    }

    fn expected(&self, item: &SpatialItem, phase: Phase) -> Option<Side> {
        match (phase, item.class) {
            (Phase::Study, _) => None,
            (Phase::Test, MoveClass::None) => Some(Side::Left),
            (Phase::Test, _) => Some(Side::Right),
        }
    }

    fn item_label(&self, item: &SpatialItem) -> String {
        item.class.code().to_string()
    }

    fn instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        match phase {
            Phase::Study => format!(
                "In the following phase, a sequence of images will be shown.\n\n\
                 -Press '{}' if the image is of an indoor object.\n\n\
                 -Press '{}' if the image is of an outdoor object.\n\n\n\
                 Press '{}' to begin",
                config.left_key, config.right_key, config.pause_key
            ),
            Phase::Test => format!(
                "In the following phase, another sequence of images will be shown.\n\n\
                 -Press '{}' if the image is in the same location as it was in the last phase.\n\n\
                 -Press '{}' if the image is in a different location than it was in the last phase.\n\n\n\
                 Press '{}' to begin",
                config.left_key, config.right_key, config.pause_key
            ),
        }
    }

    fn practice_instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        match phase {
            Phase::Study => format!("Outdoor or Indoor? ('{}' to continue)", config.pause_key),
            Phase::Test => format!("Same or different? ('{}' to continue)", config.pause_key),
        }
    }

    fn header(&self, _phase: Phase) -> String {
        format!(
            "{:<22}{:<12}{:<14}{:<11}{:<9}{:<8}{}",
            "Image", "Type", "Start", "End", "Correct", "Resp", "RT"
        )
    }

    fn row(&self, row: &LogRow<'_, SpatialItem>) -> String {
        let item = row.item;
        format!(
            "{:<22}{:<9}{:<14}{:<17}{:<7}{:<6}{:>0.3}",
            item.image,
            item.class.code(),
            item.start,
            item.end,
            row.expected_key,
            row.response,
            row.reaction_time_s
        )
    }
}
