//! Object task: target/lure similarity pairs plus repeat/foil singles.
//!
//! Study shows every pair's target and every repeat single; test shows every
//! pair's lure and all singles. Only repeats were actually seen before, so
//! the correct test answer is "old" (left) for repeats and "new" (right) for
//! lures and foils.

use mdt_core::{
    AllocationError, CONDITION_COUNT, Category, Condition, Phase, StimulusFile,
};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ECOG_KEYS, SessionConfig, TaskKind, Variant};
use crate::pool::StimulusPool;
use crate::presenter::{DisplayGeometry, Presentation, Side};
use crate::task::{BlockPlan, LogRow, Task};

const PRACTICE_ROUNDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LureBin {
    High,
    Low,
}

impl LureBin {
    pub fn label(self) -> &'static str {
        match self {
            LureBin::High => "high",
            LureBin::Low => "low",
        }
    }

    pub fn condition(self) -> ObjectCondition {
        match self {
            LureBin::High => ObjectCondition::LureHigh,
            LureBin::Low => ObjectCondition::LureLow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LurePair {
    pub target: StimulusFile,
    pub lure: StimulusFile,
    pub bin: LureBin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Repeat,
    Foil,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleAssignment {
    pub stimulus: StimulusFile,
    pub role: Role,
}

/// Which unselected pairs feed the singles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LeftoverStart {
    /// Legacy layout: the first unselected pair of each bin is skipped, the
    /// walk stops where the high bin ends and dedicated single images are
    /// never used.
    #[default]
    SkipOne,
    /// Every pair of either bin not selected for the lure quota, followed
    /// by any dedicated single images.
    AfterQuota,
}

impl LeftoverStart {
    fn first_index(self, trials_per: usize) -> usize {
        match self {
            LeftoverStart::SkipOne => trials_per.saturating_add(1),
            LeftoverStart::AfterQuota => trials_per,
        }
    }

    fn end_index(self, high_pairs: usize, low_pairs: usize) -> usize {
        match self {
            LeftoverStart::SkipOne => high_pairs,
            LeftoverStart::AfterQuota => high_pairs.max(low_pairs),
        }
    }

    fn uses_single_files(self) -> bool {
        matches!(self, LeftoverStart::AfterQuota)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectAllocation {
    pub lures: Vec<LurePair>,
    pub singles: Vec<SingleAssignment>,
}

/// Pairs consecutive files of a name-sorted bin. A trailing odd file is
/// left out.
pub fn pair_consecutive(files: &[StimulusFile], bin: LureBin) -> Vec<LurePair> {
    if files.len() % 2 == 1 {
        warn!(
            bin = bin.label(),
            file = %files[files.len() - 1],
            "odd number of lure images, last one is unpaired"
        );
    }
    files
        .chunks_exact(2)
        .map(|pair| LurePair {
            target: pair[0].clone(),
            lure: pair[1].clone(),
            bin,
        })
        .collect()
}

/// Selects `trials_per` pairs from each bin and returns them shuffled,
/// together with the target halves of the unselected pairs.
pub fn split_lures<R: Rng + ?Sized>(
    high: &[StimulusFile],
    low: &[StimulusFile],
    trials_per: usize,
    leftover_start: LeftoverStart,
    rng: &mut R,
) -> Result<(Vec<LurePair>, Vec<StimulusFile>), AllocationError> {
    let mut high_pairs = pair_consecutive(high, LureBin::High);
    let mut low_pairs = pair_consecutive(low, LureBin::Low);
    high_pairs.shuffle(rng);
    low_pairs.shuffle(rng);

    for (bin, pairs) in [(LureBin::High, &high_pairs), (LureBin::Low, &low_pairs)] {
        if pairs.len() < trials_per {
            return Err(AllocationError::InsufficientPairs {
                bin: bin.label(),
                needed: trials_per,
                available: pairs.len(),
            });
        }
    }

    let mut selected: Vec<LurePair> = high_pairs[..trials_per]
        .iter()
        .zip(&low_pairs[..trials_per])
        .flat_map(|(high, low)| [high.clone(), low.clone()])
        .collect();

    let mut leftovers = Vec::new();
    let end = leftover_start.end_index(high_pairs.len(), low_pairs.len());
    for i in leftover_start.first_index(trials_per)..end {
        if let Some(pair) = high_pairs.get(i) {
            leftovers.push(pair.target.clone());
        }
        if let Some(pair) = low_pairs.get(i) {
            leftovers.push(pair.target.clone());
        }
    }

    selected.shuffle(rng);
    Ok((selected, leftovers))
}

/// Alternates the first `2 * trials_per` leftovers between repeat and foil,
/// then shuffles.
pub fn split_singles<R: Rng + ?Sized>(
    leftovers: &[StimulusFile],
    trials_per: usize,
    rng: &mut R,
) -> Result<Vec<SingleAssignment>, AllocationError> {
    let needed = trials_per
        .checked_mul(2)
        .ok_or(AllocationError::QuotaOverflow {
            count: trials_per,
            per: 2,
        })?;
    if leftovers.len() < needed {
        return Err(AllocationError::InsufficientSingles {
            needed,
            available: leftovers.len(),
        });
    }
    let mut singles: Vec<SingleAssignment> = leftovers[..needed]
        .iter()
        .enumerate()
        .map(|(i, stimulus)| SingleAssignment {
            stimulus: stimulus.clone(),
            role: if i % 2 == 0 { Role::Repeat } else { Role::Foil },
        })
        .collect();
    singles.shuffle(rng);
    Ok(singles)
}

/// Lure pairs first, then singles from the leftover targets, followed by
/// any dedicated single images when `leftover_start` takes them.
pub fn allocate<R: Rng + ?Sized>(
    pool: &StimulusPool,
    trials_per: usize,
    leftover_start: LeftoverStart,
    rng: &mut R,
) -> Result<ObjectAllocation, AllocationError> {
    let (lures, mut leftovers) = split_lures(
        pool.get(Category::LureHigh),
        pool.get(Category::LureLow),
        trials_per,
        leftover_start,
        rng,
    )?;
    if leftover_start.uses_single_files() {
        leftovers.extend(pool.get(Category::Single).iter().cloned());
    }
    let singles = split_singles(&leftovers, trials_per, rng)?;
    debug!(
        pairs = lures.len(),
        singles = singles.len(),
        unused = leftovers.len() - singles.len(),
        "object allocation"
    );
    Ok(ObjectAllocation { lures, singles })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectCondition {
    Repeat,
    LureHigh,
    LureLow,
    Foil,
}

impl ObjectCondition {
    /// Code written in the ImageType log column.
    pub fn code(self) -> &'static str {
        match self {
            ObjectCondition::Repeat => "sR",
            ObjectCondition::LureHigh => "1",
            ObjectCondition::LureLow => "2",
            ObjectCondition::Foil => "sF",
        }
    }
}

impl Condition for ObjectCondition {
    const ALL: [Self; CONDITION_COUNT] = [
        ObjectCondition::Repeat,
        ObjectCondition::LureHigh,
        ObjectCondition::LureLow,
        ObjectCondition::Foil,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            ObjectCondition::Repeat => "Repeat",
            ObjectCondition::LureHigh => "Lure High",
            ObjectCondition::LureLow => "Lure Low",
            ObjectCondition::Foil => "Foil",
        }
    }
}

impl From<Role> for ObjectCondition {
    fn from(role: Role) -> Self {
        match role {
            Role::Repeat => ObjectCondition::Repeat,
            Role::Foil => ObjectCondition::Foil,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectItem {
    pub image: String,
    pub condition: ObjectCondition,
}

impl ObjectItem {
    fn new(image: &StimulusFile, condition: ObjectCondition) -> Self {
        Self {
            image: image.name().to_string(),
            condition,
        }
    }
}

impl ObjectAllocation {
    /// Targets of every pair and the repeat singles, unshuffled.
    pub fn study_items(&self) -> Vec<ObjectItem> {
        let targets = self
            .lures
            .iter()
            .map(|p| ObjectItem::new(&p.target, p.bin.condition()));
        let repeats = self
            .singles
            .iter()
            .filter(|s| s.role == Role::Repeat)
            .map(|s| ObjectItem::new(&s.stimulus, s.role.into()));
        targets.chain(repeats).collect()
    }

    /// Lures of every pair and all singles, unshuffled.
    pub fn test_items(&self) -> Vec<ObjectItem> {
        let lures = self
            .lures
            .iter()
            .map(|p| ObjectItem::new(&p.lure, p.bin.condition()));
        let singles = self
            .singles
            .iter()
            .map(|s| ObjectItem::new(&s.stimulus, s.role.into()));
        lures.chain(singles).collect()
    }
}

fn practice_condition(name: &str) -> Option<ObjectCondition> {
    let name = name.to_ascii_lowercase();
    if name.contains("foil") {
        Some(ObjectCondition::Foil)
    } else if name.contains("target") {
        Some(ObjectCondition::Repeat)
    } else if name.contains("high") {
        Some(ObjectCondition::LureHigh)
    } else if name.contains("low") {
        Some(ObjectCondition::LureLow)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTask {
    pub leftover_start: LeftoverStart,
}

impl Task for ObjectTask {
    type Condition = ObjectCondition;
    type Item = ObjectItem;

    fn kind(&self) -> TaskKind {
        TaskKind::Object
    }

    fn required_stimuli(&self, config: &SessionConfig) -> Vec<(Category, usize)> {
        // Two files per pair.
        let files = config.trials_per_condition.saturating_mul(2);
        vec![(Category::LureHigh, files), (Category::LureLow, files)]
    }

    fn plan(
        &self,
        pool: &StimulusPool,
        config: &SessionConfig,
        _geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<ObjectItem>>, AllocationError> {
        let allocation = allocate(pool, config.trials_per_condition, self.leftover_start, rng)?;
        let mut study = allocation.study_items();
        let mut test = allocation.test_items();
        study.shuffle(rng);
        test.shuffle(rng);
        info!(
            study = study.len(),
            test = test.len(),
            "object trials allocated"
        );
        Ok(vec![BlockPlan { study, test }])
    }

    fn practice_rounds(
        &self,
        practice: &[StimulusFile],
        _geometry: DisplayGeometry,
        rng: &mut StdRng,
    ) -> Result<Vec<BlockPlan<ObjectItem>>, AllocationError> {
        let mut rounds = Vec::new();
        for round in 1..=PRACTICE_ROUNDS {
            let marker = format!("Set_{round}");
            let images: Vec<&StimulusFile> = practice
                .iter()
                .filter(|f| f.name().contains(&marker))
                .collect();

            let mut study = Vec::new();
            let mut test = Vec::new();
            for pair in images.chunks_exact(2) {
                let (a, b) = (pair[0], pair[1]);
                let Some(condition) = practice_condition(a.name()) else {
                    warn!(image = %a, "practice image has no trial-type marker");
                    continue;
                };
                if condition != ObjectCondition::Foil {
                    study.push(ObjectItem::new(a, condition));
                }
                let shown = match condition {
                    ObjectCondition::Repeat | ObjectCondition::Foil => a,
                    ObjectCondition::LureHigh | ObjectCondition::LureLow => b,
                };
                test.push(ObjectItem::new(shown, condition));
            }
            if test.is_empty() {
                continue;
            }
            study.shuffle(rng);
            test.shuffle(rng);
            rounds.push(BlockPlan { study, test });
        }
        Ok(rounds)
    }

    fn presentation(&self, item: &ObjectItem, _phase: Phase) -> Presentation {
        Presentation::Centered {
            image: item.image.clone(),
        }
    }

    fn condition(&self, item: &ObjectItem) -> Option<ObjectCondition> {
        Some(item.condition)
    }

    fn expected(&self, item: &ObjectItem, phase: Phase) -> Option<Side> {
        match (phase, item.condition) {
            (Phase::Study, _) => None,
            (Phase::Test, ObjectCondition::Repeat) => Some(Side::Left),
            (Phase::Test, _) => Some(Side::Right),
        }
    }

    fn item_label(&self, item: &ObjectItem) -> String {
        item.condition.code().to_string()
    }

    fn instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        if config.variant == Variant::ECog {
            let [left, right] = ECOG_KEYS;
            return match phase {
                Phase::Study => format!(
                    "In the following phase, a sequence of images will be shown.\n\n\
                     -Press '{left}' if the image is of an indoor object.\n\n\
                     -Press '{right}' if the image is of an outdoor object.\n\n\n\
                     Press '{}' to begin",
                    config.pause_key
                ),
                Phase::Test => format!(
                    "In this phase, another sequence of images will be shown.\n\n\
                     -Press '{left}' if the image was also shown in the previous phase. (Old Image)\n\n\
                     -Press '{right}' if the image was not shown in the previous phase. (New Image)\n\n\n\
                     Press '{}' to begin",
                    config.pause_key
                ),
            };
        }
        match phase {
            Phase::Study => format!(
                "Are the following objects indoor or outdoor?\n\nPress '{}' to continue",
                config.pause_key
            ),
            Phase::Test => format!(
                "In this phase, another sequence of images will be shown\n\n\
                 Are the objects old or new?\n\nPress '{}' to continue",
                config.pause_key
            ),
        }
    }

    fn practice_instructions(&self, phase: Phase, config: &SessionConfig) -> String {
        match phase {
            Phase::Study => format!("Outdoor or Indoor? ('{}' to continue)", config.pause_key),
            Phase::Test => format!("Old or new? ('{}' to continue)", config.pause_key),
        }
    }

    fn choice_labels(&self, phase: Phase) -> [&'static str; 2] {
        match phase {
            Phase::Study => ["Indoor", "Outdoor"],
            Phase::Test => ["Old", "New"],
        }
    }

    fn header(&self, phase: Phase) -> String {
        match phase {
            Phase::Study => format!(
                "{:<7}{:<12} {:<10} {:<10} {:<4}",
                "Trial", "Image", "ImageType", "Response", "RT"
            ),
            Phase::Test => format!(
                "{:<7}{:<12}{:<11}{:<9}{:<10}{:<4}",
                "Trial", "Image", "ImageType", "CorResp", "Response", "RT"
            ),
        }
    }

    fn row(&self, row: &LogRow<'_, ObjectItem>) -> String {
        let code = row.item.condition.code();
        match row.phase {
            Phase::Study => format!(
                "{:<7}{:<17}{:<10}{:<6}{:<4.3}",
                row.trial, row.item.image, code, row.response, row.reaction_time_s
            ),
            Phase::Test => format!(
                "{:<7}{:<15}{:<11}{:<9}{:<6}{:<4.3}",
                row.trial, row.item.image, code, row.expected_key, row.response, row.reaction_time_s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;

    use super::*;

    fn bin_files(code: char, pairs: usize) -> Vec<StimulusFile> {
        let category = match code {
            '1' => Category::LureHigh,
            _ => Category::LureLow,
        };
        (0..pairs)
            .flat_map(|i| {
                ["a", "b"].map(|half| StimulusFile::new(format!("p{i:04}{code}{half}.jpg"), category))
            })
            .collect()
    }

    fn pool(high_pairs: usize, low_pairs: usize) -> StimulusPool {
        let mut files = bin_files('1', high_pairs);
        files.extend(bin_files('2', low_pairs));
        StimulusPool::from_files("img", files)
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn exact_pair_quota_per_bin() {
        let alloc = allocate(&pool(12, 12), 4, LeftoverStart::AfterQuota, &mut rng(7)).unwrap();
        assert_eq!(alloc.lures.len(), 8);
        let high = alloc.lures.iter().filter(|p| p.bin == LureBin::High).count();
        assert_eq!(high, 4);

        let mut seen = HashSet::new();
        for pair in &alloc.lures {
            assert!(seen.insert(pair.target.name().to_string()));
            assert!(seen.insert(pair.lure.name().to_string()));
        }
    }

    #[test]
    fn pairs_are_consecutive_sorted_names() {
        let alloc = allocate(&pool(6, 6), 3, LeftoverStart::AfterQuota, &mut rng(1)).unwrap();
        for pair in &alloc.lures {
            let target = pair.target.name();
            let lure = pair.lure.name();
            assert_eq!(target[..6], lure[..6]);
            assert!(target.ends_with("a.jpg") && lure.ends_with("b.jpg"));
        }
    }

    #[test]
    fn singles_come_only_from_leftovers() {
        let alloc = allocate(&pool(12, 12), 4, LeftoverStart::AfterQuota, &mut rng(3)).unwrap();
        let repeats = alloc.singles.iter().filter(|s| s.role == Role::Repeat).count();
        let foils = alloc.singles.iter().filter(|s| s.role == Role::Foil).count();
        assert_eq!((repeats, foils), (4, 4));

        let paired: HashSet<_> = alloc
            .lures
            .iter()
            .flat_map(|p| [p.target.name(), p.lure.name()])
            .collect();
        for single in &alloc.singles {
            assert!(!paired.contains(single.stimulus.name()));
            assert!(single.stimulus.name().ends_with("a.jpg"));
        }
    }

    #[test]
    fn short_bin_is_a_typed_error() {
        let err = allocate(&pool(3, 10), 4, LeftoverStart::AfterQuota, &mut rng(0)).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientPairs {
                bin: "high",
                needed: 4,
                available: 3
            }
        );
        let err = allocate(&pool(10, 2), 4, LeftoverStart::AfterQuota, &mut rng(0)).unwrap_err();
        assert!(matches!(err, AllocationError::InsufficientPairs { bin: "low", .. }));
    }

    #[test]
    fn leftover_start_boundary() {
        // 2 per condition, 4 pairs per bin: 2 leftover pairs per bin after the quota.
        let after = allocate(&pool(4, 4), 2, LeftoverStart::AfterQuota, &mut rng(5)).unwrap();
        assert_eq!(after.singles.len(), 4);

        // Skipping the first leftover pair leaves 1 per bin, short of 4 singles.
        let err = allocate(&pool(4, 4), 2, LeftoverStart::SkipOne, &mut rng(5)).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientSingles {
                needed: 4,
                available: 2
            }
        );

        // One more pair per bin satisfies the legacy layout exactly.
        let legacy = allocate(&pool(5, 5), 2, LeftoverStart::SkipOne, &mut rng(5)).unwrap();
        assert_eq!(legacy.singles.len(), 4);
    }

    #[test]
    fn skip_one_never_uses_the_first_unselected_pair() {
        let high = bin_files('1', 5);
        let low = bin_files('2', 5);
        let mut r = rng(11);
        let (selected, leftovers) = split_lures(&high, &low, 2, LeftoverStart::SkipOne, &mut r).unwrap();
        assert_eq!(selected.len(), 4);
        // 5 pairs per bin: indices 3 and 4 contribute, index 2 is skipped.
        assert_eq!(leftovers.len(), 4);
    }

    #[test]
    fn dedicated_singles_extend_leftovers_only_after_quota() {
        let mut files = bin_files('1', 2);
        files.extend(bin_files('2', 2));
        files.extend((0..4).map(|i| StimulusFile::new(format!("s{i:04}3a.jpg"), Category::Single)));
        let pool = StimulusPool::from_files("img", files);
        let alloc = allocate(&pool, 2, LeftoverStart::AfterQuota, &mut rng(2)).unwrap();
        assert!(alloc.singles.iter().all(|s| s.stimulus.category() == Category::Single));

        let err = allocate(&pool, 2, LeftoverStart::SkipOne, &mut rng(2)).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientSingles {
                needed: 4,
                available: 0
            }
        );
    }

    #[test]
    fn legacy_leftovers_stop_at_the_high_bin() {
        let high = bin_files('1', 4);
        let low = bin_files('2', 8);

        let (_, legacy) = split_lures(&high, &low, 2, LeftoverStart::SkipOne, &mut rng(6)).unwrap();
        // Only index 3 lies inside the high bin past the skipped pair.
        assert_eq!(legacy.len(), 2);

        let (_, after) = split_lures(&high, &low, 2, LeftoverStart::AfterQuota, &mut rng(6)).unwrap();
        // Indices 2..4 of the high bin and 2..8 of the low bin.
        assert_eq!(after.len(), 2 + 6);
    }

    #[test]
    fn legacy_layout_is_the_default() {
        assert_eq!(ObjectTask::default().leftover_start, LeftoverStart::SkipOne);
    }

    #[test]
    fn oversized_quota_is_an_error_not_an_overflow() {
        let err = split_singles(&[], usize::MAX, &mut rng(0)).unwrap_err();
        assert_eq!(
            err,
            AllocationError::QuotaOverflow {
                count: usize::MAX,
                per: 2
            }
        );
        let err = allocate(&pool(2, 2), usize::MAX / 2, LeftoverStart::SkipOne, &mut rng(0))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InsufficientPairs { .. }));

        let config = SessionConfig {
            trials_per_condition: usize::MAX,
            ..SessionConfig::default()
        };
        let required = ObjectTask::default().required_stimuli(&config);
        assert_eq!(required[0], (Category::LureHigh, usize::MAX));
    }

    #[test]
    fn ecog_prompts_name_the_numeric_buttons() {
        let config = SessionConfig {
            variant: Variant::ECog,
            ..SessionConfig::default()
        };
        let task = ObjectTask::default();
        assert!(task.instructions(Phase::Study, &config).contains("Press '1' if the image is of an indoor"));
        assert!(task.instructions(Phase::Test, &config).contains("(New Image)"));
        assert_eq!(task.choice_labels(Phase::Test), ["Old", "New"]);
        assert_eq!(
            task.practice_instructions(Phase::Study, &config),
            "Outdoor or Indoor? ('p' to continue)"
        );
    }

    #[test]
    fn odd_bin_drops_last_file() {
        let mut files = bin_files('1', 2);
        files.push(StimulusFile::new("p99991a.jpg", Category::LureHigh));
        assert_eq!(pair_consecutive(&files, LureBin::High).len(), 2);
    }

    #[test]
    fn same_seed_same_allocation() {
        let p = pool(10, 10);
        let a = allocate(&p, 3, LeftoverStart::AfterQuota, &mut rng(42)).unwrap();
        let b = allocate(&p, 3, LeftoverStart::AfterQuota, &mut rng(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn plan_preserves_membership() {
        let config = SessionConfig {
            trials_per_condition: 3,
            ..SessionConfig::default()
        };
        let p = pool(10, 10);
        let task = ObjectTask::default();
        let alloc = allocate(&p, 3, LeftoverStart::default(), &mut rng(9)).unwrap();
        let plan = task
            .plan(&p, &config, DisplayGeometry::default(), &mut rng(9))
            .unwrap();
        let block = &plan[0];

        let sorted = |items: &[ObjectItem]| {
            let mut v: Vec<_> = items.iter().map(|i| i.image.clone()).collect();
            v.sort();
            v
        };
        assert_eq!(sorted(&block.study), sorted(&alloc.study_items()));
        assert_eq!(sorted(&block.test), sorted(&alloc.test_items()));
        assert_eq!(block.study.len(), 3 * 2 + 3);
        assert_eq!(block.test.len(), 3 * 2 + 6);
    }

    #[test]
    fn expected_sides() {
        let task = ObjectTask::default();
        let item = |condition| ObjectItem {
            image: "x.jpg".into(),
            condition,
        };
        assert_eq!(task.expected(&item(ObjectCondition::Repeat), Phase::Test), Some(Side::Left));
        assert_eq!(task.expected(&item(ObjectCondition::Foil), Phase::Test), Some(Side::Right));
        assert_eq!(task.expected(&item(ObjectCondition::LureLow), Phase::Test), Some(Side::Right));
        assert_eq!(task.expected(&item(ObjectCondition::Repeat), Phase::Study), None);
    }

    #[test]
    fn practice_rounds_follow_set_markers() {
        let names = [
            "PR_Set_1_foil_a.jpg",
            "PR_Set_1_foil_b.jpg",
            "PR_Set_1_high_a.jpg",
            "PR_Set_1_high_b.jpg",
            "PR_Set_1_target_a.jpg",
            "PR_Set_1_target_b.jpg",
            "PR_Set_2_low_a.jpg",
            "PR_Set_2_low_b.jpg",
        ];
        let practice: Vec<_> = names
            .iter()
            .map(|n| StimulusFile::new(*n, Category::Practice))
            .collect();
        let rounds = ObjectTask::default()
            .practice_rounds(&practice, DisplayGeometry::default(), &mut rng(4))
            .unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].study.len(), 2);
        assert_eq!(rounds[0].test.len(), 3);
        let lure = rounds[0]
            .test
            .iter()
            .find(|i| i.condition == ObjectCondition::LureHigh)
            .unwrap();
        assert_eq!(lure.image, "PR_Set_1_high_b.jpg");
        assert_eq!(rounds[1].test[0].image, "PR_Set_2_low_b.jpg");
    }

    #[test]
    fn log_rows_are_fixed_width() {
        let task = ObjectTask::default();
        let item = ObjectItem {
            image: "p00011b.jpg".into(),
            condition: ObjectCondition::LureHigh,
        };
        let row = task.row(&LogRow {
            trial: 3,
            item: &item,
            phase: Phase::Test,
            expected_key: "m",
            response: "z",
            reaction_time_s: 0.5,
        });
        assert_eq!(row, "3      p00011b.jpg    1          m        z     0.500");
        assert!(task.header(Phase::Test).starts_with("Trial  Image       ImageType  "));
    }
}
