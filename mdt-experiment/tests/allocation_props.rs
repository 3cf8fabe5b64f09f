use std::collections::HashSet;

use mdt_core::{AllocationError, Category, StimulusFile};
use mdt_experiment::object::{LeftoverStart, Role, allocate};
use mdt_experiment::{
    BlockPlan, DisplayGeometry, ObjectTask, SessionConfig, SpatialTask, StimulusPool, Task,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn object_pool(high_pairs: usize, low_pairs: usize, singles: usize) -> StimulusPool {
    let mut files = Vec::new();
    for (code, category, pairs) in [
        ('1', Category::LureHigh, high_pairs),
        ('2', Category::LureLow, low_pairs),
    ] {
        for i in 0..pairs {
            for half in ["a", "b"] {
                files.push(StimulusFile::new(format!("{i:05}{code}{half}.jpg"), category));
            }
        }
    }
    for i in 0..singles {
        files.push(StimulusFile::new(format!("{i:05}3.jpg"), Category::Single));
    }
    StimulusPool::from_files("img", files)
}

fn names<I>(plan: &BlockPlan<I>, f: impl Fn(&I) -> String) -> (Vec<String>, Vec<String>) {
    let mut study: Vec<_> = plan.study.iter().map(&f).collect();
    let mut test: Vec<_> = plan.test.iter().map(&f).collect();
    study.sort();
    test.sort();
    (study, test)
}

proptest! {
    #[test]
    fn object_allocation_invariants(
        seed in any::<u64>(),
        trials_per in 1usize..8,
        extra_high in 0usize..6,
        extra_low in 0usize..6,
        singles in 0usize..10,
    ) {
        let pool = object_pool(trials_per + extra_high, trials_per + extra_low, singles);
        let mut rng = StdRng::seed_from_u64(seed);
        let leftovers = extra_high + extra_low + singles;

        match allocate(&pool, trials_per, LeftoverStart::AfterQuota, &mut rng) {
            Ok(alloc) => {
                prop_assert_eq!(alloc.lures.len(), 2 * trials_per);
                let repeats = alloc.singles.iter().filter(|s| s.role == Role::Repeat).count();
                prop_assert_eq!(repeats, trials_per);
                prop_assert_eq!(alloc.singles.len() - repeats, trials_per);

                let mut seen = HashSet::new();
                for pair in &alloc.lures {
                    prop_assert!(seen.insert(pair.target.name()));
                    prop_assert!(seen.insert(pair.lure.name()));
                }
                for single in &alloc.singles {
                    prop_assert!(seen.insert(single.stimulus.name()));
                }
            }
            Err(err) => {
                prop_assert!(leftovers < 2 * trials_per);
                prop_assert_eq!(
                    err,
                    AllocationError::InsufficientSingles { needed: 2 * trials_per, available: leftovers }
                );
            }
        }
    }

    #[test]
    fn shuffled_orders_keep_membership(seed in any::<u64>()) {
        let config = SessionConfig { trials_per_condition: 3, ..SessionConfig::default() };
        let geometry = DisplayGeometry::default();

        let pool = object_pool(8, 8, 0);
        let task = ObjectTask::default();
        let a = task.plan(&pool, &config, geometry, &mut StdRng::seed_from_u64(seed)).unwrap();
        let b = task.plan(&pool, &config, geometry, &mut StdRng::seed_from_u64(seed.wrapping_add(1))).unwrap();
        let image = |i: &mdt_experiment::ObjectItem| i.image.clone();
        prop_assert_eq!(a[0].study.len(), b[0].study.len());
        prop_assert_eq!(a[0].test.len(), b[0].test.len());
        let (study, test) = names(&a[0], image);
        prop_assert_eq!(study.len(), study.iter().collect::<HashSet<_>>().len());
        prop_assert_eq!(test.len(), test.iter().collect::<HashSet<_>>().len());

        let targets: Vec<_> = (0..12)
            .map(|i| StimulusFile::new(format!("{i:03}.jpg"), Category::Target))
            .collect();
        let pool = StimulusPool::from_files("img", targets);
        let plan = SpatialTask.plan(&pool, &config, geometry, &mut StdRng::seed_from_u64(seed)).unwrap();
        let (study, test) = names(&plan[0], |i| i.image.clone());
        prop_assert_eq!(study, test);
    }
}
