use std::path::Path;
use std::time::Duration;

use mdt_core::{Category, Condition, LoadError, NamingRule, Phase};
use mdt_experiment::{
    ESCAPE_KEY, MemoryFilesystem, MemorySink, MoveClass, ObjectTask, Presentation,
    ScriptedPresenter, Session, SessionConfig, SessionError, SpatialTask, Stage, StimulusPool,
    Task, TaskKind, TemporalTask,
};
use mdt_timing::SimulatedTimer;

fn load(fs: &MemoryFilesystem, task: &impl Task, config: &SessionConfig) -> StimulusPool {
    StimulusPool::load(
        fs,
        Path::new("img"),
        task.kind().naming_rule(),
        config.practice,
        &task.required_stimuli(config),
    )
    .unwrap()
}

fn plain_fs(targets: usize, practice: usize) -> MemoryFilesystem {
    let mut names: Vec<String> = (0..targets).map(|i| format!("{i:04}.jpg")).collect();
    names.extend((0..practice).map(|i| format!("PR_{i:02}.jpg")));
    MemoryFilesystem::new().with_dir("img", names)
}

fn object_fs() -> MemoryFilesystem {
    let mut names = Vec::new();
    for code in ['1', '2'] {
        for i in 0..8 {
            names.push(format!("{i:05}{code}a.jpg"));
            names.push(format!("{i:05}{code}b.jpg"));
        }
    }
    names.extend(["PR_Set_1_target_a.jpg", "PR_Set_1_target_b.jpg"].map(String::from));
    MemoryFilesystem::new().with_dir("img", names)
}

#[test]
fn object_pool_from_listing() {
    let config = SessionConfig {
        trials_per_condition: 8,
        ..SessionConfig::default()
    };
    let pool = load(&object_fs(), &ObjectTask::default(), &config);
    assert_eq!(pool.count(Category::LureHigh), 16);
    assert_eq!(pool.count(Category::LureLow), 16);
    assert_eq!(pool.count(Category::Practice), 2);
    assert_eq!(ObjectTask::default().kind().naming_rule(), NamingRule::LureCoded);
}

#[test]
fn object_pool_short_of_lures_fails_with_the_shortfall() {
    let config = SessionConfig {
        trials_per_condition: 9,
        ..SessionConfig::default()
    };
    let task = ObjectTask::default();
    let err = StimulusPool::load(
        &object_fs(),
        Path::new("img"),
        task.kind().naming_rule(),
        config.practice,
        &task.required_stimuli(&config),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Insufficient {
            category: Category::LureHigh,
            needed: 18,
            found: 16,
            ..
        }
    ));
}

#[test]
fn spatial_session_scores_every_class() {
    let config = SessionConfig {
        task: TaskKind::Spatial,
        trials_per_condition: 3,
        practice: false,
        ..SessionConfig::default()
    };
    let pool = load(&plain_fs(20, 0), &SpatialTask, &config);
    let mut session = Session::new(
        SpatialTask,
        config,
        ScriptedPresenter::always("m", Duration::from_millis(350)),
        MemorySink::new(),
        SimulatedTimer::new(),
    );
    let outcome = session.run(&pool, "09:30 on 02/03/26").unwrap();

    for class in MoveClass::ALL {
        assert_eq!(outcome.scores.cell(class).responses, 3);
    }
    assert_eq!(outcome.scores.cell(MoveClass::None).incorrect, 3);
    assert_eq!(outcome.scores.cell(MoveClass::Corner).correct, 3);
    assert!(session.sink.contains("Correct | Corners"));
    assert!(
        session
            .presenter
            .shown
            .iter()
            .all(|p| matches!(p, Presentation::Positioned { .. }))
    );
}

#[test]
fn temporal_session_numbers_blocks_and_runs_practice() {
    let config = SessionConfig {
        task: TaskKind::Temporal,
        blocks: 2,
        stimuli_per_block: 32,
        ..SessionConfig::default()
    };
    let pool = load(&plain_fs(64, 12), &TemporalTask::default(), &config);
    let mut session = Session::new(
        TemporalTask::default(),
        config,
        ScriptedPresenter::always("z", Duration::from_millis(600)),
        MemorySink::new(),
        SimulatedTimer::new(),
    );
    let outcome = session.run(&pool, "t").unwrap();

    assert!(session.sink.contains("Begin Study 1"));
    assert!(session.sink.contains("Begin Test 2"));
    assert!(session.sink.contains("Begin Practice Study 1"));
    let ratios = &outcome.practice_ratios;
    assert!(!ratios.is_empty() && ratios.len() <= 3);
    assert!(ratios[..ratios.len() - 1].iter().all(|r| *r <= 0.6));

    let main_test: Vec<_> = session
        .records
        .iter()
        .filter(|r| !r.practice && r.phase == Phase::Test)
        .collect();
    assert_eq!(main_test.len(), 32);
    assert_eq!(outcome.scores.total_responses(), 32);
    // Exactly half the pairs put the earlier image on the left.
    let correct: u32 = outcome.scores.cells().iter().map(|(_, c)| c.correct).sum();
    assert_eq!(correct, 16);
}

#[test]
fn temporal_practice_with_wrong_image_count_is_skipped() {
    let config = SessionConfig {
        task: TaskKind::Temporal,
        blocks: 1,
        ..SessionConfig::default()
    };
    let pool = load(&plain_fs(32, 5), &TemporalTask::default(), &config);
    let mut session = Session::new(
        TemporalTask::default(),
        config,
        ScriptedPresenter::always("z", Duration::ZERO),
        MemorySink::new(),
        SimulatedTimer::new(),
    );
    let outcome = session.run(&pool, "t").unwrap();
    assert!(outcome.practice_ratios.is_empty());
    assert!(session.sink.contains("Practice skipped"));
    assert!(session.sink.contains("Scores:"));
}

#[test]
fn escape_during_practice_terminates() {
    let config = SessionConfig {
        task: TaskKind::Temporal,
        blocks: 1,
        ..SessionConfig::default()
    };
    let pool = load(&plain_fs(32, 12), &TemporalTask::default(), &config);
    let presenter = ScriptedPresenter::always("z", Duration::ZERO)
        .then_respond("m", Duration::from_millis(100))
        .then_respond(ESCAPE_KEY, Duration::from_millis(100));
    let mut session = Session::new(
        TemporalTask::default(),
        config,
        presenter,
        MemorySink::new(),
        SimulatedTimer::new(),
    );
    let err = session.run(&pool, "t").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Terminated {
            stage: Stage::Practice(1)
        }
    ));
    assert!(!session.sink.contains("Scores:"));
    assert!(session.sink.closed);
}

#[test]
fn same_subject_and_subset_replay_identically() {
    let pool_config = SessionConfig {
        task: TaskKind::Spatial,
        trials_per_condition: 4,
        practice: false,
        ..SessionConfig::default()
    };
    let pool = load(&plain_fs(40, 0), &SpatialTask, &pool_config);
    let run = |subset: u8| {
        let config = SessionConfig {
            task: TaskKind::Spatial,
            subject_id: 4242,
            subset,
            trials_per_condition: 4,
            practice: false,
            ..SessionConfig::default()
        };
        let mut session = Session::new(
            SpatialTask,
            config,
            ScriptedPresenter::always("z", Duration::from_millis(250)),
            MemorySink::new(),
            SimulatedTimer::new(),
        );
        session.run(&pool, "fixed").unwrap();
        (session.sink.lines, session.presenter.shown)
    };

    assert_eq!(run(3), run(3));
    assert_ne!(run(3).1, run(4).1);
}
