// crates/dm_workflow/tests/run_scenarios.rs

//! 完整运行场景：判定、日志行数、状态行与快照

mod common;

use std::sync::Arc;

use common::{log_rows, run_with, test_config, ScriptedEngine};
use dm_config::{ParameterSet, VerdictPrecedence};
use dm_io::{RunStatus, SnapshotSchedule};
use dm_physics::StokesClsvofEngine;
use dm_runtime::LocalCommunicator;
use dm_workflow::{Verdict, WorkflowError};

const DT: f64 = 0.01;

#[test]
fn test_reference_engine_symmetric_droplet_not_moved() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.adapt.min_level = 5;
    config.adapt.max_level = 5;
    let log_path = config.output.log_file.clone();

    let params = ParameterSet::new(config.clone(), 1.0).unwrap();
    let engine = StokesClsvofEngine::new(&params).unwrap();
    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));

    let summary = result.unwrap();
    assert_eq!(summary.verdict, Verdict::NotMoved);
    assert!((summary.final_time - 0.2).abs() < 1e-9);

    let lines = status.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(RunStatus::parse(&lines[0]), Some(RunStatus::NotMoved));

    let rows = log_rows(&log_path);
    assert_eq!(rows.len() as u64, summary.completed_steps);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), 4);
        assert_eq!(row[0], i.to_string());
    }
    assert!(summary.last.unwrap().displacement < 1e-3);
}

#[test]
fn test_moved_after_warmup() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let log_path = config.output.log_file.clone();
    let engine = ScriptedEngine::new(&config, DT, Box::new(|_| (0.0, 2.0)));

    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    let summary = result.unwrap();

    // 步 1..=10 已越过阈值，但处于预热期
    assert_eq!(summary.verdict, Verdict::Moved);
    assert_eq!(summary.completed_steps, 12);
    assert_eq!(status.lines(), vec!["STATUS MOVED".to_string()]);
    assert_eq!(log_rows(&log_path).len(), 12);
}

#[test]
fn test_energy_violation_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let log_path = config.output.log_file.clone();
    let engine = ScriptedEngine::new(
        &config,
        DT,
        Box::new(|step| (if step >= 11 { 2e3 } else { 0.0 }, 0.0)),
    );

    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    match result {
        Err(WorkflowError::StabilityViolation {
            step,
            kinetic_energy,
            ..
        }) => {
            assert_eq!(step, 11);
            assert!((kinetic_energy - 2e3).abs() < 1e-6);
        }
        other => panic!("expected stability violation, got {other:?}"),
    }
    assert!(status.lines().is_empty());
    assert_eq!(log_rows(&log_path).len(), 12);
}

#[test]
fn test_precedence_when_both_trigger() {
    let script = |_: u64| (2e3, 2.0);

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let engine = ScriptedEngine::new(&config, DT, Box::new(script));
    let (result, _) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    assert_eq!(result.unwrap().verdict, Verdict::Moved);

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.classifier.precedence = VerdictPrecedence::StabilityFirst;
    let engine = ScriptedEngine::new(&config, DT, Box::new(script));
    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    assert!(matches!(result, Err(WorkflowError::StabilityViolation { step: 11, .. })));
    assert!(status.lines().is_empty());
}

#[test]
fn test_warmup_suppresses_everything() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let engine = ScriptedEngine::new(
        &config,
        DT,
        Box::new(|step| if step <= 10 { (1e9, 4.0) } else { (0.0, 0.0) }),
    );

    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    let summary = result.unwrap();
    assert_eq!(summary.verdict, Verdict::NotMoved);
    assert_eq!(summary.completed_steps, 21);
    assert_eq!(status.lines(), vec!["STATUS NOT_MOVED".to_string()]);
}

#[test]
fn test_non_finite_energy_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let engine = ScriptedEngine::new(
        &config,
        DT,
        Box::new(|step| (if step > 11 { f64::NAN } else { 0.0 }, 0.0)),
    );

    let (result, _) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    assert!(matches!(result, Err(WorkflowError::StabilityViolation { step: 12, .. })));
}

#[test]
fn test_degenerate_mass() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    // 液滴移出计算域，体积分数处处为零
    let engine = ScriptedEngine::new(&config, DT, Box::new(|_| (0.0, 100.0)));

    let (result, status) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    assert!(matches!(result, Err(WorkflowError::DegenerateConfiguration { step: 1 })));
    assert!(status.lines().is_empty());
}

#[test]
fn test_snapshots_hit_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let snapshot_dir = config.output.snapshot_dir.clone();

    // 旧文件在运行开始时被清除
    std::fs::create_dir_all(&snapshot_dir).unwrap();
    std::fs::write(snapshot_dir.join("stale"), b"x").unwrap();

    let engine = ScriptedEngine::at_rest(&config, 0.03);
    let (result, _) = run_with(config, 1.0, Box::new(engine), Arc::new(LocalCommunicator::new()));
    assert_eq!(result.unwrap().verdict, Verdict::NotMoved);

    let mut names: Vec<String> = std::fs::read_dir(&snapshot_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let expected: Vec<String> = [0.0, 0.05, 0.1, 0.15, 0.2]
        .iter()
        .map(|&t| SnapshotSchedule::file_name(t))
        .collect();
    assert_eq!(names, expected);

    let last = dm_io::Checkpoint::read_header(&snapshot_dir.join(&expected[4])).unwrap();
    assert!((last.time - 0.2).abs() < 1e-9);
}
