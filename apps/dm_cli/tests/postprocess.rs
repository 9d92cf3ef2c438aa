// apps/dm_cli/tests/postprocess.rs

//! 后处理命令：切片与质心速度

use clap::Parser;
use dm_cli::commands::get_data_slice::{write_slice, SliceArgs};
use dm_cli::commands::get_velocity::{centroid_velocity, VelocityArgs};
use dm_config::{ParameterSet, SimulationConfig};
use dm_io::Checkpoint;
use dm_physics::{Engine, FieldInitializer, FieldKind, StokesClsvofEngine};

fn write_snapshot(dir: &std::path::Path) -> std::path::PathBuf {
    let mut config = SimulationConfig::default();
    config.adapt.max_level = 5;
    let params = ParameterSet::new(config, 1.0).unwrap();
    let mut engine = StokesClsvofEngine::new(&params).unwrap();
    FieldInitializer::new(&params).apply(engine.state_mut());

    let state = engine.state_mut();
    for k in 0..state.n_cells() {
        state.field_mut(FieldKind::VelocityX)[k] = 0.25;
        state.field_mut(FieldKind::VelocityY)[k] = -0.5;
    }

    let path = dir.join("snapshot-00000.3000");
    Checkpoint::from_state(engine.state(), 0.3, 3).save(&path).unwrap();
    path
}

#[test]
fn test_slice_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path());
    let file = path.to_string_lossy().into_owned();

    let args = SliceArgs::try_parse_from([
        "get_data_slice", file.as_str(), "-2", "2", "-1", "1", "4", "2",
    ])
    .unwrap();
    let mut out = Vec::new();
    let n = write_slice(&args, &mut out).unwrap();
    assert_eq!(n, 5 * 3);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 15);
    for line in lines {
        let cols: Vec<f64> = line.split_whitespace().map(|c| c.parse().unwrap()).collect();
        assert_eq!(cols.len(), 5);
        assert!((cols[3] - 0.25).abs() < 1e-9);
    }
}

#[test]
fn test_slice_rejects_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path());
    let file = path.to_string_lossy().into_owned();

    let args =
        SliceArgs::try_parse_from(["get_data_slice", file.as_str(), "-1", "1", "0", "1", "0", "4"]).unwrap();
    let err = write_slice(&args, &mut Vec::<u8>::new()).unwrap_err();
    assert_eq!(dm_cli::exit_code(&err), 2);
}

#[test]
fn test_centroid_velocity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path());
    let file = path.to_string_lossy().into_owned();

    let args = VelocityArgs::try_parse_from(["get_velocity", file.as_str()]).unwrap();
    let v = centroid_velocity(&args).unwrap();
    assert!((v.vx - 0.25).abs() < 1e-9);
    assert!((v.vy + 0.5).abs() < 1e-9);
    assert!((v.time - 0.3).abs() < 1e-12);
    assert_eq!(v.to_string(), "0.250000 -0.500000 0.300000");
}

#[test]
fn test_missing_snapshot() {
    let args = VelocityArgs::try_parse_from(["get_velocity", "/nonexistent/snapshot"]).unwrap();
    let err = centroid_velocity(&args).unwrap_err();
    assert_eq!(dm_cli::exit_code(&err), 4);
}
