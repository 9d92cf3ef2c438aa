// crates/dm_io/tests/snapshot_postprocess.rs

//! 快照写出 -> 读回 -> 后处理

use dm_config::{ParameterSet, SimulationConfig};
use dm_io::{
    extract_slice, sample_centroid_velocity, Checkpoint, SliceRequest, SnapshotSchedule,
    SnapshotWriter,
};
use dm_mesh::{AdaptiveMesh, Domain};
use dm_physics::{FieldInitializer, FieldKind, FlowState};

fn initial_state() -> (FlowState, ParameterSet) {
    let mut config = SimulationConfig::default();
    config.domain.size = 4.0;
    let params = ParameterSet::new(config, 1.0).unwrap();
    let mesh = AdaptiveMesh::uniform(Domain::centered(4.0), 4).unwrap();
    let mut state = FlowState::new(mesh);
    FieldInitializer::new(&params).apply(&mut state);
    (state, params)
}

#[test]
fn test_snapshot_then_slice_at_cell_centres() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("intermediate");
    let (mut state, _) = initial_state();
    for k in 0..state.n_cells() {
        state.field_mut(FieldKind::VelocityX)[k] = 0.01 * k as f64;
    }

    let mut writer = SnapshotWriter::new(&out, SnapshotSchedule::new(0.1, 1.0).unwrap());
    writer.prepare().unwrap();
    let path = writer.on_step(&state, 0.0, 0, true).unwrap().unwrap();
    assert_eq!(path.file_name().unwrap(), "snapshot-00000.0000");

    let restored = Checkpoint::load(&path).unwrap().restore().unwrap();

    // 采样点恰为单元中心 (-1.875 + 0.25·i)
    let h = 0.25;
    let req = SliceRequest {
        xmin: -1.875,
        xmax: -1.875 + 4.0 * h / 0.999999,
        ymin: -1.875,
        ymax: -1.875 + 4.0 * h / 0.999999,
        nx: 4,
        ny: 4,
    };
    let rows = extract_slice(&restored, &req).unwrap();
    assert_eq!(rows.len(), 25);
    let mut hits = 0;
    for row in rows {
        let k = state.mesh().locate(glam::DVec2::new(row.x, row.y)).unwrap();
        let centre = state.mesh().center(k);
        if (centre.x - row.x).abs() < 1e-9 && (centre.y - row.y).abs() < 1e-9 {
            assert!((row.vx - state.field(FieldKind::VelocityX)[k]).abs() < 1e-9);
            assert!((row.fraction - state.field(FieldKind::Fraction)[k]).abs() < 1e-9);
            hits += 1;
        }
    }
    assert_eq!(hits, 25);
}

#[test]
fn test_centroid_velocity_of_resting_droplet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot-00000.0000");
    let (state, params) = initial_state();
    Checkpoint::from_state(&state, 0.0, 0).save(&path).unwrap();

    let cp = Checkpoint::load(&path).unwrap();
    let restored = cp.restore().unwrap();
    let cv = sample_centroid_velocity(&restored, &params.properties(), cp.time).unwrap();
    assert_eq!(cv.to_string(), "0.000000 0.000000 0.000000");
}
