//! On-disk format properties: exact length, bit-for-bit round-trip,
//! validation failures, and atomic-write behaviour.

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use wavesolve_core::WaveGrid;
use wavesolve_state::{
    file_len, read_state, snapshot_name, write_state, write_state_atomic, StateError,
};

/// Fresh per-test scratch directory under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wavesolve-state-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn sample_grid(rows: u64, cols: u64) -> WaveGrid {
    let cells = (rows * cols) as usize;
    let u: Vec<f64> = (0..cells).map(|k| (k as f64) * 0.125 - 3.0).collect();
    let v: Vec<f64> = (0..cells).map(|k| ((k * 31 % 17) as f64) * 0.01).collect();
    WaveGrid::new(rows, cols, 0.1, 12.34, u, v).unwrap()
}

#[test]
fn file_length_is_exactly_header_plus_fields() {
    let dir = scratch("len");
    let path = dir.join("state.wo");
    let grid = sample_grid(7, 9);
    write_state(&grid, &path).unwrap();

    let len = fs::metadata(&path).unwrap().len();
    assert_eq!(len, file_len(7 * 9));
    assert_eq!(len, 24 + 16 + 16 * 63);
}

#[test]
fn roundtrip_preserves_every_bit() {
    let dir = scratch("roundtrip");
    let path = dir.join("state.wo");
    let grid = sample_grid(5, 6);
    write_state_atomic(&grid, &path).unwrap();

    let loaded = read_state(&path).unwrap();
    assert_eq!(loaded.rows(), 5);
    assert_eq!(loaded.cols(), 6);
    assert_eq!(loaded.damping().to_bits(), grid.damping().to_bits());
    assert_eq!(loaded.time().to_bits(), grid.time().to_bits());
    let bits = |s: &[f64]| s.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(loaded.u()), bits(grid.u()));
    assert_eq!(bits(loaded.v()), bits(grid.v()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// P3 as a property: load(write(G)) == G bit-for-bit, for arbitrary
    /// finite-header grids with arbitrary field bit patterns.
    #[test]
    fn roundtrip_property(
        rows in 3u64..12,
        cols in 3u64..12,
        damping in 0.0f64..5.0,
        time in 0.0f64..1e6,
        seed in any::<u64>(),
    ) {
        let cells = (rows * cols) as usize;
        // Deterministic but irregular bit patterns, NaNs included.
        let mut x = seed | 1;
        let mut next = || {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        };
        let u: Vec<f64> = (0..cells).map(|_| f64::from_bits(next())).collect();
        let v: Vec<f64> = (0..cells).map(|_| f64::from_bits(next())).collect();
        let grid = WaveGrid::new(rows, cols, damping, time, u, v).unwrap();

        let dir = scratch("prop");
        let path = dir.join("state.wo");
        write_state(&grid, &path).unwrap();
        let loaded = read_state(&path).unwrap();

        let bits = |s: &[f64]| s.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(loaded.u()), bits(grid.u()));
        prop_assert_eq!(bits(loaded.v()), bits(grid.v()));
        prop_assert_eq!(loaded.time().to_bits(), grid.time().to_bits());
        let _ = fs::remove_dir_all(&dir);
    }
}

#[test]
fn rejects_wrong_dimensionality() {
    let dir = scratch("dim");
    let path = dir.join("state.wo");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&3u64.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 64]);
    fs::write(&path, bytes).unwrap();

    match read_state(&path).unwrap_err() {
        StateError::UnsupportedDim { found } => assert_eq!(found, 3),
        other => panic!("expected UnsupportedDim, got {other}"),
    }
}

#[test]
fn rejects_empty_interior() {
    let dir = scratch("small");
    let path = dir.join("state.wo");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&5u64.to_le_bytes());
    bytes.extend_from_slice(&0.0f64.to_le_bytes());
    bytes.extend_from_slice(&0.0f64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    match read_state(&path).unwrap_err() {
        StateError::DomainTooSmall { rows, cols } => {
            assert_eq!((rows, cols), (2, 5));
        }
        other => panic!("expected DomainTooSmall, got {other}"),
    }
}

#[test]
fn rejects_truncated_and_oversize_files() {
    let dir = scratch("trunc");
    let path = dir.join("state.wo");
    let grid = sample_grid(4, 4);
    write_state(&grid, &path).unwrap();

    let full = fs::read(&path).unwrap();
    let expected = file_len(16);

    fs::write(&path, &full[..full.len() - 8]).unwrap();
    match read_state(&path).unwrap_err() {
        StateError::Truncated { expected: e, actual } => {
            assert_eq!(e, expected);
            assert_eq!(actual, expected - 8);
        }
        other => panic!("expected Truncated, got {other}"),
    }

    let mut oversize = full.clone();
    oversize.extend_from_slice(&[0u8; 4]);
    fs::write(&path, oversize).unwrap();
    match read_state(&path).unwrap_err() {
        StateError::TrailingData { expected: e, actual } => {
            assert_eq!(e, expected);
            assert_eq!(actual, expected + 4);
        }
        other => panic!("expected TrailingData, got {other}"),
    }

    // A file shorter than the header itself is also Truncated.
    fs::write(&path, &full[..20]).unwrap();
    assert!(matches!(
        read_state(&path).unwrap_err(),
        StateError::Truncated { .. }
    ));
}

#[test]
fn missing_file_is_bad_file() {
    let dir = scratch("missing");
    let err = read_state(&dir.join("nope.wo")).unwrap_err();
    assert!(matches!(err, StateError::BadFile { .. }));
}

#[test]
fn atomic_write_leaves_no_tmp_behind() {
    let dir = scratch("atomic");
    let path = dir.join("out.wo");
    let grid = sample_grid(5, 5);

    write_state_atomic(&grid, &path).unwrap();
    write_state_atomic(&grid, &path).unwrap(); // overwrite path

    let names: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["out.wo".to_string()]);
    assert!(read_state(&path).is_ok());
}

/// A destination that cannot be renamed over (here: a non-empty directory)
/// must surface CheckpointFailed and leave the destination untouched.
#[test]
fn blocked_rename_reports_checkpoint_failed() {
    let dir = scratch("blocked");
    let path = dir.join("out.wo");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();

    let grid = sample_grid(5, 5);
    match write_state_atomic(&grid, &path).unwrap_err() {
        StateError::CheckpointFailed { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected CheckpointFailed, got {other}"),
    }
    // The pre-existing destination survived both rename attempts.
    assert!(path.join("keep").exists());
    assert!(!wavesolve_state::writer::tmp_path(&path).exists());
}

#[test]
fn snapshot_names_are_stable() {
    assert_eq!(snapshot_name(12.34), "chk-0000012.34.wo");
}
