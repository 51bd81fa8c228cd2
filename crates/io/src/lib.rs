//! Workbook persistence: JSON snapshots on disk.

pub mod snapshot;

pub use snapshot::{from_json, load, save, to_json, SnapshotError, MAX_SNAPSHOT_BYTES};
