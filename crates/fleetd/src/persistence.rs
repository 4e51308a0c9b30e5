//! Snapshot persistence: the registry as a JSON document on disk.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::registry::VehicleRegistry;

const SNAPSHOT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::persistence");

/// Failures while reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("snapshot {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Loads the registry from the snapshot file.
///
/// A missing file is the normal first-run state and yields an empty
/// registry; any other read or decode failure is reported.
///
/// # Errors
///
/// Returns [`PersistenceError::Read`] on I/O failures other than a missing
/// file and [`PersistenceError::Decode`] on malformed snapshot content.
pub fn load_snapshot(path: &Path) -> Result<VehicleRegistry, PersistenceError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(
                target: SNAPSHOT_TARGET,
                path = %path.display(),
                "no snapshot found, starting with an empty collection"
            );
            return Ok(VehicleRegistry::new());
        }
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };
    let registry: VehicleRegistry =
        serde_json::from_str(&contents).map_err(|source| PersistenceError::Decode {
            path: path.display().to_string(),
            source,
        })?;
    info!(
        target: SNAPSHOT_TARGET,
        path = %path.display(),
        elements = registry.len(),
        "snapshot loaded"
    );
    Ok(registry)
}

/// Writes the registry to the snapshot file, replacing any previous content.
///
/// The parent directory must already exist; the daemon never creates
/// directories on the operator's behalf.
///
/// # Errors
///
/// Returns [`PersistenceError::Encode`] when serialisation fails and
/// [`PersistenceError::Write`] on I/O failures.
pub fn save_snapshot(path: &Path, registry: &VehicleRegistry) -> Result<(), PersistenceError> {
    let encoded = serde_json::to_string_pretty(registry).map_err(PersistenceError::Encode)?;
    fs::write(path, encoded).map_err(|source| PersistenceError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_vehicle;

    #[test]
    fn missing_snapshot_yields_an_empty_registry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let registry = load_snapshot(&dir.path().join("absent.json")).expect("load");
        assert!(registry.is_empty());
    }

    #[test]
    fn saved_snapshot_loads_back_identically() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("snapshot.json");
        let mut registry = VehicleRegistry::new();
        registry.put(5, sample_vehicle(1_234_567_890, 42));
        registry.put(9, sample_vehicle(9_876_543_210, 0));

        save_snapshot(&path, &registry).expect("save");
        let loaded = load_snapshot(&path).expect("load");
        assert_eq!(loaded, registry);
    }

    #[test]
    fn corrupt_snapshot_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{not json").expect("write");

        let error = load_snapshot(&path).expect_err("corrupt snapshot");
        assert!(matches!(error, PersistenceError::Decode { .. }));
    }

    #[test]
    fn save_into_a_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("no-such-dir").join("snapshot.json");
        let error = save_snapshot(&path, &VehicleRegistry::new()).expect_err("missing parent");
        assert!(matches!(error, PersistenceError::Write { .. }));
    }
}
