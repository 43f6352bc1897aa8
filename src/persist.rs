//! Saving and loading learned [`QTable`]s
//!
//! Snapshots are JSON documents holding the table entries alongside some training
//! metadata. Loading distinguishes a missing file, which is expected on a first run,
//! from a file that exists but cannot be used; both fall back to an empty table.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    discretize::DiscreteState,
    ds::QTable,
    gym::{Action, FlappyConfig},
    Error, Result,
};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Training progress stored next to the table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Total number of completed training episodes
    pub episodes_trained: u32,
    pub best_score: u32,
    /// Exploration rate when the snapshot was taken
    pub epsilon: f32,
    /// Game the table was trained on; its field size fixes the state bins
    #[serde(default)]
    pub game: FlappyConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub q_table: QTable,
    pub metadata: TableMetadata,
}

#[derive(Serialize, Deserialize)]
struct Entry {
    state: DiscreteState,
    action: u8,
    value: f32,
}

#[derive(Serialize, Deserialize)]
struct Document {
    version: u32,
    #[serde(default)]
    metadata: TableMetadata,
    entries: Vec<Entry>,
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = PathBuf::from(path);
    move |source| Error::Io {
        operation,
        path,
        source,
    }
}

/// Write `q_table` and `metadata` to `path`, replacing any existing file
pub fn save(path: impl AsRef<Path>, q_table: &QTable, metadata: &TableMetadata) -> Result<()> {
    let path = path.as_ref();
    let mut entries: Vec<Entry> = q_table
        .iter()
        .map(|(&(state, action), &value)| Entry {
            state,
            action: action.into(),
            value,
        })
        .collect();
    entries.sort_by_key(|e| (e.state, e.action));

    let document = Document {
        version: SNAPSHOT_VERSION,
        metadata: metadata.clone(),
        entries,
    };

    let file = File::create(path).map_err(io_error("create", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.flush().map_err(io_error("write", path))?;
    log::debug!("saved {} q-table entries to {}", q_table.len(), path.display());
    Ok(())
}

/// Read a snapshot from `path`
pub fn load(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let file = File::open(path).map_err(io_error("open", path))?;
    let document: Document = serde_json::from_reader(BufReader::new(file))?;

    if document.version != SNAPSHOT_VERSION {
        return Err(Error::UnsupportedVersion {
            found: document.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let q_table = document
        .entries
        .into_iter()
        .map(|Entry { state, action, value }| {
            Action::from_repr(action)
                .map(|a| ((state, a), value))
                .ok_or_else(|| Error::Corrupt {
                    message: format!("unknown action {action}"),
                })
        })
        .collect::<Result<QTable>>()?;

    Ok(Snapshot {
        q_table,
        metadata: document.metadata,
    })
}

/// Result of [`load_or_empty`]
#[derive(Debug)]
pub enum Loaded {
    Found(Snapshot),
    /// No file at the path
    Missing,
    /// The file exists but could not be read or parsed
    Unreadable(Error),
}

impl Loaded {
    /// The loaded snapshot, or an empty one if nothing usable was found
    pub fn into_snapshot(self) -> Snapshot {
        match self {
            Loaded::Found(snapshot) => snapshot,
            Loaded::Missing | Loaded::Unreadable(_) => Snapshot::default(),
        }
    }
}

/// Load a snapshot, classifying failures instead of propagating them
pub fn load_or_empty(path: impl AsRef<Path>) -> Loaded {
    match load(path) {
        Ok(snapshot) => Loaded::Found(snapshot),
        Err(Error::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Loaded::Missing
        }
        Err(e) => Loaded::Unreadable(e),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn sample_table(n: usize) -> QTable {
        (0..n)
            .map(|i| {
                let state = DiscreteState(i % 21, (i / 21) % 11, i % 11);
                let action = if i % 2 == 0 { Action::Idle } else { Action::Jump };
                ((state, action), i as f32 * -0.731 + 0.1)
            })
            .collect()
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q_table.json");
        let table = sample_table(150);
        let n = table.len();
        let metadata = TableMetadata {
            episodes_trained: 1200,
            best_score: 17,
            epsilon: 0.5,
            game: FlappyConfig {
                height: 600.0,
                ..Default::default()
            },
        };

        save(&path, &table, &metadata).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.q_table.len(), n, "same number of entries");
        for (&(state, action), &value) in &table {
            let restored = loaded.q_table.get(state, action);
            assert!(
                (restored - value).abs() <= f32::EPSILON * value.abs().max(1.0),
                "{state:?}/{action:?}: {value} became {restored}"
            );
        }
        assert_eq!(loaded.metadata, metadata);
    }

    #[test]
    fn missing_file_is_expected() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_or_empty(dir.path().join("absent.json"));
        assert!(matches!(loaded, Loaded::Missing));
        assert!(loaded.into_snapshot().q_table.is_empty());
    }

    #[test]
    fn corrupt_file_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"{ \"version\": 1, \"entries\": [ {").unwrap();

        let loaded = load_or_empty(&path);
        assert!(
            matches!(loaded, Loaded::Unreadable(Error::Serialization(_))),
            "parse error reported, got {loaded:?}"
        );
        assert!(loaded.into_snapshot().q_table.is_empty(), "falls back to empty");
    }

    #[test]
    fn rejects_unknown_action_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        fs::write(
            &path,
            r#"{ "version": 1, "entries": [ { "state": [1, 2, 3], "action": 7, "value": 1.0 } ] }"#,
        )
        .unwrap();
        assert!(matches!(load(&path), Err(Error::Corrupt { .. })));

        fs::write(&path, r#"{ "version": 99, "entries": [] }"#).unwrap();
        assert!(matches!(
            load(&path),
            Err(Error::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn metadata_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        fs::write(
            &path,
            r#"{ "version": 1, "entries": [ { "state": [1, 2, 3], "action": 1, "value": 2.5 } ] }"#,
        )
        .unwrap();
        let snapshot = load(&path).unwrap();
        assert_eq!(snapshot.q_table.get(DiscreteState(1, 2, 3), Action::Jump), 2.5);
        assert_eq!(snapshot.metadata, TableMetadata::default());
    }
}
