//! Checkpoint stores for saving and resuming runs.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::schema::{Checkpoint, CheckpointError, CheckpointLabel};

/// Keyed storage for checkpoints.
pub trait CheckpointStore {
    /// Persist a checkpoint under the label, replacing any previous one.
    fn save(
        &mut self,
        label: CheckpointLabel,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError>;

    /// Load the checkpoint stored under the label.
    fn load(&self, label: CheckpointLabel) -> Result<Checkpoint, CheckpointError>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for &mut S {
    fn save(
        &mut self,
        label: CheckpointLabel,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError> {
        (**self).save(label, checkpoint)
    }

    fn load(&self, label: CheckpointLabel) -> Result<Checkpoint, CheckpointError> {
        (**self).load(label)
    }
}

/// One JSON file per label inside a directory.
///
/// Writes go to a temporary sibling file that is synced and then renamed
/// over the target, so a failed write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Open a store, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, CheckpointError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the file holding the given label.
    pub fn path(&self, label: CheckpointLabel) -> PathBuf {
        self.dir.join(label.file_name())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(
        &mut self,
        label: CheckpointLabel,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError> {
        let path = self.path(label);
        let tmp = path.with_extension("json.tmp");

        let result = write_json(&tmp, checkpoint)
            .and_then(|()| fs::rename(&tmp, &path).map_err(CheckpointError::from));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn load(&self, label: CheckpointLabel) -> Result<Checkpoint, CheckpointError> {
        load_checkpoint(self.path(label)).map_err(|err| match err {
            CheckpointError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                CheckpointError::NotFound(label)
            }
            other => other,
        })
    }
}

/// Read a checkpoint file directly.
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Checkpoint, CheckpointError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json(path: &Path, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, checkpoint)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// In-memory store, mainly for tests and embedding.
///
/// Checkpoints are kept in serialized form so loads exercise the same
/// encoding as the file store.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: HashMap<CheckpointLabel, String>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, label: CheckpointLabel) -> bool {
        self.entries.contains_key(&label)
    }

    /// Stored labels, in no particular order.
    pub fn labels(&self) -> impl Iterator<Item = CheckpointLabel> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(
        &mut self,
        label: CheckpointLabel,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(checkpoint)?;
        self.entries.insert(label, json);
        Ok(())
    }

    fn load(&self, label: CheckpointLabel) -> Result<Checkpoint, CheckpointError> {
        let json = self
            .entries
            .get(&label)
            .ok_or(CheckpointError::NotFound(label))?;
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Fitness, Individual, NetworkList};
    use tempfile::tempdir;

    fn sample(generation: usize) -> Checkpoint {
        let population = vec![
            Individual::evaluated(vec![2.0, 1.0, 0.1 + 0.2], Fitness::new(1.5, 2.5, 3.5)),
            Individual::evaluated(vec![0.0, 0.0, 1.0 / 7.0], Fitness::penalty()),
        ];
        Checkpoint::capture(
            generation,
            &population,
            &NetworkList::seeded("11".to_string()),
            &[0.3, 0.01],
            &population[1..],
        )
        .unwrap()
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("cp")).unwrap();

        let cp = sample(4);
        store.save(CheckpointLabel::Generation(4), &cp).unwrap();

        assert!(store.path(CheckpointLabel::Generation(4)).exists());
        assert_eq!(store.load(CheckpointLabel::Generation(4)).unwrap(), cp);
    }

    #[test]
    fn test_file_overwrite_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let mut store = FileCheckpointStore::new(dir.path()).unwrap();

        store.save(CheckpointLabel::Final, &sample(1)).unwrap();
        store.save(CheckpointLabel::Final, &sample(2)).unwrap();

        assert_eq!(store.load(CheckpointLabel::Final).unwrap().generation, 2);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["checkpoint_final.json".to_string()]);
    }

    #[test]
    fn test_failed_write_keeps_previous_checkpoint() {
        let dir = tempdir().unwrap();
        let mut store = FileCheckpointStore::new(dir.path()).unwrap();
        let first = sample(1);
        store.save(CheckpointLabel::Final, &first).unwrap();

        // A directory in the temp file's place makes the next write fail.
        let tmp = store.path(CheckpointLabel::Final).with_extension("json.tmp");
        fs::create_dir(&tmp).unwrap();

        assert!(store.save(CheckpointLabel::Final, &sample(2)).is_err());
        assert_eq!(store.load(CheckpointLabel::Final).unwrap(), first);
    }

    #[test]
    fn test_file_missing_label() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.load(CheckpointLabel::Initial),
            Err(CheckpointError::NotFound(CheckpointLabel::Initial))
        ));
    }

    #[test]
    fn test_file_corrupt_checkpoint() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        fs::write(store.path(CheckpointLabel::Generation(1)), "{ not json").unwrap();

        assert!(matches!(
            store.load(CheckpointLabel::Generation(1)),
            Err(CheckpointError::Json(_))
        ));
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut store = MemoryCheckpointStore::new();
        let cp = sample(0);

        store.save(CheckpointLabel::Initial, &cp).unwrap();
        assert!(store.contains(CheckpointLabel::Initial));
        assert_eq!(store.load(CheckpointLabel::Initial).unwrap(), cp);
        assert!(matches!(
            store.load(CheckpointLabel::Final),
            Err(CheckpointError::NotFound(CheckpointLabel::Final))
        ));
    }

    #[test]
    fn test_load_checkpoint_by_path() {
        let dir = tempdir().unwrap();
        let mut store = FileCheckpointStore::new(dir.path()).unwrap();
        let cp = sample(3);
        store.save(CheckpointLabel::Generation(3), &cp).unwrap();

        let loaded = load_checkpoint(store.path(CheckpointLabel::Generation(3))).unwrap();
        assert_eq!(loaded, cp);
    }
}
