use chrono::Duration;
use std::path::PathBuf;
use tracing::{debug, trace, warn};

use super::RecordFile;
use crate::constants::{PROGRESS_CAPACITY, STORAGE_EXPIRY_DAYS};
use crate::models::ProgressKey;
use crate::utils::StorageError;

const ENTRY_SEPARATOR: char = '-';
const FIELD_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProgressEntry {
    key: ProgressKey,
    seconds: u64,
}

impl ProgressEntry {
    fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.key.series_external_id,
            self.key.episode_number,
            self.seconds,
            sep = FIELD_SEPARATOR
        )
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut fields = raw.split(FIELD_SEPARATOR);
        let series_external_id = fields.next()?.parse().ok()?;
        let episode_number = fields.next()?.parse().ok()?;
        let seconds = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            key: ProgressKey::new(series_external_id, episode_number),
            seconds,
        })
    }
}

/// Resume positions, one per (series, episode), oldest first.
///
/// The list is bounded: once it grows past its capacity the oldest entry by
/// insertion order is dropped. Updating an existing entry keeps its position.
#[derive(Debug)]
pub struct ProgressStore {
    entries: Vec<ProgressEntry>,
    capacity: usize,
    record: RecordFile,
}

impl ProgressStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::with_record(RecordFile::new(None, expiry(STORAGE_EXPIRY_DAYS)), PROGRESS_CAPACITY)
    }

    /// Open the store persisted at `path`, starting empty if nothing valid is there.
    pub fn open(path: PathBuf, capacity: usize, expiry_days: i64) -> Result<Self, StorageError> {
        let record = RecordFile::new(Some(path), expiry(expiry_days));
        let mut store = Self::with_record(record, capacity);

        if let Some(encoded) = store.record.read::<String>()? {
            store.entries = decode_list(&encoded);
            let excess = store.entries.len().saturating_sub(store.capacity);
            store.entries.drain(..excess);
            debug!(
                "Loaded {} progress entries from {:?}",
                store.entries.len(),
                store.record.path()
            );
        }

        Ok(store)
    }

    fn with_record(record: RecordFile, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            record,
        }
    }

    /// Record the resume position for `key`.
    ///
    /// Returns `false` without touching storage when the key is not fully
    /// identified or the position is zero.
    pub fn save(&mut self, key: ProgressKey, seconds: u64) -> Result<bool, StorageError> {
        if !key.is_identified() || seconds == 0 {
            trace!("Skipping progress save for {} at {}s", key, seconds);
            return Ok(false);
        }

        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.seconds = seconds,
            None => self.entries.push(ProgressEntry { key, seconds }),
        }

        while self.entries.len() > self.capacity {
            let evicted = self.entries.remove(0);
            debug!("Evicting oldest progress entry {}", evicted.key);
        }

        self.persist()?;
        Ok(true)
    }

    /// Saved position in seconds, or zero when nothing is stored.
    pub fn load(&self, key: ProgressKey) -> u64 {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.seconds)
            .unwrap_or(0)
    }

    pub fn remove(&mut self, key: ProgressKey) -> Result<bool, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        self.record.clear()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first, as `(key, seconds)`.
    pub fn entries(&self) -> impl Iterator<Item = (ProgressKey, u64)> + '_ {
        self.entries.iter().map(|entry| (entry.key, entry.seconds))
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.record.write(&encode_list(&self.entries))
    }
}

fn expiry(days: i64) -> Duration {
    Duration::days(days.max(1))
}

fn encode_list(entries: &[ProgressEntry]) -> String {
    entries
        .iter()
        .map(ProgressEntry::encode)
        .collect::<Vec<_>>()
        .join(&ENTRY_SEPARATOR.to_string())
}

fn decode_list(encoded: &str) -> Vec<ProgressEntry> {
    let mut entries: Vec<ProgressEntry> = Vec::new();
    for raw in encoded.split(ENTRY_SEPARATOR).filter(|raw| !raw.is_empty()) {
        match ProgressEntry::decode(raw) {
            Some(entry) if entry.key.is_identified() => {
                // Later duplicates overwrite in place
                match entries.iter_mut().find(|e| e.key == entry.key) {
                    Some(existing) => existing.seconds = entry.seconds,
                    None => entries.push(entry),
                }
            }
            _ => warn!("Skipping malformed progress entry {:?}", raw),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let mut store = ProgressStore::in_memory();
        let key = ProgressKey::new(9000, 3);

        assert_eq!(store.load(key), 0);
        assert!(store.save(key, 120).unwrap());
        assert_eq!(store.load(key), 120);

        assert!(store.save(key, 240).unwrap());
        assert_eq!(store.load(key), 240);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unidentified_save_is_noop() {
        let mut store = ProgressStore::in_memory();

        assert!(!store.save(ProgressKey::new(0, 3), 120).unwrap());
        assert!(!store.save(ProgressKey::new(9000, 0), 120).unwrap());
        assert!(!store.save(ProgressKey::new(9000, 3), 0).unwrap());

        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest_by_insertion() {
        let mut store = ProgressStore::in_memory();
        for episode in 1..=20 {
            store.save(ProgressKey::new(1, episode), 60).unwrap();
        }
        assert_eq!(store.len(), 20);

        // Updating an old entry does not move it to the back
        store.save(ProgressKey::new(1, 1), 90).unwrap();
        store.save(ProgressKey::new(1, 21), 60).unwrap();

        assert_eq!(store.len(), 20);
        assert_eq!(store.load(ProgressKey::new(1, 1)), 0);
        assert_eq!(store.load(ProgressKey::new(1, 2)), 60);
        assert_eq!(store.load(ProgressKey::new(1, 21)), 60);
    }

    #[test]
    fn test_remove() {
        let mut store = ProgressStore::in_memory();
        let key = ProgressKey::new(9000, 3);
        store.save(key, 300).unwrap();

        assert!(store.remove(key).unwrap());
        assert!(!store.remove(key).unwrap());
        assert_eq!(store.load(key), 0);
    }

    #[test]
    fn test_persists_delimited_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watching_time.json");

        {
            let mut store = ProgressStore::open(path.clone(), 20, 30).unwrap();
            store.save(ProgressKey::new(9000, 3), 120).unwrap();
            store.save(ProgressKey::new(9000, 4), 33).unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("9000.3.120-9000.4.33"));

        let store = ProgressStore::open(path, 20, 30).unwrap();
        assert_eq!(store.load(ProgressKey::new(9000, 3)), 120);
        assert_eq!(store.load(ProgressKey::new(9000, 4)), 33);
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let entries = decode_list("1.2.3--x.y.z-0.5.10-4.5-7.8.9.10-1.2.30");
        assert_eq!(
            entries,
            vec![ProgressEntry {
                key: ProgressKey::new(1, 2),
                seconds: 30
            }]
        );
    }
}
