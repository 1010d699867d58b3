use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::{Result, StorageError, TaskError};
use crate::task::ActiveTask;

const KEY_SEPARATOR: &str = "->";
const DAY_FORMAT: &str = "%Y-%m-%d";
const CURRENT_TASK_FILE: &str = "current_task.json";
const ARCHIVE_DIR: &str = "archive";

/// Day-scoped archive identity, rendered as `YYYY-MM-DD->NNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveKey {
    pub day: NaiveDate,
    pub seq: u32,
}

impl ArchiveKey {
    pub fn new(day: NaiveDate, seq: u32) -> Self {
        Self { day, seq }
    }

    /// The prefix every key of `day` starts with.
    pub fn day_prefix(day: NaiveDate) -> String {
        format!("{}{KEY_SEPARATOR}", day.format(DAY_FORMAT))
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", Self::day_prefix(self.day), self.seq)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed archive key `{0}`")]
pub struct ParseKeyError(String);

impl FromStr for ArchiveKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseKeyError(s.to_string());
        let (day, seq) = s.split_once(KEY_SEPARATOR).ok_or_else(malformed)?;
        let day = NaiveDate::parse_from_str(day, DAY_FORMAT).map_err(|_| malformed())?;
        if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let seq = seq.parse().map_err(|_| malformed())?;
        Ok(Self { day, seq })
    }
}

/// Durable home for the current-task slot and the append-only day archive.
pub trait TaskBackend {
    fn load_current(&self) -> Result<Option<ActiveTask>, StorageError>;
    /// Overwrites the slot wholesale; `None` empties it.
    fn save_current(&mut self, task: Option<&ActiveTask>) -> Result<(), StorageError>;
    /// Appends an archive record. Existing keys are never overwritten.
    fn insert(&mut self, key: ArchiveKey, task: &ActiveTask) -> Result<(), StorageError>;
    /// All records archived on `day`, in key order.
    fn scan_day(&self, day: NaiveDate) -> Result<Vec<ActiveTask>, StorageError>;
}

/// In-process backend. `set_unavailable(true)` makes every call fail like a lost store;
/// `fail_next_saves(n)` fails only the next `n` slot writes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    current: Option<ActiveTask>,
    archive: BTreeMap<ArchiveKey, ActiveTask>,
    unavailable: bool,
    failing_saves: u32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn fail_next_saves(&mut self, count: u32) {
        self.failing_saves = count;
    }

    pub fn archived_len(&self) -> usize {
        self.archive.len()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Io {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::NotConnected, "store unavailable"),
            });
        }
        Ok(())
    }
}

impl TaskBackend for MemoryBackend {
    fn load_current(&self) -> Result<Option<ActiveTask>, StorageError> {
        self.check_available()?;
        Ok(self.current.clone())
    }

    fn save_current(&mut self, task: Option<&ActiveTask>) -> Result<(), StorageError> {
        self.check_available()?;
        if self.failing_saves > 0 {
            self.failing_saves -= 1;
            return Err(StorageError::Io {
                path: PathBuf::from("<memory>/current"),
                source: io::Error::other("slot write failed"),
            });
        }
        self.current = task.cloned();
        Ok(())
    }

    fn insert(&mut self, key: ArchiveKey, task: &ActiveTask) -> Result<(), StorageError> {
        self.check_available()?;
        if self.archive.contains_key(&key) {
            return Err(StorageError::DuplicateKey(key.to_string()));
        }
        self.archive.insert(key, task.clone());
        Ok(())
    }

    fn scan_day(&self, day: NaiveDate) -> Result<Vec<ActiveTask>, StorageError> {
        self.check_available()?;
        Ok(self
            .archive
            .range(ArchiveKey::new(day, 0)..=ArchiveKey::new(day, u32::MAX))
            .map(|(_, task)| task.clone())
            .collect())
    }
}

/// Files under one state directory:
/// `current_task.json` for the slot and `archive/YYYY-MM-DD.jsonl` per day.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let archive = root.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive).map_err(|source| StorageError::Io {
            path: archive.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_TASK_FILE)
    }

    fn day_path(&self, day: NaiveDate) -> PathBuf {
        self.root
            .join(ARCHIVE_DIR)
            .join(format!("{}.jsonl", day.format(DAY_FORMAT)))
    }
}

impl TaskBackend for FileBackend {
    fn load_current(&self) -> Result<Option<ActiveTask>, StorageError> {
        let path = self.current_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&text).map_err(|source| StorageError::Corrupt { path, source })
    }

    fn save_current(&mut self, task: Option<&ActiveTask>) -> Result<(), StorageError> {
        let path = self.current_path();
        let Some(task) = task else {
            return match fs::remove_file(&path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    Err(StorageError::Io { path, source: err })
                }
                _ => Ok(()),
            };
        };
        let json = serde_json::to_string_pretty(task).map_err(StorageError::Encode)?;
        atomic_write(&path, json.as_bytes()).map_err(|source| StorageError::Io { path, source })
    }

    fn insert(&mut self, key: ArchiveKey, task: &ActiveTask) -> Result<(), StorageError> {
        let key_text = key.to_string();
        if self
            .scan_day(key.day)?
            .iter()
            .any(|existing| existing.id.as_deref() == Some(key_text.as_str()))
        {
            return Err(StorageError::DuplicateKey(key_text));
        }

        let path = self.day_path(key.day);
        let mut line = serde_json::to_string(task).map_err(StorageError::Encode)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| StorageError::Io { path, source })
    }

    fn scan_day(&self, day: NaiveDate) -> Result<Vec<ActiveTask>, StorageError> {
        let path = self.day_path(day);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let mut keyed = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let task: ActiveTask = serde_json::from_str(line).map_err(|source| {
                StorageError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            let key = task.id.as_deref().and_then(|id| id.parse::<ArchiveKey>().ok());
            keyed.push((key, task));
        }
        keyed.sort_by_key(|(key, _)| *key);
        Ok(keyed.into_iter().map(|(_, task)| task).collect())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    if let Err(err) = fs::rename(&tmp, path) {
        tracing::warn!(%err, path = %path.display(), "rename failed; copying over the slot instead");
        fs::copy(&tmp, path)?;
        if let Err(err) = fs::remove_file(&tmp) {
            tracing::warn!(%err, tmp = %tmp.display(), "could not remove temporary slot file");
        }
    }
    Ok(())
}

/// Current-task slot plus the day archive, with per-day sequence counters.
#[derive(Debug)]
pub struct TaskStore<B> {
    backend: B,
    next_seq: HashMap<NaiveDate, u32>,
}

impl<B: TaskBackend> TaskStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            next_seq: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn current_task(&self) -> Result<Option<ActiveTask>> {
        Ok(self.backend.load_current()?)
    }

    pub fn set_current_task(&mut self, task: Option<&ActiveTask>) -> Result<()> {
        Ok(self.backend.save_current(task)?)
    }

    /// Next free key for `day`. The archive is scanned at most once per day;
    /// after that the counter is kept in memory.
    pub fn next_key(&mut self, day: NaiveDate) -> Result<ArchiveKey> {
        if let Some(&seq) = self.next_seq.get(&day) {
            return Ok(ArchiveKey::new(day, seq));
        }
        let max_seq = self
            .backend
            .scan_day(day)?
            .iter()
            .filter_map(|task| task.id.as_deref())
            .filter_map(|id| match id.parse::<ArchiveKey>() {
                Ok(key) if key.day == day => Some(key.seq),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(%err, "skipping archive record with unreadable id");
                    None
                }
            })
            .max()
            .unwrap_or(0);
        let seq = max_seq.saturating_add(1);
        self.next_seq.insert(day, seq);
        Ok(ArchiveKey::new(day, seq))
    }

    /// Assigns the task its archive identity and appends it under `day`.
    pub fn archive(&mut self, task: &ActiveTask, day: NaiveDate) -> Result<ArchiveKey> {
        if let Some(id) = &task.id {
            return Err(TaskError::UpdateUnsupported(id.clone()));
        }
        let key = self.next_key(day)?;
        let mut record = task.clone();
        record.id = Some(key.to_string());

        match self.backend.insert(key, &record) {
            Ok(()) => {
                self.next_seq.insert(day, key.seq.saturating_add(1));
                tracing::info!(key = %key, task = %record.name, "archived task");
                Ok(key)
            }
            Err(err) => {
                // Someone else may have written this day; rescan next time.
                self.next_seq.remove(&day);
                Err(err.into())
            }
        }
    }

    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<ActiveTask>> {
        Ok(self.backend.scan_day(day)?)
    }
}
