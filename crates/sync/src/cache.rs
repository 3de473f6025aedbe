//! Durable local cache of named slots.
//!
//! Every write is broadcast as a [`CacheEvent`] carrying the writer's origin so
//! other sessions sharing the same cache can reload what changed.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const CACHE_FILE: &str = "skrm_cache.json";
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    ActiveVolunteer,
    ActiveView,
    Sewadars,
    Attendance,
    Scores,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::ActiveVolunteer,
        Slot::ActiveView,
        Slot::Sewadars,
        Slot::Attendance,
        Slot::Scores,
    ];

    /// Slots holding entity collections.
    pub const COLLECTIONS: [Slot; 3] = [Slot::Sewadars, Slot::Attendance, Slot::Scores];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::ActiveVolunteer => "skrm_active_volunteer",
            Slot::ActiveView => "skrm_active_view",
            Slot::Sewadars => "skrm_sewadars_v2",
            Slot::Attendance => "skrm_attendance",
            Slot::Scores => "skrm_scores",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Slot::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn is_collection(&self) -> bool {
        Slot::COLLECTIONS.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub slots: Vec<Slot>,
    pub origin: Uuid,
}

pub trait LocalCache: Send + Sync {
    fn get(&self, slot: Slot) -> Result<Option<Value>>;

    /// Writes all entries at once; readers never see a partial write.
    fn put_many(&self, entries: Vec<(Slot, Value)>, origin: Uuid) -> Result<()>;

    /// Removes all named slots at once.
    fn remove_many(&self, slots: &[Slot], origin: Uuid) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent>;

    fn put(&self, slot: Slot, value: Value, origin: Uuid) -> Result<()> {
        self.put_many(vec![(slot, value)], origin)
    }
}

fn notify(events: &broadcast::Sender<CacheEvent>, slots: Vec<Slot>, origin: Uuid) {
    if slots.is_empty() {
        return;
    }
    debug!(?slots, %origin, "cache write");
    // Nobody listening is fine.
    let _ = events.send(CacheEvent { slots, origin });
}

pub struct MemoryCache {
    slots: Mutex<HashMap<Slot, Value>>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            slots: Mutex::new(HashMap::new()),
            events,
        }
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, slot: Slot) -> Result<Option<Value>> {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        Ok(slots.get(&slot).cloned())
    }

    fn put_many(&self, entries: Vec<(Slot, Value)>, origin: Uuid) -> Result<()> {
        let written: Vec<Slot> = entries.iter().map(|(slot, _)| *slot).collect();
        {
            let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
            slots.extend(entries);
        }
        notify(&self.events, written, origin);
        Ok(())
    }

    fn remove_many(&self, slots: &[Slot], origin: Uuid) -> Result<()> {
        {
            let mut stored = self.slots.lock().unwrap_or_else(|p| p.into_inner());
            for slot in slots {
                stored.remove(slot);
            }
        }
        notify(&self.events, slots.to_vec(), origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}

/// All slots in one JSON document, replaced atomically on every write.
pub struct FileCache {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, Value>>,
    events: broadcast::Sender<CacheEvent>,
}

impl FileCache {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create cache directory {}", dir.display()))?;

        let path = dir.join(CACHE_FILE);
        let slots = if path.exists() {
            let raw = fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .wrap_err_with(|| format!("Corrupt cache file {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Ok(Self {
            path,
            slots: Mutex::new(slots),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&self, slots: &BTreeMap<String, Value>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, slots)?;
        file.flush()?;
        file.persist(&self.path)
            .wrap_err_with(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Applies `change` to a copy and only keeps it once the file is written.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, Value>)) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        let mut next = slots.clone();
        change(&mut next);
        self.write_through(&next)?;
        *slots = next;
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, slot: Slot) -> Result<Option<Value>> {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        Ok(slots.get(slot.key()).cloned())
    }

    fn put_many(&self, entries: Vec<(Slot, Value)>, origin: Uuid) -> Result<()> {
        let written: Vec<Slot> = entries.iter().map(|(slot, _)| *slot).collect();
        self.update(|slots| {
            for (slot, value) in entries {
                slots.insert(slot.key().to_string(), value);
            }
        })?;
        notify(&self.events, written, origin);
        Ok(())
    }

    fn remove_many(&self, slots: &[Slot], origin: Uuid) -> Result<()> {
        self.update(|stored| {
            for slot in slots {
                stored.remove(slot.key());
            }
        })?;
        notify(&self.events, slots.to_vec(), origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}
