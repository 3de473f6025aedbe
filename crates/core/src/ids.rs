//! Record identifiers: `prefix + epoch millis + "-" + base36 suffix`.
//!
//! Same-millisecond collisions are made implausible by the random suffix and
//! impossible within one process by remembering every id handed out.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use rand::Rng;

use crate::models::{Gender, Partition, ScoreRecord};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 5;
const MIGRATED_SUFFIX_LEN: usize = 9;

pub const MIGRATED_PREFIX: &str = "migrated-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Score created by marking attendance.
    AttendanceScore(Partition),
    /// Score awarded by a volunteer.
    ManualScore(Partition),
    /// Sewadar registered on the spot.
    Sewadar(Gender),
    /// Replacement for an imported record with a blank or duplicate id.
    Migrated,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::AttendanceScore(Partition::Gents) => "att-",
            IdKind::AttendanceScore(Partition::Ladies) => "latt-",
            IdKind::ManualScore(Partition::Gents) => "man-",
            IdKind::ManualScore(Partition::Ladies) => "lscore-",
            IdKind::Sewadar(Gender::Gents) => "G-Added-",
            IdKind::Sewadar(Gender::Ladies) => "L-Added-",
            IdKind::Migrated => MIGRATED_PREFIX,
        }
    }

    fn suffix_len(&self) -> usize {
        match self {
            IdKind::Migrated => MIGRATED_SUFFIX_LEN,
            _ => SUFFIX_LEN,
        }
    }
}

#[derive(Debug, Default)]
pub struct IdGenerator {
    issued: Mutex<HashSet<String>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_id(&self, kind: IdKind) -> String {
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            let id = format!(
                "{}{}-{}",
                kind.prefix(),
                Utc::now().timestamp_millis(),
                random_base36(kind.suffix_len())
            );
            if issued.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Marks externally sourced ids as taken so they are never generated again.
    pub fn reserve<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        issued.extend(ids.into_iter().map(str::to_string));
    }

    /// Gives every score a unique id.
    ///
    /// Scores with a blank id, or an id already seen earlier in the list, get
    /// a fresh `migrated-` id. Nothing is dropped and order is preserved.
    pub fn migrate_score_ids(&self, scores: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
        let mut seen = HashSet::with_capacity(scores.len());

        let migrated: Vec<ScoreRecord> = scores
            .into_iter()
            .map(|mut score| {
                if score.id.trim().is_empty() || seen.contains(&score.id) {
                    score.id = self.new_id(IdKind::Migrated);
                }
                seen.insert(score.id.clone());
                score
            })
            .collect();

        self.reserve(migrated.iter().map(|s| s.id.as_str()));
        migrated
    }
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

pub fn is_migrated(id: &str) -> bool {
    id.starts_with(MIGRATED_PREFIX)
}
