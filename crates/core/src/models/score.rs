use serde::{Deserialize, Serialize};

use super::sewadar::Partition;

/// Game label of the score created alongside an attendance mark.
pub const DAILY_ATTENDANCE: &str = "Daily Attendance";

/// Games volunteers can award points for.
pub const GAMES: [&str; 8] = [
    "Spiritual Quiz",
    "Chess",
    "Carrom Board",
    "Tambola",
    "Break the glass",
    "Ludo",
    "Volleyball",
    "Cricket",
];

/// Maximum live awards per sewadar per game.
pub const GAME_SCORE_CAP: usize = 5;

/// Points for a single game award.
pub const DEFAULT_GAME_POINTS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    /// Older cached lists may lack ids; see `ids::migrate_score_ids`.
    #[serde(default)]
    pub id: String,
    pub sewadar_id: String,
    #[serde(default)]
    pub name: String,
    pub game: String,
    pub points: i32,
    pub timestamp: i64,
    pub volunteer_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl ScoreRecord {
    pub fn is_daily_attendance(&self) -> bool {
        self.game == DAILY_ATTENDANCE
    }

    /// Counts toward totals.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    pub fn partition(&self) -> Partition {
        Partition::of(&self.sewadar_id)
    }
}
