use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sewa_core::models::{AttendanceRecord, ScoreRecord, Sewadar};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SewadarRow {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRow {
    pub sewadar_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub timestamp: i64,
    pub volunteer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScoreRow {
    pub id: String,
    pub sewadar_id: String,
    pub name: String,
    pub game: String,
    pub points: i32,
    pub timestamp: i64,
    pub volunteer_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl From<&Sewadar> for SewadarRow {
    fn from(sewadar: &Sewadar) -> Self {
        Self {
            id: sewadar.id.clone(),
            name: sewadar.name.clone(),
            gender: sewadar.gender.to_string(),
            group: sewadar.group.to_string(),
        }
    }
}

impl TryFrom<SewadarRow> for Sewadar {
    type Error = eyre::Report;

    fn try_from(row: SewadarRow) -> Result<Self, Self::Error> {
        Ok(Sewadar {
            gender: row
                .gender
                .parse()
                .map_err(|e| eyre::eyre!("Sewadar {}: {}", row.id, e))?,
            group: row
                .group
                .parse()
                .map_err(|e| eyre::eyre!("Sewadar {}: {}", row.id, e))?,
            id: row.id,
            name: row.name,
        })
    }
}

impl From<&AttendanceRecord> for AttendanceRow {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            sewadar_id: record.sewadar_id.clone(),
            name: record.name.clone(),
            date: record.date,
            timestamp: record.timestamp,
            volunteer_id: record.volunteer_id.clone(),
        }
    }
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        Self {
            sewadar_id: row.sewadar_id,
            name: row.name,
            date: row.date,
            timestamp: row.timestamp,
            volunteer_id: row.volunteer_id,
        }
    }
}

impl From<&ScoreRecord> for ScoreRow {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            id: record.id.clone(),
            sewadar_id: record.sewadar_id.clone(),
            name: record.name.clone(),
            game: record.game.clone(),
            points: record.points,
            timestamp: record.timestamp,
            volunteer_id: record.volunteer_id.clone(),
            is_deleted: record.is_deleted,
        }
    }
}

impl From<ScoreRow> for ScoreRecord {
    fn from(row: ScoreRow) -> Self {
        Self {
            id: row.id,
            sewadar_id: row.sewadar_id,
            name: row.name,
            game: row.game,
            points: row.points,
            timestamp: row.timestamp,
            volunteer_id: row.volunteer_id,
            is_deleted: row.is_deleted,
        }
    }
}
