//! Business rule primitives shared by the engine and the dashboard.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::errors::{SewaError, SewaResult};
use crate::models::{
    AttendanceRecord, DAILY_ATTENDANCE, GAME_SCORE_CAP, Gender, Group, ScoreRecord,
};

/// Case-insensitive name fragments that identify placeholder or test rows.
pub const PLACEHOLDER_MARKERS: [&str; 4] = ["test", "dummy", "placeholder", "sample"];

pub fn is_placeholder_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Points for marking attendance: one flat cutoff, early arrivals earn more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPolicy {
    pub early_cutoff: NaiveTime,
    pub early_points: i32,
    pub late_points: i32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            early_cutoff: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            early_points: 100,
            late_points: 50,
        }
    }
}

impl RewardPolicy {
    pub fn with_cutoff(early_cutoff: NaiveTime) -> Self {
        Self {
            early_cutoff,
            ..Self::default()
        }
    }

    /// Parses `HH:MM` into a policy with default point values.
    pub fn parse_cutoff(value: &str) -> eyre::Result<Self> {
        let cutoff = NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map_err(|e| eyre::eyre!("Invalid cutoff {:?}: {}", value, e))?;
        Ok(Self::with_cutoff(cutoff))
    }

    pub fn is_early(&self, local_time: NaiveTime) -> bool {
        // Compare at minute granularity; seconds never push a 09:59 mark late.
        let minutes = local_time.hour() * 60 + local_time.minute();
        let cutoff = self.early_cutoff.hour() * 60 + self.early_cutoff.minute();
        minutes < cutoff
    }

    pub fn points_at(&self, local_time: NaiveTime) -> i32 {
        if self.is_early(local_time) {
            self.early_points
        } else {
            self.late_points
        }
    }

    /// Points a mark made at `timestamp_ms` should have earned.
    pub fn points_for_timestamp(&self, timestamp_ms: i64, offset: FixedOffset) -> Option<i32> {
        local_datetime(timestamp_ms, offset).map(|dt| self.points_at(dt.time()))
    }
}

pub fn local_datetime(timestamp_ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.timestamp_millis_opt(timestamp_ms).single()
}

/// Calendar day of an epoch-millisecond timestamp in the given offset.
pub fn day_of(timestamp_ms: i64, offset: FixedOffset) -> Option<NaiveDate> {
    local_datetime(timestamp_ms, offset).map(|dt| dt.date_naive())
}

/// Half-open `[start, end)` epoch-millisecond range covering one local day.
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> Option<(i64, i64)> {
    let start = offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()?;
    let next = date.succ_opt()?;
    let end = offset
        .from_local_datetime(&next.and_time(NaiveTime::MIN))
        .single()?;
    Some((start.timestamp_millis(), end.timestamp_millis()))
}

/// Validates a new sewadar and returns the trimmed name.
pub fn validate_new_sewadar(name: &str, gender: Gender, group: Group) -> SewaResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SewaError::Validation("Name cannot be blank".to_string()));
    }
    if is_placeholder_name(name) {
        return Err(SewaError::Validation(format!(
            "\"{}\" looks like placeholder data",
            name
        )));
    }
    if !group.fits(gender) {
        return Err(SewaError::Validation(format!(
            "Group {} does not match gender {}",
            group, gender
        )));
    }
    Ok(name.to_string())
}

/// Live manual awards for one sewadar in one game.
pub fn live_game_awards(scores: &[ScoreRecord], sewadar_id: &str, game: &str) -> usize {
    scores
        .iter()
        .filter(|s| {
            s.sewadar_id == sewadar_id && s.game == game && s.is_live() && !s.is_daily_attendance()
        })
        .count()
}

pub fn check_award(scores: &[ScoreRecord], sewadar_id: &str, game: &str, points: i32) -> SewaResult<()> {
    if game.trim().is_empty() {
        return Err(SewaError::Validation("Pick a game first".to_string()));
    }
    if game == DAILY_ATTENDANCE {
        return Err(SewaError::Validation(
            "Daily Attendance points come from marking attendance".to_string(),
        ));
    }
    if points <= 0 {
        return Err(SewaError::Validation("Points must be positive".to_string()));
    }
    if live_game_awards(scores, sewadar_id, game) >= GAME_SCORE_CAP {
        return Err(SewaError::Capacity(format!(
            "{} already has {} awards",
            game, GAME_SCORE_CAP
        )));
    }
    Ok(())
}

/// Points only go to sewadars marked present on `date`.
pub fn check_present(attendance: &[AttendanceRecord], sewadar_id: &str, date: NaiveDate) -> SewaResult<()> {
    if attendance
        .iter()
        .any(|a| a.sewadar_id == sewadar_id && a.date == date)
    {
        Ok(())
    } else {
        Err(SewaError::Validation(format!(
            "{} is not marked present on {}",
            sewadar_id, date
        )))
    }
}

/// `Daily Attendance` scores that belong to an attendance record's day.
pub fn is_companion_score(
    score: &ScoreRecord,
    attendance: &AttendanceRecord,
    offset: FixedOffset,
) -> bool {
    score.is_daily_attendance()
        && score.sewadar_id == attendance.sewadar_id
        && day_of(score.timestamp, offset) == Some(attendance.date)
}
