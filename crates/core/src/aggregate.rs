//! Point totals and attendance counts. Soft-deleted scores never count.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, Group, ScoreRecord, Sewadar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub group: Group,
    pub present: usize,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub sewadar_id: String,
    pub name: String,
    pub group: Group,
    pub points: i64,
    pub breakdown: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub present: usize,
    pub roster_size: usize,
    pub groups: Vec<GroupStats>,
    /// Teams ordered by points, highest first.
    pub leaderboard: Vec<GroupStats>,
    pub standings: Vec<Standing>,
}

pub fn live_points<'a>(scores: impl IntoIterator<Item = &'a ScoreRecord>) -> i64 {
    scores
        .into_iter()
        .filter(|s| s.is_live())
        .map(|s| i64::from(s.points))
        .sum()
}

pub fn sewadar_total(scores: &[ScoreRecord], sewadar_id: &str) -> i64 {
    live_points(scores.iter().filter(|s| s.sewadar_id == sewadar_id))
}

pub fn game_total(scores: &[ScoreRecord], sewadar_id: &str, game: &str) -> i64 {
    live_points(
        scores
            .iter()
            .filter(|s| s.sewadar_id == sewadar_id && s.game == game),
    )
}

pub fn game_breakdown(scores: &[ScoreRecord], sewadar_id: &str) -> BTreeMap<String, i64> {
    let mut breakdown = BTreeMap::new();
    for score in scores
        .iter()
        .filter(|s| s.sewadar_id == sewadar_id && s.is_live())
    {
        *breakdown.entry(score.game.clone()).or_insert(0) += i64::from(score.points);
    }
    breakdown
}

pub fn present_on(attendance: &[AttendanceRecord], date: NaiveDate) -> usize {
    attendance.iter().filter(|a| a.date == date).count()
}

pub fn group_stats(
    sewadars: &[Sewadar],
    attendance: &[AttendanceRecord],
    scores: &[ScoreRecord],
    date: NaiveDate,
) -> Vec<GroupStats> {
    let group_of: HashMap<&str, Group> = sewadars
        .iter()
        .map(|s| (s.id.as_str(), s.group))
        .collect();

    Group::ALL
        .into_iter()
        .map(|group| {
            let in_group = |id: &str| group_of.get(id) == Some(&group);
            let present = attendance
                .iter()
                .filter(|a| a.date == date && in_group(&a.sewadar_id))
                .count();
            let points = live_points(scores.iter().filter(|s| in_group(&s.sewadar_id)));
            GroupStats {
                group,
                present,
                points,
            }
        })
        .collect()
}

pub fn leaderboard(groups: &[GroupStats]) -> Vec<GroupStats> {
    let mut ranked = groups.to_vec();
    ranked.sort_by(|a, b| b.points.cmp(&a.points));
    ranked
}

/// Sewadars with points, ranked within the roster order of their group.
pub fn standings(sewadars: &[Sewadar], scores: &[ScoreRecord]) -> Vec<Standing> {
    let mut standings: Vec<Standing> = sewadars
        .iter()
        .map(|s| Standing {
            sewadar_id: s.id.clone(),
            name: s.name.clone(),
            group: s.group,
            points: sewadar_total(scores, &s.id),
            breakdown: game_breakdown(scores, &s.id),
        })
        .filter(|s| s.points > 0)
        .collect();

    standings.sort_by(|a, b| a.group.cmp(&b.group).then(b.points.cmp(&a.points)));
    standings
}

/// Sewadars present on `date`, sorted by name.
pub fn present_sewadars<'a>(
    sewadars: &'a [Sewadar],
    attendance: &[AttendanceRecord],
    date: NaiveDate,
) -> Vec<&'a Sewadar> {
    let present: HashSet<&str> = attendance
        .iter()
        .filter(|a| a.date == date)
        .map(|a| a.sewadar_id.as_str())
        .collect();

    let mut list: Vec<&Sewadar> = sewadars
        .iter()
        .filter(|s| present.contains(s.id.as_str()))
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

pub fn summarize(
    sewadars: &[Sewadar],
    attendance: &[AttendanceRecord],
    scores: &[ScoreRecord],
    date: NaiveDate,
) -> DashboardSummary {
    let groups = group_stats(sewadars, attendance, scores, date);
    DashboardSummary {
        date,
        present: present_on(attendance, date),
        roster_size: sewadars.len(),
        leaderboard: leaderboard(&groups),
        groups,
        standings: standings(sewadars, scores),
    }
}
