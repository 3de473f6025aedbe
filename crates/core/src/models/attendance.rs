use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::sewadar::Partition;

/// One sewadar marked present on one calendar day.
///
/// `(sewadar_id, date)` is the natural key: a sewadar has at most one record
/// per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub sewadar_id: String,
    #[serde(default)]
    pub name: String,
    pub date: NaiveDate,
    /// Epoch milliseconds of the marking.
    pub timestamp: i64,
    pub volunteer_id: String,
}

impl AttendanceRecord {
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.sewadar_id, self.date)
    }

    pub fn partition(&self) -> Partition {
        Partition::of(&self.sewadar_id)
    }
}
