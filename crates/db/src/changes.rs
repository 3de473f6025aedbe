//! Row-level change notifications.
//!
//! The wire shape is `{table, eventType, new, old}`; it is decoded into a typed
//! [`ChangeEvent`] so subscribers handle each entity with its own row type.

use std::sync::RwLock;

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::models::{AttendanceRow, ScoreRow, SewadarRow};
use crate::tables::{Entity, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange<T> {
    Insert(T),
    Update { new: T, old: Option<T> },
    Delete(T),
}

impl<T> RowChange<T> {
    pub fn event_type(&self) -> EventType {
        match self {
            RowChange::Insert(_) => EventType::Insert,
            RowChange::Update { .. } => EventType::Update,
            RowChange::Delete(_) => EventType::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Sewadar {
        table: Table,
        change: RowChange<SewadarRow>,
    },
    Attendance {
        table: Table,
        change: RowChange<AttendanceRow>,
    },
    Score {
        table: Table,
        change: RowChange<ScoreRow>,
    },
}

impl ChangeEvent {
    pub fn table(&self) -> Table {
        match self {
            ChangeEvent::Sewadar { table, .. }
            | ChangeEvent::Attendance { table, .. }
            | ChangeEvent::Score { table, .. } => *table,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            ChangeEvent::Sewadar { change, .. } => change.event_type(),
            ChangeEvent::Attendance { change, .. } => change.event_type(),
            ChangeEvent::Score { change, .. } => change.event_type(),
        }
    }
}

/// Broadcast fan-out of [`ChangeEvent`]s that can be restarted.
///
/// [`ChangeFeed::restart`] swaps in a fresh channel. Existing receivers then
/// see `RecvError::Closed` and know they may have missed changes.
pub struct ChangeFeed {
    capacity: usize,
    sender: RwLock<broadcast::Sender<ChangeEvent>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            capacity,
            sender: RwLock::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .subscribe()
    }

    /// Returns how many receivers got the event.
    pub fn send(&self, event: ChangeEvent) -> usize {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send(event)
            .unwrap_or(0)
    }

    pub fn restart(&self) {
        let (sender, _) = broadcast::channel(self.capacity);
        let mut current = self
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Dropping the old sender closes every receiver subscribed to it.
        *current = sender;
    }
}

/// Notification as published by the database trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChange {
    pub table: String,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(default)]
    pub new: Option<Value>,
    #[serde(default)]
    pub old: Option<Value>,
}

impl RawChange {
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).wrap_err("Malformed change notification")
    }
}

fn decode<T: DeserializeOwned>(event_type: EventType, new: Option<Value>, old: Option<Value>) -> Result<RowChange<T>> {
    let row = |value: Option<Value>, side: &str| -> Result<T> {
        let value = value.ok_or_else(|| eyre!("{:?} notification without {} row", event_type, side))?;
        serde_json::from_value(value).wrap_err_with(|| format!("Invalid {} row", side))
    };

    Ok(match event_type {
        EventType::Insert => RowChange::Insert(row(new, "new")?),
        EventType::Update => RowChange::Update {
            new: row(new, "new")?,
            old: old.and_then(|v| serde_json::from_value(v).ok()),
        },
        EventType::Delete => RowChange::Delete(row(old, "old")?),
    })
}

impl TryFrom<RawChange> for ChangeEvent {
    type Error = eyre::Report;

    fn try_from(raw: RawChange) -> Result<Self> {
        let table = Table::from_name(&raw.table)
            .ok_or_else(|| eyre!("Notification for unknown table {}", raw.table))?;

        Ok(match table.entity() {
            Entity::Sewadar => ChangeEvent::Sewadar {
                table,
                change: decode(raw.event_type, raw.new, raw.old)?,
            },
            Entity::Attendance => ChangeEvent::Attendance {
                table,
                change: decode(raw.event_type, raw.new, raw.old)?,
            },
            Entity::Score => ChangeEvent::Score {
                table,
                change: decode(raw.event_type, raw.new, raw.old)?,
            },
        })
    }
}
