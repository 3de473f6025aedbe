use serde::{Deserialize, Serialize};
use sewa_core::models::Partition;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Sewadar,
    Attendance,
    Score,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Sewadar => "sewadar",
            Entity::Attendance => "attendance",
            Entity::Score => "score",
        };
        f.write_str(name)
    }
}

/// One of the six physical tables: every entity is split into a Gents and a
/// Ladies table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Sewadars,
    LadiesSewadars,
    Attendance,
    LadiesAttendance,
    Scores,
    LadiesScores,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Sewadars,
        Table::LadiesSewadars,
        Table::Attendance,
        Table::LadiesAttendance,
        Table::Scores,
        Table::LadiesScores,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Sewadars => "sewadars",
            Table::LadiesSewadars => "ladies_sewadars",
            Table::Attendance => "attendance",
            Table::LadiesAttendance => "ladies_attendance",
            Table::Scores => "scores",
            Table::LadiesScores => "ladies_scores",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn entity(&self) -> Entity {
        match self {
            Table::Sewadars | Table::LadiesSewadars => Entity::Sewadar,
            Table::Attendance | Table::LadiesAttendance => Entity::Attendance,
            Table::Scores | Table::LadiesScores => Entity::Score,
        }
    }

    pub fn partition(&self) -> Partition {
        match self {
            Table::Sewadars | Table::Attendance | Table::Scores => Partition::Gents,
            Table::LadiesSewadars | Table::LadiesAttendance | Table::LadiesScores => {
                Partition::Ladies
            }
        }
    }

    pub fn of(entity: Entity, partition: Partition) -> Self {
        match (entity, partition) {
            (Entity::Sewadar, Partition::Gents) => Table::Sewadars,
            (Entity::Sewadar, Partition::Ladies) => Table::LadiesSewadars,
            (Entity::Attendance, Partition::Gents) => Table::Attendance,
            (Entity::Attendance, Partition::Ladies) => Table::LadiesAttendance,
            (Entity::Score, Partition::Gents) => Table::Scores,
            (Entity::Score, Partition::Ladies) => Table::LadiesScores,
        }
    }

    pub fn sewadars(partition: Partition) -> Self {
        Self::of(Entity::Sewadar, partition)
    }

    pub fn attendance(partition: Partition) -> Self {
        Self::of(Entity::Attendance, partition)
    }

    pub fn scores(partition: Partition) -> Self {
        Self::of(Entity::Score, partition)
    }

    /// Both partitions of an entity, Gents first.
    pub fn pair(entity: Entity) -> [Table; 2] {
        [
            Self::of(entity, Partition::Gents),
            Self::of(entity, Partition::Ladies),
        ]
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
