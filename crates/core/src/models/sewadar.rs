use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SewaError;

/// Id prefix that places a sewadar in the Ladies partition.
pub const LADIES_ID_PREFIX: &str = "L-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Gents,
    Ladies,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Gents => "Gents",
            Gender::Ladies => "Ladies",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = SewaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gents" => Ok(Gender::Gents),
            "Ladies" => Ok(Gender::Ladies),
            other => Err(SewaError::Validation(format!("Unknown gender: {}", other))),
        }
    }
}

/// Team a sewadar belongs to: a weekday for Gents, `Ladies` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Ladies,
}

impl Group {
    pub const GENTS: [Group; 7] = [
        Group::Monday,
        Group::Tuesday,
        Group::Wednesday,
        Group::Thursday,
        Group::Friday,
        Group::Saturday,
        Group::Sunday,
    ];

    /// Every team, weekdays first.
    pub const ALL: [Group; 8] = [
        Group::Monday,
        Group::Tuesday,
        Group::Wednesday,
        Group::Thursday,
        Group::Friday,
        Group::Saturday,
        Group::Sunday,
        Group::Ladies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Monday => "Monday",
            Group::Tuesday => "Tuesday",
            Group::Wednesday => "Wednesday",
            Group::Thursday => "Thursday",
            Group::Friday => "Friday",
            Group::Saturday => "Saturday",
            Group::Sunday => "Sunday",
            Group::Ladies => "Ladies",
        }
    }

    pub fn fits(&self, gender: Gender) -> bool {
        match gender {
            Gender::Ladies => *self == Group::Ladies,
            Gender::Gents => *self != Group::Ladies,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = SewaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| SewaError::Validation(format!("Unknown group: {}", s)))
    }
}

/// Physical storage partition, derived from the sewadar id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Gents,
    Ladies,
}

impl Partition {
    pub fn of(sewadar_id: &str) -> Self {
        if sewadar_id.starts_with(LADIES_ID_PREFIX) {
            Partition::Ladies
        } else {
            Partition::Gents
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Partition::Gents => Partition::Ladies,
            Partition::Ladies => Partition::Gents,
        }
    }
}

impl From<Gender> for Partition {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Gents => Partition::Gents,
            Gender::Ladies => Partition::Ladies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sewadar {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub group: Group,
}

impl Sewadar {
    pub fn partition(&self) -> Partition {
        Partition::of(&self.id)
    }
}
