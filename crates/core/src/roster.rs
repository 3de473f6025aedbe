//! Static roster used to seed the sewadar tables.

use crate::models::{Gender, Group, Sewadar};
use crate::rules::is_placeholder_name;

const GENTS_SEED: &[(&str, Group, &str)] = &[
    ("G-MON-01", Group::Monday, "Amarjit Singh"),
    ("G-MON-02", Group::Monday, "Baldev Singh"),
    ("G-MON-03", Group::Monday, "Test Sewadar"),
    ("G-TUE-01", Group::Tuesday, "Charanjit Singh"),
    ("G-TUE-02", Group::Tuesday, "Daljit Singh"),
    ("G-WED-01", Group::Wednesday, "Gurdev Singh"),
    ("G-WED-02", Group::Wednesday, "Harbhajan Singh"),
    ("G-THU-01", Group::Thursday, "Inderjit Singh"),
    ("G-THU-02", Group::Thursday, "Jagdish Kumar"),
    ("G-FRI-01", Group::Friday, "Kuldeep Singh"),
    ("G-FRI-02", Group::Friday, "Lakhwinder Singh"),
    ("G-SAT-01", Group::Saturday, "Mohinder Pal"),
    ("G-SAT-02", Group::Saturday, "Narinder Singh"),
    ("G-SUN-01", Group::Sunday, "Paramjit Singh"),
    ("G-SUN-02", Group::Sunday, "Rajinder Kumar"),
];

const LADIES_SEED: &[(&str, &str)] = &[
    ("L-01", "Amandeep Kaur"),
    ("L-02", "Baljinder Kaur"),
    ("L-03", "Charanjit Kaur"),
    ("L-04", "Dummy Entry"),
    ("L-05", "Gurmeet Kaur"),
    ("L-06", "Harpreet Kaur"),
    ("L-07", "Jasvir Kaur"),
];

/// The full seed list, placeholder rows included.
pub fn seed_roster() -> Vec<Sewadar> {
    let gents = GENTS_SEED.iter().map(|(id, group, name)| Sewadar {
        id: id.to_string(),
        name: name.to_string(),
        gender: Gender::Gents,
        group: *group,
    });
    let ladies = LADIES_SEED.iter().map(|(id, name)| Sewadar {
        id: id.to_string(),
        name: name.to_string(),
        gender: Gender::Ladies,
        group: Group::Ladies,
    });
    gents.chain(ladies).collect()
}

pub fn from_json(json: &str) -> eyre::Result<Vec<Sewadar>> {
    let roster: Vec<Sewadar> = serde_json::from_str(json)?;
    Ok(roster)
}

pub fn without_placeholders(roster: Vec<Sewadar>) -> Vec<Sewadar> {
    roster
        .into_iter()
        .filter(|s| !is_placeholder_name(&s.name))
        .collect()
}
