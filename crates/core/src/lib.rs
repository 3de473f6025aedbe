//! # Sewa Core
//!
//! Domain types and rules for workshop attendance and points: sewadars,
//! attendance records, score records, volunteers and the role gate, plus the
//! identifier generator and the aggregation used by dashboards and reports.
//!
//! Nothing in this crate performs I/O.

pub mod aggregate;
pub mod errors;
pub mod ids;
pub mod models;
pub mod roles;
pub mod roster;
pub mod rules;
