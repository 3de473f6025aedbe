//! The synchronized state layer.
//!
//! [`Store`] holds the canonical in-memory collections and mirrors them into a
//! [`LocalCache`]. [`Engine`] keeps that store convergent with a shared
//! [`sewa_db::RemoteStore`] and runs every volunteer operation through the role
//! gate and the business rules before writing.

pub mod cache;
pub mod clock;
pub mod confirm;
pub mod engine;
pub mod session;
pub mod store;

pub use cache::{CacheEvent, FileCache, LocalCache, MemoryCache, Slot};
pub use clock::{Clock, FixedClock, SystemClock};
pub use confirm::{Confirmation, Tap};
pub use engine::{AttendanceOutcome, DayReset, Engine, Registration, Repair, SyncMode};
pub use session::{Session, SessionState};
pub use store::{EntityStore, Snapshot, Store};
