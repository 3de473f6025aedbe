pub mod attendance;
pub mod dashboard;
pub mod health;
pub mod scores;
pub mod session;
pub mod sewadars;
