use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Participant,
    Attendance,
    Points,
    Dashboard,
    Login,
}

impl ViewState {
    /// Views reachable without a logged-in volunteer.
    pub fn is_public(&self) -> bool {
        matches!(self, ViewState::Participant | ViewState::Login)
    }
}
