pub mod attendance;
pub mod dashboard;
pub mod scores;
pub mod session;
pub mod sewadars;

use sewa_core::models::Volunteer;

use crate::ApiState;

/// The volunteer every request acts as.
pub(crate) fn actor(state: &ApiState) -> Option<Volunteer> {
    state.session.volunteer()
}
