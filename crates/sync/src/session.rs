//! Who is logged in on this client and which view is showing.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use sewa_core::errors::{SewaError, SewaResult};
use sewa_core::models::{Volunteer, ViewState};
use sewa_core::roles::{Operation, RoleGate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{LocalCache, Slot};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub volunteer: Option<Volunteer>,
    pub view: ViewState,
}

pub struct Session {
    cache: Arc<dyn LocalCache>,
    origin: Uuid,
    state: Mutex<SessionState>,
}

fn view_operation(view: ViewState) -> Option<Operation> {
    match view {
        ViewState::Participant | ViewState::Login => None,
        ViewState::Attendance => Some(Operation::MarkAttendance),
        ViewState::Points => Some(Operation::AwardScore),
        ViewState::Dashboard => Some(Operation::ViewDashboard),
    }
}

impl Session {
    /// Picks up the volunteer and view persisted by an earlier run.
    pub fn restore(cache: Arc<dyn LocalCache>, origin: Uuid) -> Self {
        let volunteer = match cache.get(Slot::ActiveVolunteer) {
            Ok(Some(value)) => serde_json::from_value::<Volunteer>(value)
                .map_err(|e| warn!(error = %e, "discarding unreadable active volunteer"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read active volunteer");
                None
            }
        };

        let view = match cache.get(Slot::ActiveView) {
            Ok(Some(value)) => serde_json::from_value::<ViewState>(value).unwrap_or_default(),
            _ => ViewState::default(),
        };

        // A stale view must not outlive its volunteer.
        let view = if volunteer.is_none() && !view.is_public() {
            ViewState::default()
        } else {
            view
        };

        Self {
            cache,
            origin,
            state: Mutex::new(SessionState { volunteer, view }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn current(&self) -> SessionState {
        self.state().clone()
    }

    pub fn volunteer(&self) -> Option<Volunteer> {
        self.state().volunteer.clone()
    }

    pub fn view(&self) -> ViewState {
        self.state().view
    }

    /// Checks the password and stores volunteer and landing view together.
    pub fn login(&self, gate: &RoleGate, volunteer_id: &str, password: &str) -> SewaResult<SessionState> {
        let volunteer = gate.directory().authenticate(volunteer_id, password)?;

        let view = if gate.can_act(Some(&volunteer), Operation::MarkAttendance) {
            ViewState::Attendance
        } else {
            ViewState::Points
        };

        let entries = vec![
            (Slot::ActiveVolunteer, to_value(&volunteer)?),
            (Slot::ActiveView, to_value(&view)?),
        ];
        self.cache
            .put_many(entries, self.origin)
            .map_err(|e| SewaError::Internal(e.into()))?;

        let mut state = self.state();
        *state = SessionState {
            volunteer: Some(volunteer),
            view,
        };
        info!(volunteer = %volunteer_id, ?view, "volunteer logged in");
        Ok(state.clone())
    }

    /// Clears identity and view in one cache write.
    pub fn logout(&self) -> SewaResult<()> {
        self.cache
            .remove_many(&[Slot::ActiveVolunteer, Slot::ActiveView], self.origin)
            .map_err(|e| SewaError::Internal(e.into()))?;

        let previous = std::mem::take(&mut *self.state());
        if let Some(volunteer) = previous.volunteer {
            info!(volunteer = %volunteer.id, "volunteer logged out");
        }
        Ok(())
    }

    pub fn set_view(&self, gate: &RoleGate, view: ViewState) -> SewaResult<ViewState> {
        let mut state = self.state();

        if let Some(operation) = view_operation(view) {
            if !gate.can_act(state.volunteer.as_ref(), operation) {
                return Err(SewaError::Permission(format!("{:?} view", view)));
            }
        }

        self.cache
            .put(Slot::ActiveView, to_value(&view)?, self.origin)
            .map_err(|e| SewaError::Internal(e.into()))?;
        state.view = view;
        Ok(view)
    }
}

fn to_value<T: Serialize>(value: &T) -> SewaResult<Value> {
    serde_json::to_value(value).map_err(|e| SewaError::Internal(Box::new(e)))
}
