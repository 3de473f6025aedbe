//! Which volunteer may do what.

use serde::{Deserialize, Serialize};

use crate::models::{Volunteer, VolunteerDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    MarkAttendance,
    AddSewadar,
    AwardScore,
    DeleteScore,
    ViewDashboard,
    ResyncRoster,
    BulkUnmark,
    FixDiscrepancies,
}

impl Operation {
    fn is_points_screen(&self) -> bool {
        matches!(self, Operation::AwardScore | Operation::DeleteScore)
    }

    fn needs_super_admin(&self) -> bool {
        matches!(
            self,
            Operation::ResyncRoster | Operation::BulkUnmark | Operation::FixDiscrepancies
        )
    }
}

#[derive(Debug, Clone)]
pub struct RoleGate {
    directory: VolunteerDirectory,
}

impl RoleGate {
    pub fn new(directory: VolunteerDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &VolunteerDirectory {
        &self.directory
    }

    pub fn can_act(&self, volunteer: Option<&Volunteer>, operation: Operation) -> bool {
        let Some(volunteer) = volunteer else {
            return false;
        };

        if operation.needs_super_admin() {
            return self.directory.is_super_admin(volunteer);
        }

        if self.directory.is_restricted(volunteer) {
            return operation.is_points_screen();
        }

        true
    }

    /// Operations the volunteer may perform, for hiding UI affordances.
    pub fn allowed(&self, volunteer: Option<&Volunteer>) -> Vec<Operation> {
        [
            Operation::MarkAttendance,
            Operation::AddSewadar,
            Operation::AwardScore,
            Operation::DeleteScore,
            Operation::ViewDashboard,
            Operation::ResyncRoster,
            Operation::BulkUnmark,
            Operation::FixDiscrepancies,
        ]
        .into_iter()
        .filter(|op| self.can_act(volunteer, *op))
        .collect()
    }
}
