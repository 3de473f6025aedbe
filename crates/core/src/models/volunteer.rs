use serde::{Deserialize, Serialize};

use crate::errors::{SewaError, SewaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    Admin,
    Volunteer,
}

/// A staff operator. Static configuration; never written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Kept out of every serialized copy (cache slot, HTTP responses).
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Who may log in, and which of them are limited to awarding points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerDirectory {
    pub volunteers: Vec<Volunteer>,
    #[serde(default)]
    pub restricted_names: Vec<String>,
    #[serde(default)]
    pub super_admin_id: Option<String>,
}

impl VolunteerDirectory {
    pub fn builtin() -> Self {
        let volunteer = |id: &str, name: &str, role: Role, password: &str| Volunteer {
            id: id.to_string(),
            name: name.to_string(),
            role,
            password: password.to_string(),
        };

        Self {
            volunteers: vec![
                volunteer("admin", "Workshop Admin", Role::SuperAdmin, "skrm-admin"),
                volunteer("v1", "Harjeet Singh", Role::Admin, "sewa-101"),
                volunteer("v2", "Manpreet Kaur", Role::Volunteer, "sewa-102"),
                volunteer("v3", "Gurpreet Singh", Role::Volunteer, "sewa-103"),
                volunteer("v4", "Simran Kaur", Role::Volunteer, "sewa-104"),
            ],
            restricted_names: vec!["Gurpreet Singh".to_string(), "Simran Kaur".to_string()],
            super_admin_id: Some("admin".to_string()),
        }
    }

    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let directory: Self = serde_json::from_str(json)?;
        Ok(directory)
    }

    pub fn find(&self, id: &str) -> Option<&Volunteer> {
        self.volunteers.iter().find(|v| v.id == id)
    }

    /// Plain equality check against the configured password.
    pub fn authenticate(&self, id: &str, password: &str) -> SewaResult<Volunteer> {
        let volunteer = self
            .find(id)
            .ok_or_else(|| SewaError::NotFound(format!("Volunteer {} not found", id)))?;

        if volunteer.password != password {
            return Err(SewaError::Authentication(
                "Incorrect password. Please try again.".to_string(),
            ));
        }

        Ok(volunteer.clone())
    }

    pub fn is_restricted(&self, volunteer: &Volunteer) -> bool {
        self.restricted_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(volunteer.name.trim()))
    }

    pub fn is_super_admin(&self, volunteer: &Volunteer) -> bool {
        volunteer.role == Role::SuperAdmin
            || self.super_admin_id.as_deref() == Some(volunteer.id.as_str())
    }

    /// Display name used on reports; unknown ids fall back to a generic label.
    pub fn display_name(&self, id: &str) -> &str {
        self.find(id).map(|v| v.name.as_str()).unwrap_or("Volunteer")
    }
}

impl Default for VolunteerDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
