use serde::{Deserialize, Serialize};

/// Role recorded on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

/// Read-only view of the signed-in user, supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub role: Option<Role>,
    pub name: String,
    pub email: String,
}

impl Profile {
    #[must_use]
    pub fn new(role: Option<Role>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Only teachers and admins may finalize and persist a session.
    #[must_use]
    pub fn can_publish_results(&self) -> bool {
        matches!(self.role, Some(Role::Teacher | Role::Admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_gate_by_role() {
        let p = |role| Profile::new(role, "n", "e");
        assert!(p(Some(Role::Teacher)).can_publish_results());
        assert!(p(Some(Role::Admin)).can_publish_results());
        assert!(!p(Some(Role::Student)).can_publish_results());
        assert!(!p(None).can_publish_results());
    }
}
