use serde::{Deserialize, Serialize};

/// Organizational routing unit. Reception members see documents addressed
/// to their offices; the configured director receives everything the
/// office routes upward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionOffice {
    pub name: String,
    pub office_name: String,
    /// Principal id of the configured director, if any.
    pub director: Option<String>,
    /// Member principal ids (reception staff).
    pub members: Vec<String>,
}

impl ReceptionOffice {
    pub fn has_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }
}
