use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Directory record for a principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Principal id (email-style, matches the session user).
    pub name: String,
    pub full_name: String,
    pub user_image: Option<String>,
    pub enabled: bool,
    pub roles: Vec<Role>,
    /// Sort key for the fiska executor list; lower sorts earlier, ties
    /// keep declaration order.
    pub fiska_priority: i64,
}

impl UserProfile {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
