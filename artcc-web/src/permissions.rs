//! Internal permission role codes and checks

/// Full administrative access
pub const ROLE_ADMIN: &str = "admin";

/// May create and edit events
pub const ROLE_MANAGE_EVENTS: &str = "events:manage";

pub fn is_admin(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ROLE_ADMIN)
}

/// Admin supersedes every specific management role
pub fn can_manage(roles: &[String], role: &str) -> bool {
    roles.iter().any(|r| r == role) || is_admin(roles)
}

pub fn can_manage_events(roles: &[String]) -> bool {
    can_manage(roles, ROLE_MANAGE_EVENTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_admin_implies_management() {
        assert!(can_manage_events(&roles(&[ROLE_ADMIN])));
        assert!(can_manage_events(&roles(&[ROLE_MANAGE_EVENTS])));
        assert!(!can_manage_events(&roles(&["moderator"])));
        assert!(!can_manage_events(&roles(&[])));
    }
}
