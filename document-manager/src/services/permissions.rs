use std::collections::HashSet;

pub trait PermissionChecker: Send + Sync {
    fn has_role(&self, role: &str) -> bool;
}

/// Fixed role set, typically taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    roles: HashSet<String>,
}

impl StaticPermissions {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl PermissionChecker for StaticPermissions {
    fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
