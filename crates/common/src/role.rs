use std::collections::HashSet;

/// Role granted to a client by the permission collaborator.
///
/// Role storage and computation live outside this subsystem; we only read the
/// resolved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Visitor,
    Builder,
    Admin,
}

/// Whether a role set grants build-mode access.
///
/// Denial is not an error anywhere in the subsystem: callers skip the
/// operation and surface a toast instead.
pub fn can_build(roles: &HashSet<Role>) -> bool {
    roles.contains(&Role::Builder) || roles.contains(&Role::Admin)
}
