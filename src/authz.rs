//! Role and capability checks, enforced server-side on every mutating route.
//!
//! Roles are free-form strings assigned by administrators, so comparisons go
//! through [`normalize_role`] first: lowercase, hyphens treated as spaces,
//! runs of whitespace collapsed. A handful of normalized spellings count as
//! administrative; everyone else falls back to their per-module grants.

use crate::models::ModulePermission;

const ADMIN_ROLES: [&str; 4] = ["admin", "administrator", "lab supervisor", "supervisor"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    View,
    Edit,
    Delete,
}

/// Lowercase, hyphens to spaces, whitespace runs collapsed to one space.
pub fn normalize_role(role: &str) -> String {
    role.to_lowercase()
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Administrative roles bypass per-module grants entirely.
pub fn is_admin_role(role: &str) -> bool {
    let normalized = normalize_role(role);
    ADMIN_ROLES.contains(&normalized.as_str())
}

/// Whether the given grants allow `capability` on `module`.
///
/// A module with no grant entry is readable but not writable: staff can see
/// every screen by default, and anything destructive needs an explicit grant.
pub fn module_capability(
    permissions: &[ModulePermission],
    module: &str,
    capability: Capability,
) -> bool {
    match permissions
        .iter()
        .find(|p| p.module.eq_ignore_ascii_case(module))
    {
        Some(grant) => match capability {
            Capability::View => grant.view,
            Capability::Edit => grant.edit,
            Capability::Delete => grant.delete,
        },
        None => capability == Capability::View,
    }
}

/// Admins can do anything; others go through their module grants.
pub fn allows(
    role: &str,
    permissions: &[ModulePermission],
    module: &str,
    capability: Capability,
) -> bool {
    is_admin_role(role) || module_capability(permissions, module, capability)
}
