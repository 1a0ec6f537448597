use std::collections::HashSet;

use claimgate_core::{AuthFailure, AuthResult};

use crate::aliases::{ALL, RoleAliases};
use crate::{ClaimSet, Role, RoleRequirement};

/// Roles the caller holds on `resource`.
///
/// Falls back to realm roles when no resource is given, or when the token
/// carries no entry for it.
pub fn user_roles<'a>(claims: &'a ClaimSet, resource: Option<&str>) -> &'a [Role] {
    resource
        .and_then(|r| claims.resource_roles(r))
        .unwrap_or_else(|| claims.realm_roles())
}

pub fn has_role(claims: &ClaimSet, role: &str, resource: Option<&str>) -> bool {
    user_roles(claims, resource).iter().any(|r| r == role)
}

pub fn has_any_role<S: AsRef<str>>(claims: &ClaimSet, roles: &[S], resource: Option<&str>) -> bool {
    roles.iter().any(|r| has_role(claims, r.as_ref(), resource))
}

pub fn has_all_roles<S: AsRef<str>>(claims: &ClaimSet, roles: &[S], resource: Option<&str>) -> bool {
    roles.iter().all(|r| has_role(claims, r.as_ref(), resource))
}

/// Evaluate a [`RoleRequirement`].
///
/// - Realm roles, when listed, are the only thing evaluated.
/// - Otherwise a resource requirement checks for the grant, then the roles.
/// - An empty requirement grants.
pub fn validate_roles(
    claims: &ClaimSet,
    requirement: &RoleRequirement,
    aliases: &RoleAliases,
) -> AuthResult<()> {
    let aliases = requirement.use_aliases.then_some(aliases);

    if !requirement.realm_roles.is_empty() {
        return check_realm_roles(claims, &requirement.realm_roles, aliases);
    }

    if let Some(resource) = requirement.resource.as_deref() {
        return check_resource_roles(claims, resource, &requirement.roles, aliases);
    }

    Ok(())
}

/// The token must grant *something*: a resource entry or a realm role.
pub fn validate_resource_access(claims: &ClaimSet) -> AuthResult<()> {
    if claims.has_any_access() {
        Ok(())
    } else {
        Err(AuthFailure::NoResourceAccess)
    }
}

/// The token must carry an entry for `resource` (roles irrelevant).
pub fn validate_specific_resource(claims: &ClaimSet, resource: &str) -> AuthResult<()> {
    if claims.has_resource(resource) {
        Ok(())
    } else {
        Err(AuthFailure::resource_access_denied(resource))
    }
}

/// Any of `required` on `resource`; no alias resolution.
pub fn validate_resource_roles<S: AsRef<str>>(
    claims: &ClaimSet,
    resource: &str,
    required: &[S],
) -> AuthResult<()> {
    check_resource_roles(claims, resource, required, None)
}

/// Any of `required` in the realm; no alias resolution.
///
/// Unlike a literal role check, a list containing `ALL` grants any caller,
/// even one without realm roles.
pub fn validate_realm_roles<S: AsRef<str>>(claims: &ClaimSet, required: &[S]) -> AuthResult<()> {
    check_realm_roles(claims, required, None)
}

pub(crate) fn check_realm_roles<S: AsRef<str>>(
    claims: &ClaimSet,
    required: &[S],
    aliases: Option<&RoleAliases>,
) -> AuthResult<()> {
    if required.iter().any(|r| r.as_ref() == ALL) {
        return Ok(());
    }

    if intersects(claims.realm_roles(), required, aliases) {
        Ok(())
    } else {
        Err(AuthFailure::InsufficientRealmRoles {
            required: to_strings(required),
        })
    }
}

pub(crate) fn check_resource_roles<S: AsRef<str>>(
    claims: &ClaimSet,
    resource: &str,
    required: &[S],
    aliases: Option<&RoleAliases>,
) -> AuthResult<()> {
    let Some(granted) = claims.resource_roles(resource) else {
        return Err(AuthFailure::resource_access_denied(resource));
    };

    if required.is_empty() || intersects(granted, required, aliases) {
        Ok(())
    } else {
        Err(AuthFailure::InsufficientRoles {
            resource: resource.to_string(),
            required: to_strings(required),
        })
    }
}

/// Non-empty intersection between the granted roles and the (optionally
/// alias-expanded) requirement.
pub(crate) fn intersects<S: AsRef<str>>(
    granted: &[Role],
    required: &[S],
    aliases: Option<&RoleAliases>,
) -> bool {
    let granted: HashSet<&str> = granted.iter().map(Role::as_str).collect();

    match aliases {
        Some(aliases) => aliases
            .resolve_all(required)
            .iter()
            .any(|r| granted.contains(r.as_str())),
        None => required.iter().any(|r| granted.contains(r.as_ref())),
    }
}

fn to_strings<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values.iter().map(|v| v.as_ref().to_string()).collect()
}
