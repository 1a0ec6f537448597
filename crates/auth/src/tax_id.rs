use claimgate_core::{AuthFailure, AuthResult, TaxId};

use crate::aliases::RoleAliases;
use crate::authorize::{intersects, user_roles};
use crate::{ClaimSet, TaxIdOptions};

/// Check that the caller owns `requested`.
///
/// Order matters: the bypass roles are consulted before the token's own ids,
/// so a bypass holder without any tax id in the token is still granted.
pub fn validate_tax_id(
    claims: &ClaimSet,
    requested: &str,
    options: &TaxIdOptions,
    aliases: &RoleAliases,
) -> AuthResult<()> {
    check_tax_id(
        claims,
        requested,
        &options.bypass_roles,
        options.resource.as_deref(),
        aliases,
    )
}

/// Older name for [`validate_tax_id`], kept for existing callers.
pub fn validate_vendors_taxs(
    claims: &ClaimSet,
    requested: &str,
    options: &TaxIdOptions,
    aliases: &RoleAliases,
) -> AuthResult<()> {
    validate_tax_id(claims, requested, options, aliases)
}

/// Whether the caller holds one of `bypass_roles` (alias-resolved) on
/// `resource`, or in the realm when no resource applies.
pub fn has_bypass_role<S: AsRef<str>>(
    claims: &ClaimSet,
    bypass_roles: &[S],
    resource: Option<&str>,
    aliases: &RoleAliases,
) -> bool {
    !bypass_roles.is_empty() && intersects(user_roles(claims, resource), bypass_roles, Some(aliases))
}

pub(crate) fn check_tax_id<S: AsRef<str>>(
    claims: &ClaimSet,
    requested: &str,
    bypass_roles: &[S],
    resource: Option<&str>,
    aliases: &RoleAliases,
) -> AuthResult<()> {
    let Some(requested) = TaxId::parse(requested) else {
        return Err(AuthFailure::tax_id_not_provided());
    };

    if has_bypass_role(claims, bypass_roles, resource, aliases) {
        tracing::debug!(sub = %claims.sub, tax_id = %requested, "tax id check bypassed by role");
        return Ok(());
    }

    let available = claims.normalized_tax_ids();
    if available.is_empty() {
        return Err(AuthFailure::TaxIdNotInToken);
    }

    if available.contains(&requested) {
        Ok(())
    } else {
        Err(AuthFailure::TaxIdAccessDenied {
            available: available.into_iter().map(TaxId::into_inner).collect(),
        })
    }
}
