use std::borrow::Cow;

use claimgate_core::{AuthFailure, AuthResult};

use crate::aliases::RoleAliases;
use crate::authorize::{check_realm_roles, check_resource_roles, validate_resource_access};
use crate::policy::RoutePolicy;
use crate::request::{RequestRecord, extract_tax_id};
use crate::tax_id::check_tax_id;
use crate::token::{decode_only, extract_bearer, verify_and_decode};
use crate::{ClaimSet, TaxIdCheck, TrustMode, ValidationOptions};

/// Outcome of an authorization call: the claim set on success.
pub type Decision = AuthResult<ClaimSet>;

/// Decision orchestrator.
///
/// Holds the per-route [`ValidationOptions`] and the alias registry. Immutable
/// after construction; share it behind an `Arc` across request handlers.
#[derive(Debug, Clone)]
pub struct Authorizer {
    options: ValidationOptions,
    aliases: Cow<'static, RoleAliases>,
}

impl Authorizer {
    /// Authorizer using the built-in alias table.
    pub fn new(options: ValidationOptions) -> Self {
        Self::build(options, Cow::Borrowed(RoleAliases::builtin()))
    }

    /// Authorizer using a custom alias table.
    pub fn with_aliases(options: ValidationOptions, aliases: RoleAliases) -> Self {
        Self::build(options, Cow::Owned(aliases))
    }

    fn build(options: ValidationOptions, aliases: Cow<'static, RoleAliases>) -> Self {
        if options.skip_verification {
            tracing::warn!("signature verification disabled; tokens are trusted as-is");
        }
        tracing::debug!(?options, aliases = aliases.len(), "authorizer configured");
        Self { options, aliases }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn aliases(&self) -> &RoleAliases {
        &self.aliases
    }

    /// Decode without verifying, then apply the configured policy.
    pub fn decode_and_authorize(&self, header: Option<&str>) -> Decision {
        self.authorize(header, TrustMode::Decode)
    }

    /// Verify the signature, then apply the configured policy.
    pub fn verify_and_authorize(&self, header: Option<&str>) -> Decision {
        self.authorize(header, TrustMode::Verify)
    }

    pub fn authorize(&self, header: Option<&str>, mode: TrustMode) -> Decision {
        let decision = self.authenticate(header, mode);
        log_decision("token", &decision);
        decision
    }

    /// Run the configured policy, then the route's own role and tax-id policy.
    ///
    /// A realm-role match on the route grants immediately, skipping the
    /// resource and tax-id checks.
    pub fn authorize_route(
        &self,
        header: Option<&str>,
        mode: TrustMode,
        policy: &RoutePolicy,
        request: &RequestRecord,
    ) -> Decision {
        let decision = self
            .authenticate(header, mode)
            .and_then(|claims| self.apply_route(claims, policy, request));
        log_decision("route", &decision);
        decision
    }

    fn authenticate(&self, header: Option<&str>, mode: TrustMode) -> Decision {
        let token = extract_bearer(header)?;
        let claims = match mode {
            TrustMode::Decode => decode_only(token)?,
            TrustMode::Verify => verify_and_decode(token, &self.options)?,
        };

        validate_resource_access(&claims)?;

        let aliases = self.options.use_aliases.then_some(self.aliases());
        let required = &self.options.required_roles;

        if let Some(resource) = self.options.required_resource.as_deref() {
            check_resource_roles(&claims, resource, required, aliases)?;
        }

        if self.options.validate_realm_roles && !required.is_empty() {
            check_realm_roles(&claims, required, aliases)?;
        }

        Ok(claims)
    }

    fn apply_route(&self, claims: ClaimSet, policy: &RoutePolicy, request: &RequestRecord) -> Decision {
        let aliases = policy.use_aliases.then_some(self.aliases());

        if !policy.realm_roles.is_empty() {
            check_realm_roles(&claims, &policy.realm_roles, aliases)?;
            return Ok(claims);
        }

        if let Some(resource) = policy.resource.as_deref() {
            if !policy.roles.is_empty() {
                check_resource_roles(&claims, resource, &policy.roles, aliases)?;
            }
        }

        if let TaxIdCheck::Enabled(options) = &policy.tax_id {
            let requested =
                extract_tax_id(request, options.param_name.as_deref(), options.param_source)
                    .ok_or_else(|| AuthFailure::TaxIdNotProvided {
                        param: options.param_label(),
                    })?;

            let bypass_roles = if options.bypass_roles.is_empty() {
                &self.options.tax_id_bypass_roles
            } else {
                &options.bypass_roles
            };
            let resource = options.resource.as_deref().or(policy.resource.as_deref());

            check_tax_id(&claims, &requested, bypass_roles, resource, self.aliases())?;
        }

        Ok(claims)
    }
}

fn log_decision(scope: &'static str, decision: &Decision) {
    match decision {
        Ok(claims) => tracing::debug!(scope, sub = %claims.sub, "access granted"),
        Err(failure) if failure.is_fault() => {
            tracing::warn!(scope, code = %failure.code(), error = %failure, "authorization misconfigured")
        }
        Err(failure) => {
            tracing::debug!(scope, code = %failure.code(), error = %failure, "access denied")
        }
    }
}
