//! `claimgate-auth`: claim evaluation for bearer credentials.
//!
//! This crate is intentionally decoupled from HTTP: a host adapter passes the
//! raw `Authorization` header value and a [`RequestRecord`], and maps the
//! returned [`Decision`] onto its transport.
//!
//! - [`token`]: bearer extraction, decode-only and verified decoding
//! - [`authorize`]: resource- and realm-scoped role evaluation
//! - [`tax_id`]: tax-identity ownership with role bypass
//! - [`Authorizer`]: the orchestrated pipeline and per-route composition

pub mod aliases;
pub mod authorize;
pub mod authorizer;
pub mod claims;
pub mod options;
pub mod policy;
pub mod request;
pub mod roles;
pub mod tax_id;
pub mod token;

pub use aliases::{ALL, RoleAliases, resolve_alias, resolve_aliases};
pub use authorize::{
    has_all_roles, has_any_role, has_role, user_roles, validate_realm_roles,
    validate_resource_access, validate_resource_roles, validate_roles, validate_specific_resource,
};
pub use authorizer::{Authorizer, Decision};
pub use claims::{Audience, ClaimSet, RealmAccess, ResourceAccess, VendorOperation, VendorTax};
pub use options::{
    KeyMaterial, OneOrMany, ParamSource, RoleRequirement, TaxIdCheck, TaxIdOptions,
    ValidationOptions,
};
pub use policy::{PolicyMap, RoutePolicy};
pub use request::{RequestRecord, extract_tax_id, extract_value};
pub use roles::Role;
pub use tax_id::{has_bypass_role, validate_tax_id, validate_vendors_taxs};
pub use token::{decode_only, extract_bearer, verify_and_decode};

pub use claimgate_core::{AuthFailure, AuthResult, ErrorCode, FailureBody, TaxId, normalize_tax_id};

/// Which decoding step the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustMode {
    /// Verify the signature against the configured key.
    #[default]
    Verify,
    /// Trust an upstream gateway; decode only.
    Decode,
}
