//! Per-call policy configuration.
//!
//! Everything here is supplied by the host (route configuration), never by the
//! request. All types deserialize with field defaults so they can be loaded
//! from any serde format.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Validation options (credential + orchestrator policy)
// ─────────────────────────────────────────────────────────────────────────────

/// Options for the two orchestrator entry points.
///
/// When `skip_verification` is false, at least one of `jwt_secret` /
/// `public_key` must be present; otherwise verification fails with
/// `INVALID_CONFIG`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Shared HMAC secret (HS256/384/512).
    pub jwt_secret: Option<String>,

    /// PEM-encoded public key (RSA, EC or Ed25519). Takes precedence over
    /// `jwt_secret` when both are set.
    pub public_key: Option<String>,

    /// Decode without checking the signature. Development only.
    pub skip_verification: bool,

    pub issuer: Option<String>,

    pub audience: Option<OneOrMany<String>>,

    /// Resource (client) the token must carry a grant for.
    pub required_resource: Option<String>,

    /// Roles required on `required_resource` (and on the realm when
    /// `validate_realm_roles` is set). Any one of them is sufficient.
    pub required_roles: Vec<String>,

    pub validate_realm_roles: bool,

    /// Roles exempting the caller from tax-id ownership checks.
    pub tax_id_bypass_roles: Vec<String>,

    /// Resolve `required_roles` through the alias registry.
    pub use_aliases: bool,

    /// Leeway applied to `exp` / `nbf`, in seconds.
    pub clock_skew_secs: u64,
}

/// Verification material selected from [`ValidationOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial<'a> {
    PublicKeyPem(&'a str),
    SharedSecret(&'a [u8]),
}

impl ValidationOptions {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn with_public_key(pem: impl Into<String>) -> Self {
        Self {
            public_key: Some(pem.into()),
            ..Self::default()
        }
    }

    /// Options that decode without verifying. Never use in production.
    pub fn insecure_skip_verification() -> Self {
        Self {
            skip_verification: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn audience(mut self, audience: impl Into<OneOrMany<String>>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    #[must_use]
    pub fn require_resource(mut self, resource: impl Into<String>) -> Self {
        self.required_resource = Some(resource.into());
        self
    }

    #[must_use]
    pub fn require_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn check_realm_roles(mut self) -> Self {
        self.validate_realm_roles = true;
        self
    }

    #[must_use]
    pub fn tax_id_bypass<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tax_id_bypass_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn resolve_aliases(mut self) -> Self {
        self.use_aliases = true;
        self
    }

    /// Key used for verification; the public key wins over the secret.
    pub fn key_material(&self) -> Option<KeyMaterial<'_>> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        non_empty(&self.public_key)
            .map(KeyMaterial::PublicKeyPem)
            .or_else(|| non_empty(&self.jwt_secret).map(|s| KeyMaterial::SharedSecret(s.as_bytes())))
    }

    /// Load options from the process environment.
    ///
    /// Reads `JWT_SECRET`, `JWT_PUBLIC_KEY`, `JWT_SKIP_VERIFICATION`,
    /// `JWT_ISSUER`, `JWT_AUDIENCE`, `JWT_REQUIRED_RESOURCE`,
    /// `JWT_REQUIRED_ROLES`, `JWT_VALIDATE_REALM_ROLES`,
    /// `JWT_TAX_ID_BYPASS_ROLES`, `JWT_USE_ALIASES` and `JWT_CLOCK_SKEW_SECS`.
    /// List values are comma-separated.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ValidationOptions::from_env`], reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            text(key).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        };
        let list = |key: &str| text(key).map(|v| split_list(&v)).unwrap_or_default();

        let clock_skew_secs = match text("JWT_CLOCK_SKEW_SECS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "JWT_CLOCK_SKEW_SECS is not a number; using 0");
                0
            }),
            None => 0,
        };

        let audience = match list("JWT_AUDIENCE").as_slice() {
            [] => None,
            [single] => Some(OneOrMany::One(single.clone())),
            many => Some(OneOrMany::Many(many.to_vec())),
        };

        Self {
            jwt_secret: text("JWT_SECRET"),
            public_key: text("JWT_PUBLIC_KEY"),
            skip_verification: flag("JWT_SKIP_VERIFICATION"),
            issuer: text("JWT_ISSUER"),
            audience,
            required_resource: text("JWT_REQUIRED_RESOURCE"),
            required_roles: list("JWT_REQUIRED_ROLES"),
            validate_realm_roles: flag("JWT_VALIDATE_REALM_ROLES"),
            tax_id_bypass_roles: list("JWT_TAX_ID_BYPASS_ROLES"),
            use_aliases: flag("JWT_USE_ALIASES"),
            clock_skew_secs,
        }
    }
}

impl std::fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "****"))
            .field("public_key", &self.public_key.as_ref().map(|_| "****"))
            .field("skip_verification", &self.skip_verification)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("required_resource", &self.required_resource)
            .field("required_roles", &self.required_roles)
            .field("validate_realm_roles", &self.validate_realm_roles)
            .field("tax_id_bypass_roles", &self.tax_id_bypass_roles)
            .field("use_aliases", &self.use_aliases)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A value that can be either a single item or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(value: Vec<String>) -> Self {
        OneOrMany::Many(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Role requirement
// ─────────────────────────────────────────────────────────────────────────────

/// Role requirement for [`crate::validate_roles`].
///
/// A non-empty `realm_roles` takes precedence over the resource-scoped fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleRequirement {
    pub roles: Vec<String>,
    pub resource: Option<String>,
    pub realm_roles: Vec<String>,
    pub use_aliases: bool,
}

impl RoleRequirement {
    /// Require any of `roles` in `realm_access`.
    pub fn realm<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            realm_roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Require a grant for `resource`.
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    /// Require any of `roles` (on the configured resource).
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_aliases(mut self) -> Self {
        self.use_aliases = true;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tax-id options
// ─────────────────────────────────────────────────────────────────────────────

/// Request bucket a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    Path,
    Query,
    Body,
    Header,
}

impl ParamSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Body => "body",
            ParamSource::Header => "header",
        }
    }
}

impl core::fmt::Display for ParamSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxIdOptions {
    pub bypass_roles: Vec<String>,

    /// Resource whose roles are checked for bypass; realm roles otherwise.
    pub resource: Option<String>,

    pub param_name: Option<String>,
    pub param_source: Option<ParamSource>,
}

impl TaxIdOptions {
    #[must_use]
    pub fn bypass<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bypass_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn on_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Read the tax id from `name`, optionally only from `source`.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, source: Option<ParamSource>) -> Self {
        self.param_name = Some(name.into());
        self.param_source = source;
        self
    }

    /// How the parameter is described in `TAX_ID_NOT_PROVIDED` messages.
    pub fn param_label(&self) -> String {
        match (&self.param_name, self.param_source) {
            (Some(name), Some(source)) => format!("parameter '{name}' in {source}"),
            (Some(name), None) => format!("parameter '{name}'"),
            (None, _) => "tax_id".to_string(),
        }
    }
}

/// Whether a route checks tax-id ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "options", rename_all = "snake_case")]
pub enum TaxIdCheck {
    #[default]
    Disabled,
    Enabled(TaxIdOptions),
}

impl TaxIdCheck {
    pub fn is_enabled(&self) -> bool {
        matches!(self, TaxIdCheck::Enabled(_))
    }
}
