use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use claimgate_core::TaxId;

use crate::Role;

/// Claim set carried by a bearer credential (transport-agnostic).
///
/// Built once per request by the credential parser and never mutated
/// afterwards. Claims that this crate does not evaluate are kept in `extra` so
/// hosts can still read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject identifier (opaque).
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    /// Direct tax identifier, e.g. `"76.123.456-7"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Per-vendor tax records.
    #[serde(
        rename = "vendors-taxs",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub vendors_taxs: Vec<VendorTax>,

    /// Roles granted per downstream resource (client).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub resource_access: BTreeMap<String, ResourceAccess>,

    /// Roles granted across the whole realm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Every other claim in the payload.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccess {
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,
}

/// Audience can be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, aud: &str) -> bool {
        match self {
            Audience::Single(s) => s == aud,
            Audience::Multiple(v) => v.iter().any(|s| s == aud),
        }
    }
}

/// One entry of the `vendors-taxs` claim.
///
/// Only `tax_id` takes part in policy; the rest is descriptive metadata. A bare
/// string entry is read as a record holding just that tax id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VendorTaxRepr", rename_all = "camelCase")]
pub struct VendorTax {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operation: Vec<VendorOperation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_unit: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: Vec<String>,
}

// Metadata is never evaluated, so an off-shape entry degrades to its
// readable string fields instead of failing the whole claim set.
#[derive(Deserialize)]
#[serde(untagged)]
enum VendorTaxRepr {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Record {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        tax_id: Option<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        operation: Vec<VendorOperation>,
        #[serde(default)]
        country: Option<String>,
    },
    Other(serde_json::Value),
}

impl From<VendorTaxRepr> for VendorTax {
    fn from(value: VendorTaxRepr) -> Self {
        match value {
            VendorTaxRepr::Bare(tax_id) => Self {
                tax_id: Some(tax_id),
                ..Self::default()
            },
            VendorTaxRepr::Record {
                name,
                tax_id,
                operation,
                country,
            } => Self {
                name,
                tax_id,
                operation,
                country,
            },
            VendorTaxRepr::Other(value) => {
                let text = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
                Self {
                    name: text("name"),
                    tax_id: text("taxId"),
                    operation: Vec::new(),
                    country: text("country"),
                }
            }
        }
    }
}

impl ClaimSet {
    /// A claim set with only a subject; the other claims are empty.
    pub fn for_subject(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            name: None,
            preferred_username: None,
            tax_id: None,
            vendors_taxs: Vec::new(),
            resource_access: BTreeMap::new(),
            realm_access: None,
            iss: None,
            aud: None,
            exp: None,
            iat: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn realm_roles(&self) -> &[Role] {
        self.realm_access
            .as_ref()
            .map(|realm| realm.roles.as_slice())
            .unwrap_or_default()
    }

    /// Roles for `resource`, or `None` when the token has no grant for it at all.
    pub fn resource_roles(&self, resource: &str) -> Option<&[Role]> {
        self.resource_access
            .get(resource)
            .map(|access| access.roles.as_slice())
    }

    pub fn has_resource(&self, resource: &str) -> bool {
        self.resource_access.contains_key(resource)
    }

    /// True when the token grants *something*: a resource entry or a realm role.
    pub fn has_any_access(&self) -> bool {
        !self.resource_access.is_empty() || !self.realm_roles().is_empty()
    }

    /// Raw tax identifiers (direct claim first, then vendor records),
    /// deduplicated, as they appear in the token.
    pub fn tax_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let candidates = self
            .tax_id
            .iter()
            .chain(self.vendors_taxs.iter().filter_map(|v| v.tax_id.as_ref()));

        for id in candidates {
            if !id.is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    /// Normalized tax identifiers, deduplicated; this is the set ownership is
    /// checked against. Ids that normalize to nothing (blank or only dots) are
    /// left out, so a token holding only such ids has none.
    pub fn normalized_tax_ids(&self) -> Vec<TaxId> {
        let mut ids: Vec<TaxId> = Vec::new();
        for id in self.tax_ids().iter().filter_map(|raw| TaxId::parse(raw)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
