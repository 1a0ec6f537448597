//! Route policies and the route-id side map.
//!
//! Hosts register a [`RoutePolicy`] per route when wiring their router, then
//! look it up on each request and hand it to
//! [`crate::Authorizer::authorize_route`].

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{TaxIdCheck, TaxIdOptions};

static UNRESTRICTED: LazyLock<RoutePolicy> = LazyLock::new(RoutePolicy::default);

/// Role and tax-id requirements for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePolicy {
    /// Realm roles that grant the route outright.
    pub realm_roles: Vec<String>,
    pub resource: Option<String>,
    pub roles: Vec<String>,
    pub use_aliases: bool,
    pub tax_id: TaxIdCheck,
}

impl RoutePolicy {
    #[must_use]
    pub fn realm_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.realm_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn resource_roles<I, S>(mut self, resource: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = Some(resource.into());
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_aliases(mut self) -> Self {
        self.use_aliases = true;
        self
    }

    #[must_use]
    pub fn with_tax_id(mut self, options: TaxIdOptions) -> Self {
        self.tax_id = TaxIdCheck::Enabled(options);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.realm_roles.is_empty() && self.roles.is_empty() && !self.tax_id.is_enabled()
    }
}

/// Route id to policy, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyMap {
    routes: HashMap<String, RoutePolicy>,
}

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>, policy: RoutePolicy) -> Self {
        self.insert(route, policy);
        self
    }

    /// Register `policy`, returning the one it replaced.
    pub fn insert(&mut self, route: impl Into<String>, policy: RoutePolicy) -> Option<RoutePolicy> {
        self.routes.insert(route.into(), policy)
    }

    pub fn get(&self, route: &str) -> Option<&RoutePolicy> {
        self.routes.get(route)
    }

    /// Policy for `route`; routes never registered get the unrestricted policy.
    pub fn policy_for(&self, route: &str) -> &RoutePolicy {
        self.routes.get(route).unwrap_or(&UNRESTRICTED)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamSource;

    #[test]
    fn unknown_routes_are_unrestricted() {
        let map = PolicyMap::new().with_route(
            "GET /vendors/{taxId}",
            RoutePolicy::default().with_tax_id(TaxIdOptions::default()),
        );

        assert!(map.policy_for("GET /health").is_unrestricted());
        assert!(!map.policy_for("GET /vendors/{taxId}").is_unrestricted());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_replaces_existing_policy() {
        let mut map = PolicyMap::new();
        assert!(map.insert("r", RoutePolicy::default()).is_none());

        let previous = map.insert("r", RoutePolicy::default().realm_roles(["ALL"]));
        assert_eq!(previous, Some(RoutePolicy::default()));
        assert_eq!(map.get("r").unwrap().realm_roles, vec!["ALL"]);
    }

    #[test]
    fn map_loads_from_json() {
        let map: PolicyMap = serde_json::from_str(
            r#"{
                "POST /invoices": {
                    "resource": "billing",
                    "roles": ["editor", "Admin"],
                    "use_aliases": true,
                    "tax_id": {
                        "mode": "enabled",
                        "options": { "param_name": "taxId", "param_source": "body" }
                    }
                }
            }"#,
        )
        .unwrap();

        let policy = map.policy_for("POST /invoices");
        assert_eq!(policy.resource.as_deref(), Some("billing"));
        assert!(policy.use_aliases);
        let TaxIdCheck::Enabled(options) = &policy.tax_id else {
            panic!("expected tax id check");
        };
        assert_eq!(options.param_source, Some(ParamSource::Body));
    }
}
