//! Role alias registry.
//!
//! Aliases are policy-level names (`Admin`, `Manager`, ...) that expand to one
//! or more concrete roles issued by the identity provider. Names that are not
//! registered pass through unchanged, so literal roles and aliases can be mixed
//! in one requirement list.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Alias meaning "any authenticated caller"; it expands to no roles and
/// short-circuits realm-role checks.
pub const ALL: &str = "ALL";

static BUILTIN: LazyLock<RoleAliases> = LazyLock::new(|| {
    RoleAliases::empty()
        .with_alias("Admin", ["admin", "super-admin", "system-admin"])
        .with_alias("Manager", ["manager", "team-lead", "supervisor"])
        .with_alias("Auditor", ["auditor", "compliance-officer"])
        .with_alias("Supplier", ["FBC_NATIONAL_COMMERCIAL_SUPPLIER_USER"])
        .with_alias(ALL, std::iter::empty::<&'static str>())
});

/// Mapping from alias name to the concrete roles it stands for.
///
/// Read-only once built; the built-in table is shared process-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAliases {
    aliases: BTreeMap<String, Vec<Role>>,
}

impl RoleAliases {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in alias table.
    pub fn builtin() -> &'static RoleAliases {
        &BUILTIN
    }

    /// Register (or replace) an alias.
    #[must_use]
    pub fn with_alias<I, R>(mut self, name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.aliases
            .insert(name.into(), roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand one name. Unknown names resolve to themselves.
    pub fn resolve(&self, name: &str) -> Vec<Role> {
        match self.aliases.get(name) {
            Some(roles) => roles.clone(),
            None => vec![Role::new(name.to_string())],
        }
    }

    /// Expand every name and return the deduplicated union, in first-seen order.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<Role> {
        let mut resolved: Vec<Role> = Vec::new();
        for name in names {
            for role in self.resolve(name.as_ref()) {
                if !resolved.contains(&role) {
                    resolved.push(role);
                }
            }
        }
        resolved
    }
}

/// Expand one name through the built-in table.
pub fn resolve_alias(name: &str) -> Vec<Role> {
    RoleAliases::builtin().resolve(name)
}

/// Expand a list of names through the built-in table.
pub fn resolve_aliases<S: AsRef<str>>(names: &[S]) -> Vec<Role> {
    RoleAliases::builtin().resolve_all(names)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use proptest::prelude::*;

    fn as_strings(roles: &[Role]) -> Vec<&str> {
        roles.iter().map(Role::as_str).collect()
    }

    #[test]
    fn admin_alias_expands_and_unknown_names_pass_through() {
        let roles = resolve_aliases(&["Admin", "extra-role"]);
        assert_eq!(
            as_strings(&roles),
            vec!["admin", "super-admin", "system-admin", "extra-role"]
        );
    }

    #[test]
    fn all_alias_resolves_to_nothing() {
        assert!(resolve_alias(ALL).is_empty());
        assert!(RoleAliases::builtin().is_alias(ALL));
    }

    #[test]
    fn literal_role_resolves_to_itself() {
        assert_eq!(as_strings(&resolve_alias("billing-viewer")), vec!["billing-viewer"]);
    }

    #[test]
    fn union_has_no_duplicates() {
        let roles = resolve_aliases(&["admin", "Admin", "Manager", "manager"]);
        let unique: BTreeSet<&str> = roles.iter().map(Role::as_str).collect();
        assert_eq!(unique.len(), roles.len());
        assert_eq!(roles.len(), 6);
    }

    #[test]
    fn custom_registry_overrides_builtin_entry() {
        let aliases = RoleAliases::builtin()
            .clone()
            .with_alias("Admin", ["root"])
            .with_alias("Finance", ["ap-clerk", "ar-clerk"]);

        assert_eq!(as_strings(&aliases.resolve("Admin")), vec!["root"]);
        assert_eq!(
            as_strings(&aliases.resolve_all(&["Finance", "Auditor"])),
            vec!["ap-clerk", "ar-clerk", "auditor", "compliance-officer"]
        );
        // The shared table is untouched.
        assert_eq!(resolve_alias("Admin").len(), 3);
    }

    #[test]
    fn registry_loads_from_json() {
        let aliases: RoleAliases =
            serde_json::from_str(r#"{"Ops": ["operator", "on-call"]}"#).unwrap();
        assert_eq!(as_strings(&aliases.resolve("Ops")), vec!["operator", "on-call"]);
        assert_eq!(aliases.names().collect::<Vec<_>>(), vec!["Ops"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: resolution is a duplicate-free union that does not depend
        /// on input order.
        #[test]
        fn resolution_is_an_order_independent_union(
            names in prop::collection::vec(
                prop::sample::select(vec![
                    "Admin", "Manager", "Auditor", "Supplier", "ALL",
                    "admin", "viewer", "team-lead", "extra-role",
                ]),
                0..8,
            )
        ) {
            let forward = resolve_aliases(&names);
            let mut reversed_names = names.clone();
            reversed_names.reverse();
            let backward = resolve_aliases(&reversed_names);

            let forward_set: BTreeSet<&str> = forward.iter().map(Role::as_str).collect();
            let backward_set: BTreeSet<&str> = backward.iter().map(Role::as_str).collect();

            prop_assert_eq!(forward_set.len(), forward.len());
            prop_assert_eq!(forward_set, backward_set);
        }
    }
}
