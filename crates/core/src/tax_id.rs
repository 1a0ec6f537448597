//! Normalized tax identifier.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Canonical form of a tax identifier.
///
/// Identifiers arrive in inconsistent formats across systems
/// (`76.123.456-7`, `76123456-7`, ` 76123456-7 `), so comparison always happens
/// on this normalized form: trimmed, uppercased, with whitespace and `.` removed.
/// The hyphen before a check digit is significant and kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Normalize `raw`; `None` when nothing is left afterwards.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_tax_id(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ValueObject for TaxId {}

impl core::fmt::Display for TaxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalization applied to every tax identifier before comparison.
///
/// Idempotent: `normalize_tax_id(&normalize_tax_id(x)) == normalize_tax_id(x)`.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn punctuation_and_spacing_are_policy_equivalent() {
        let a = normalize_tax_id("76.123.456-7");
        let b = normalize_tax_id("76123456-7");
        let c = normalize_tax_id(" 76123456-7 ");

        assert_eq!(a, "76123456-7");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn check_digit_case_is_ignored() {
        assert_eq!(normalize_tax_id("10.214.564-k"), "10214564-K");
        assert_eq!(
            TaxId::parse("10214564-k"),
            TaxId::parse("10.214.564-K")
        );
    }

    #[test]
    fn internal_whitespace_is_stripped() {
        assert_eq!(normalize_tax_id("76 123\t456-7"), "76123456-7");
    }

    #[test]
    fn blank_input_parses_to_none() {
        assert_eq!(TaxId::parse(""), None);
        assert_eq!(TaxId::parse("  . . "), None);
        assert_eq!(
            TaxId::parse("1-9").map(TaxId::into_inner),
            Some("1-9".to_string())
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalization is idempotent.
        #[test]
        fn normalization_is_idempotent(raw in "[ \\t0-9a-zA-Z.\\-]{0,24}") {
            let once = normalize_tax_id(&raw);
            prop_assert_eq!(normalize_tax_id(&once), once.clone());
            prop_assert!(!once.contains('.'));
            prop_assert!(!once.chars().any(char::is_whitespace));
        }

        /// Property: adding dots and surrounding spaces never changes identity.
        #[test]
        fn decorations_do_not_change_identity(
            body in "[0-9]{7,8}",
            check in "[0-9kK]",
            pad in " {0,3}",
        ) {
            let plain = format!("{body}-{check}");
            let dotted = format!("{pad}{}.{}-{check}{pad}", &body[..2], &body[2..]);
            prop_assert_eq!(normalize_tax_id(&plain), normalize_tax_id(&dotted));
        }
    }
}
