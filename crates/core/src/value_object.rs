//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances
/// holding the same attributes are the same value. Policy inputs such as a
/// normalized tax identifier are modeled this way so that equality is decided
/// once, at construction, instead of at every comparison site.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Country(String);
///
/// impl ValueObject for Country {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
