//! `claimgate-core`: failure taxonomy and value objects shared by the
//! authorization crates.
//!
//! This crate contains **pure** primitives (no token handling, no transport).

pub mod error;
pub mod tax_id;
pub mod value_object;

pub use error::{AuthFailure, AuthResult, ErrorCode, FailureBody};
pub use tax_id::{TaxId, normalize_tax_id};
pub use value_object::ValueObject;
