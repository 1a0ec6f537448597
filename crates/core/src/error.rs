//! Authorization failure model.
//!
//! Every evaluator in the workspace returns rather than raises: a denial is a
//! value the host maps onto its transport. The only genuine fault is
//! [`AuthFailure::InvalidConfig`], which signals a route wired without enough
//! verification material.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used by the evaluators.
pub type AuthResult<T> = Result<T, AuthFailure>;

/// Stable, machine-readable failure code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TokenNotProvided,
    InvalidToken,
    TokenDecodeFailed,
    TokenVerificationFailed,
    InvalidConfig,
    NoResourceAccess,
    ResourceAccessDenied,
    InsufficientRoles,
    InsufficientRealmRoles,
    TaxIdNotProvided,
    TaxIdNotInToken,
    TaxIdAccessDenied,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TokenNotProvided => "TOKEN_NOT_PROVIDED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenDecodeFailed => "TOKEN_DECODE_FAILED",
            ErrorCode::TokenVerificationFailed => "TOKEN_VERIFICATION_FAILED",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::NoResourceAccess => "NO_RESOURCE_ACCESS",
            ErrorCode::ResourceAccessDenied => "RESOURCE_ACCESS_DENIED",
            ErrorCode::InsufficientRoles => "INSUFFICIENT_ROLES",
            ErrorCode::InsufficientRealmRoles => "INSUFFICIENT_REALM_ROLES",
            ErrorCode::TaxIdNotProvided => "TAX_ID_NOT_PROVIDED",
            ErrorCode::TaxIdNotInToken => "TAX_ID_NOT_IN_TOKEN",
            ErrorCode::TaxIdAccessDenied => "TAX_ID_ACCESS_DENIED",
        }
    }

    /// Transport status hint. Hosts may honor or override it.
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorCode::TokenNotProvided
            | ErrorCode::InvalidToken
            | ErrorCode::TokenDecodeFailed
            | ErrorCode::TokenVerificationFailed
            | ErrorCode::NoResourceAccess => 401,
            ErrorCode::ResourceAccessDenied
            | ErrorCode::InsufficientRoles
            | ErrorCode::InsufficientRealmRoles
            | ErrorCode::TaxIdNotInToken
            | ErrorCode::TaxIdAccessDenied => 403,
            ErrorCode::TaxIdNotProvided => 400,
            ErrorCode::InvalidConfig => 500,
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A denied (or misconfigured) authorization decision.
///
/// Each variant maps to exactly one [`ErrorCode`]; the `Display` output is the
/// human-readable message sent back to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("token not provided")]
    TokenNotProvided,

    #[error("token could not be decoded")]
    InvalidToken,

    #[error("{0}")]
    TokenDecodeFailed(String),

    #[error("{0}")]
    TokenVerificationFailed(String),

    /// The route was configured without verification material.
    #[error("{0}")]
    InvalidConfig(String),

    #[error("token does not grant access to any resource")]
    NoResourceAccess,

    #[error("no access to resource: {resource}")]
    ResourceAccessDenied { resource: String },

    #[error(
        "missing required roles on resource {resource}; one of: {}",
        .required.join(", ")
    )]
    InsufficientRoles {
        resource: String,
        required: Vec<String>,
    },

    #[error("missing required realm roles; one of: {}", .required.join(", "))]
    InsufficientRealmRoles { required: Vec<String> },

    #[error("{param} not provided in the request")]
    TaxIdNotProvided { param: String },

    #[error("token carries no tax_id or vendors-taxs entries")]
    TaxIdNotInToken,

    #[error("no access to this tax_id; available tax IDs: {}", .available.join(", "))]
    TaxIdAccessDenied { available: Vec<String> },
}

impl AuthFailure {
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::TokenDecodeFailed(msg.into())
    }

    pub fn verification_failed(msg: impl Into<String>) -> Self {
        Self::TokenVerificationFailed(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn resource_access_denied(resource: impl Into<String>) -> Self {
        Self::ResourceAccessDenied {
            resource: resource.into(),
        }
    }

    /// `TAX_ID_NOT_PROVIDED` for the default `tax_id` parameter.
    pub fn tax_id_not_provided() -> Self {
        Self::TaxIdNotProvided {
            param: "tax_id".to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AuthFailure::TokenNotProvided => ErrorCode::TokenNotProvided,
            AuthFailure::InvalidToken => ErrorCode::InvalidToken,
            AuthFailure::TokenDecodeFailed(_) => ErrorCode::TokenDecodeFailed,
            AuthFailure::TokenVerificationFailed(_) => ErrorCode::TokenVerificationFailed,
            AuthFailure::InvalidConfig(_) => ErrorCode::InvalidConfig,
            AuthFailure::NoResourceAccess => ErrorCode::NoResourceAccess,
            AuthFailure::ResourceAccessDenied { .. } => ErrorCode::ResourceAccessDenied,
            AuthFailure::InsufficientRoles { .. } => ErrorCode::InsufficientRoles,
            AuthFailure::InsufficientRealmRoles { .. } => ErrorCode::InsufficientRealmRoles,
            AuthFailure::TaxIdNotProvided { .. } => ErrorCode::TaxIdNotProvided,
            AuthFailure::TaxIdNotInToken => ErrorCode::TaxIdNotInToken,
            AuthFailure::TaxIdAccessDenied { .. } => ErrorCode::TaxIdAccessDenied,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.code().status_code()
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// True when the failure is a deployment bug rather than a bad request.
    pub fn is_fault(&self) -> bool {
        matches!(self, AuthFailure::InvalidConfig(_))
    }

    pub fn to_body(&self) -> FailureBody {
        FailureBody {
            status_code: self.status_code(),
            message: self.message(),
            error: self.code(),
        }
    }
}

/// Wire body a host sends for a failed decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub status_code: u16,
    pub message: String,
    pub error: ErrorCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_hints_follow_taxonomy() {
        assert_eq!(AuthFailure::TokenNotProvided.status_code(), 401);
        assert_eq!(AuthFailure::invalid_config("x").status_code(), 500);
        assert_eq!(AuthFailure::tax_id_not_provided().status_code(), 400);
        assert_eq!(AuthFailure::TaxIdNotInToken.status_code(), 403);
        assert_eq!(AuthFailure::NoResourceAccess.status_code(), 401);
        assert_eq!(
            AuthFailure::resource_access_denied("billing").status_code(),
            403
        );
    }

    #[test]
    fn only_invalid_config_is_a_fault() {
        assert!(AuthFailure::invalid_config("missing key").is_fault());
        assert!(!AuthFailure::verification_failed("bad signature").is_fault());
        assert!(!AuthFailure::TaxIdNotInToken.is_fault());
    }

    #[test]
    fn messages_quote_the_policy_inputs() {
        let err = AuthFailure::InsufficientRoles {
            resource: "billing".to_string(),
            required: vec!["editor".to_string(), "Admin".to_string()],
        };
        assert_eq!(
            err.message(),
            "missing required roles on resource billing; one of: editor, Admin"
        );

        let err = AuthFailure::TaxIdAccessDenied {
            available: vec!["10214564-K".to_string(), "761234567".to_string()],
        };
        assert!(err.message().ends_with("10214564-K, 761234567"));
    }

    #[test]
    fn body_serializes_with_wire_field_names() {
        let body = AuthFailure::TokenNotProvided.to_body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["statusCode"], 401);
        assert_eq!(json["error"], "TOKEN_NOT_PROVIDED");
        assert_eq!(json["message"], "token not provided");
    }

    #[test]
    fn code_display_matches_serde_name() {
        for code in [
            ErrorCode::TokenVerificationFailed,
            ErrorCode::InsufficientRealmRoles,
            ErrorCode::TaxIdAccessDenied,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
            assert_eq!(code.to_string(), code.as_str());
        }
    }
}
