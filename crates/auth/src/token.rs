//! Credential parser: bearer extraction, decode-only and verified decoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;
use thiserror::Error;

use claimgate_core::{AuthFailure, AuthResult};

use crate::options::{KeyMaterial, ValidationOptions};
use crate::ClaimSet;

const BEARER: &str = "Bearer";

/// Why a token could not be turned into a [`ClaimSet`].
#[derive(Debug, Error)]
enum DecodeError {
    /// Not a three-segment JWS, or a segment that is not base64url JSON.
    #[error("token is not a well-formed JWT")]
    Malformed,

    /// Readable JSON payload that is not a claim set.
    #[error("{0}")]
    Claims(String),
}

/// Pull the token out of an `Authorization` header value.
///
/// Only the exact two-part form `Bearer <token>` is accepted.
pub fn extract_bearer(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthFailure::TokenNotProvided)?;
    let mut parts = header.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthFailure::TokenNotProvided),
    }
}

/// Decode the payload without verifying the signature.
///
/// For deployments where an upstream gateway already verified the token.
pub fn decode_only(token: &str) -> AuthResult<ClaimSet> {
    decode_unverified(token).map_err(|err| match err {
        DecodeError::Malformed => AuthFailure::InvalidToken,
        DecodeError::Claims(msg) => AuthFailure::decode_failed(msg),
    })
}

/// Verify the signature (and `iss`/`aud`/`exp`/`nbf`) and decode.
pub fn verify_and_decode(token: &str, options: &ValidationOptions) -> AuthResult<ClaimSet> {
    if options.skip_verification {
        return decode_unverified(token).map_err(|err| match err {
            DecodeError::Malformed => AuthFailure::InvalidToken,
            DecodeError::Claims(msg) => AuthFailure::verification_failed(msg),
        });
    }

    let Some(material) = options.key_material() else {
        return Err(AuthFailure::invalid_config(
            "one of jwt_secret, public_key or skip_verification must be configured",
        ));
    };

    let header = decode_header(token).map_err(|e| AuthFailure::verification_failed(e.to_string()))?;
    let key = decoding_key(material, header.alg)?;

    let mut validation = Validation::new(header.alg);
    validation.required_spec_claims.clear();
    validation.leeway = options.clock_skew_secs;
    validation.validate_nbf = true;

    if let Some(issuer) = options.issuer.as_deref() {
        validation.set_issuer(&[issuer]);
    }

    match options.audience.as_ref() {
        Some(audience) => validation.set_audience(&audience.to_vec()),
        None => validation.validate_aud = false,
    }

    decode::<ClaimSet>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthFailure::verification_failed(e.to_string()))
}

fn decode_unverified(token: &str) -> Result<ClaimSet, DecodeError> {
    let [header, payload, _] = compact_segments(token).ok_or(DecodeError::Malformed)?;

    // The header is never interpreted here, so any `alg` (ES512, none, ...) is accepted.
    let header = segment_json(header)?;
    if !header.is_object() {
        return Err(DecodeError::Malformed);
    }

    let payload = segment_json(payload)?;
    if !payload.is_object() {
        return Err(DecodeError::Malformed);
    }

    serde_json::from_value(payload).map_err(|e| DecodeError::Claims(e.to_string()))
}

fn segment_json(segment: &str) -> Result<Value, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| DecodeError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| DecodeError::Malformed)
}

/// Header, payload and signature of a compact JWS; header and payload non-empty.
fn compact_segments(token: &str) -> Option<[&str; 3]> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() =>
        {
            Some([header, payload, signature])
        }
        _ => None,
    }
}

/// Key for `alg`, restricted to the algorithm family of the configured material.
fn decoding_key(material: KeyMaterial<'_>, alg: Algorithm) -> AuthResult<DecodingKey> {
    let pem_error =
        |e: JwtError| AuthFailure::invalid_config(format!("public_key is not a usable PEM key: {e}"));

    match (material, alg) {
        (KeyMaterial::SharedSecret(secret), Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => {
            Ok(DecodingKey::from_secret(secret))
        }
        (
            KeyMaterial::PublicKeyPem(pem),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
        ) => DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(pem_error),
        (KeyMaterial::PublicKeyPem(pem), Algorithm::ES256 | Algorithm::ES384) => {
            DecodingKey::from_ec_pem(pem.as_bytes()).map_err(pem_error)
        }
        (KeyMaterial::PublicKeyPem(pem), Algorithm::EdDSA) => {
            DecodingKey::from_ed_pem(pem.as_bytes()).map_err(pem_error)
        }
        (material, alg) => {
            let kind = match material {
                KeyMaterial::SharedSecret(_) => "shared secret",
                KeyMaterial::PublicKeyPem(_) => "public key",
            };
            tracing::debug!(algorithm = ?alg, key = kind, "token algorithm rejected");
            Err(AuthFailure::verification_failed(format!(
                "algorithm {alg:?} is not allowed for the configured {kind}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimgate_core::ErrorCode;

    #[test]
    fn bearer_requires_exact_two_part_form() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));

        for header in [
            None,
            Some(""),
            Some("Bearer"),
            Some("Bearer "),
            Some("bearer abc"),
            Some("Basic abc"),
            Some("Bearer abc extra"),
            Some("Bearer  abc"),
            Some("abc"),
        ] {
            assert_eq!(
                extract_bearer(header),
                Err(AuthFailure::TokenNotProvided),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn garbage_is_an_invalid_token() {
        for token in ["abc", "a.b", "..", "a..c", "!!.@@.##"] {
            assert_eq!(
                decode_only(token).unwrap_err().code(),
                ErrorCode::InvalidToken,
                "token {token:?}"
            );
        }
    }

    fn unsigned(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decode_only_ignores_the_header_algorithm() {
        let payload = r#"{"sub":"u1","realm_access":{"roles":["a"]}}"#;

        for header in [
            r#"{"alg":"ES512","typ":"JWT"}"#,
            r#"{"alg":"none"}"#,
            r#"{"alg":"HS256","kid":"k1"}"#,
        ] {
            let claims = decode_only(&unsigned(header, payload)).unwrap();
            assert_eq!(claims.sub, "u1", "header {header}");
            assert_eq!(claims.realm_roles()[0], "a");
        }
    }

    #[test]
    fn non_json_segments_are_an_invalid_token() {
        let json = r#"{"sub":"u1"}"#;
        for token in [
            unsigned("not json", json),
            unsigned(r#"{"alg":"none"}"#, "not json"),
            unsigned(r#"{"alg":"none"}"#, r#""a string""#),
        ] {
            assert_eq!(decode_only(&token).unwrap_err().code(), ErrorCode::InvalidToken);
        }
    }

    #[test]
    fn payload_without_subject_fails_decoding() {
        let token = unsigned(r#"{"alg":"HS256"}"#, r#"{"email":"ana@example.com"}"#);

        let err = decode_only(&token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenDecodeFailed);
        assert!(err.message().contains("sub"));
    }

    #[test]
    fn skip_mode_reports_unreadable_claims_as_verification_failure() {
        let token = unsigned(r#"{"alg":"ES512"}"#, r#"{"email":"ana@example.com"}"#);
        let err = verify_and_decode(&token, &ValidationOptions::insecure_skip_verification()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenVerificationFailed);

        let ok = unsigned(r#"{"alg":"ES512"}"#, r#"{"sub":"u1"}"#);
        assert!(verify_and_decode(&ok, &ValidationOptions::insecure_skip_verification()).is_ok());
    }

    #[test]
    fn missing_key_material_is_a_config_fault() {
        let err = verify_and_decode("a.b.c", &ValidationOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
        assert!(err.is_fault());
    }

    #[test]
    fn shared_secret_rejects_asymmetric_algorithms() {
        let err = decoding_key(KeyMaterial::SharedSecret(b"k"), Algorithm::RS256).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::TokenVerificationFailed));
    }

    #[test]
    fn public_key_rejects_hmac_algorithms() {
        let err = decoding_key(KeyMaterial::PublicKeyPem("pem"), Algorithm::HS256).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::TokenVerificationFailed));
    }

    #[test]
    fn unreadable_pem_is_a_config_fault() {
        let err = decoding_key(KeyMaterial::PublicKeyPem("not a pem"), Algorithm::RS256).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::InvalidConfig));
    }
}
