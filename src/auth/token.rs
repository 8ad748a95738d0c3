//! Bearer token issue/verify.
//!
//! HS256 JWTs signed with the configured secret. Validity is purely
//! exp-based: there is no refresh flow and no revocation list.

use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::models::ModulePermission;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<ModulePermission>,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// Issue a 24-hour token for the given user identity.
pub fn issue_token(
    secret: &str,
    user_id: &str,
    username: &str,
    role: &str,
    permissions: &[ModulePermission],
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        permissions: permissions.to_vec(),
        iat: now.timestamp() as u64,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as u64,
    };

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };

    let header_json =
        serde_json::to_string(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
    let claims_json =
        serde_json::to_string(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;

    let message = format!(
        "{}.{}",
        base64_url_encode(header_json.as_bytes()),
        base64_url_encode(claims_json.as_bytes())
    );

    let signature = sign(secret, &message)?;
    Ok(format!("{message}.{signature}"))
}

/// Verify signature and expiry, returning the decoded claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let message = format!("{}.{}", parts[0], parts[1]);
    let expected = sign(secret, &message)?;
    if parts[2] != expected {
        return Err(TokenError::InvalidSignature);
    }

    let claims_json = base64_url_decode(parts[1]).map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&claims_json).map_err(|_| TokenError::Malformed)?;

    if claims.exp < Utc::now().timestamp() as u64 {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn sign(secret: &str, message: &str) -> Result<String, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(base64_url_encode(&mac.finalize().into_bytes()))
}

fn base64_url_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn issue() -> String {
        issue_token(SECRET, "user-1", "alice", "technician", &[]).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let claims = verify_token(SECRET, &issue()).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "technician");
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let err = verify_token("other-secret", &issue()).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_claims_fail_signature() {
        let token = issue();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = base64_url_encode(
            br#"{"sub":"user-1","username":"alice","role":"admin","permissions":[],"iat":0,"exp":99999999999}"#,
        );
        parts[1] = forged;
        let err = verify_token(SECRET, &parts.join(".")).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            verify_token(SECRET, "not-a-token").unwrap_err(),
            TokenError::Malformed
        ));
    }

    #[test]
    fn expired_token_rejected() {
        // Build a token with exp in the past, signed correctly
        let header = base64_url_encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = base64_url_encode(
            br#"{"sub":"user-1","username":"alice","role":"technician","permissions":[],"iat":0,"exp":1}"#,
        );
        let message = format!("{header}.{claims}");
        let signature = sign(SECRET, &message).unwrap();
        let token = format!("{message}.{signature}");

        let err = verify_token(SECRET, &token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn permissions_survive_the_round_trip() {
        use crate::models::ModulePermission;
        let perms = vec![ModulePermission {
            module: "inventory".into(),
            view: true,
            edit: false,
            delete: false,
        }];
        let token = issue_token(SECRET, "u", "bob", "technician", &perms).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.permissions, perms);
    }
}
