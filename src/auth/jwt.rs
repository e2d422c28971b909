use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::error::Category;
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm => TokenError::SignatureInvalid,
            _ => TokenError::Malformed,
        }
    }
}

/// Signing and verification keys, derived once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs((cfg.ttl_hours.max(0) as u64).saturating_mul(60 * 60)),
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, user_id: i64, now: OffsetDateTime) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| TokenError::Signing("token lifetime out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Resolve a token to its subject user id.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        // Well-formed JSON with a missing or unknown `alg` names no algorithm we accept.
        let header = jsonwebtoken::decode_header(token).map_err(|e| match e.kind() {
            ErrorKind::Json(json) if json.classify() == Category::Data => TokenError::SignatureInvalid,
            _ => TokenError::Malformed,
        })?;
        if !HMAC_FAMILY.contains(&header.alg) {
            warn!(alg = ?header.alg, "rejected token with non-HMAC algorithm");
            return Err(TokenError::SignatureInvalid);
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let err = TokenError::from(e);
            debug!(error = %err, "jwt rejected");
            err
        })?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 72,
        })
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let token = keys.issue(42).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(73);
        let token = keys.issue_at(7, issued).expect("issue");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = make_keys("secret-a").issue(7).expect("issue");
        assert_eq!(
            make_keys("secret-b").verify(&token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn truncated_token_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.issue(7).expect("issue");
        let truncated = &token[..token.len() - 1];
        assert!(keys.verify(truncated).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret");
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn unsigned_token_is_rejected() {
        // {"alg":"none","typ":"JWT"} . {"sub":7,"iat":0,"exp":9999999999} . <empty>
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJzdWIiOjcsImlhdCI6MCwiZXhwIjo5OTk5OTk5OTk5fQ.";
        assert_eq!(
            make_keys("dev-secret").verify(token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn header_without_alg_is_signature_invalid() {
        // {"typ":"JWT"} . {} . sig
        let token = "eyJ0eXAiOiJKV1QifQ.e30.c2ln";
        assert_eq!(
            make_keys("dev-secret").verify(token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn non_json_header_is_malformed() {
        // "not-json" . {} . sig
        let token = "bm90LWpzb24.e30.c2ln";
        assert_eq!(make_keys("dev-secret").verify(token).unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn huge_ttl_fails_to_sign_instead_of_panicking() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_hours: i64::MAX,
        });
        assert!(matches!(keys.issue(7).unwrap_err(), TokenError::Signing(_)));
    }

    #[test]
    fn wrong_claim_type_fails_closed() {
        #[derive(serde::Serialize)]
        struct Loose {
            sub: String,
            exp: usize,
        }
        let secret = "dev-secret";
        let exp = (OffsetDateTime::now_utc().unix_timestamp() + 3600) as usize;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Loose { sub: "7".into(), exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode");
        assert_eq!(make_keys(secret).verify(&token).unwrap_err(), TokenError::Malformed);
    }
}
