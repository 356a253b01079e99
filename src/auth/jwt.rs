/// Access token issuing and verification
///
/// Access tokens are HS256 JWTs. They are never stored and cannot be revoked, which is
/// why their lifetime is capped at `MAX_ACCESS_TOKEN_EXPIRY`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::{JwtSettings, MAX_ACCESS_TOKEN_EXPIRY};
use crate::error::AppError;

/// Why an access token was rejected. Kept for logs; callers see a uniform 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// Turn a client-supplied lifetime in seconds into a `Duration` without overflowing.
/// Anything above the cap is clamped to it; non-positive values come out as zero.
pub fn ttl_from_seconds(seconds: i64) -> Duration {
    Duration::seconds(seconds.clamp(0, MAX_ACCESS_TOKEN_EXPIRY))
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    max_ttl: Duration,
}

impl AccessTokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let max_ttl_secs = config.access_token_expiry.clamp(1, MAX_ACCESS_TOKEN_EXPIRY);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            max_ttl: Duration::seconds(max_ttl_secs),
        }
    }

    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    /// Clamp a requested lifetime: shorter is honoured, longer is capped, and a missing or
    /// non-positive request gets the maximum.
    pub fn effective_ttl(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(ttl) if ttl > Duration::zero() => ttl.min(self.max_ttl),
            _ => self.max_ttl,
        }
    }

    /// Issue a signed access token for `user_id`
    ///
    /// # Errors
    /// Returns an internal error if signing fails
    pub fn issue(
        &self,
        user_id: Uuid,
        requested_ttl: Option<Duration>,
    ) -> Result<IssuedAccessToken, AppError> {
        self.issue_at(user_id, requested_ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        requested_ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<IssuedAccessToken, AppError> {
        let ttl = self.effective_ttl(requested_ttl);
        let claims = Claims::new(user_id, now.timestamp(), ttl.num_seconds(), &self.issuer);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

        Ok(IssuedAccessToken { token, expires_at })
    }

    /// Verify signature and issuer, then expiry, and return the subject.
    ///
    /// A correctly signed token past its `exp` is `Expired`, never `InvalidSignature`.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // Expiry is checked below against our own clock with zero leeway
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidIssuer => {
                    TokenError::InvalidSignature
                }
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if claims.is_expired_at(now.timestamp()) {
            return Err(TokenError::Expired);
        }

        claims.user_id().ok_or(TokenError::Malformed)
    }
}
