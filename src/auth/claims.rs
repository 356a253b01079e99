/// JWT Claims structure
///
/// Payload of an access token: the standard RFC 7519 claims and nothing else.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(user_id: Uuid, issued_at: i64, ttl_seconds: i64, issuer: &str) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            iss: issuer.to_string(),
        }
    }

    /// Extract user ID from claims. `None` if `sub` is not a UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// A token is expired from its `exp` second onward.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
