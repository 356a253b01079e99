/// Authentication module
///
/// Password hashing, access token issuing/verification, refresh token management, the
/// login/refresh/revoke flows and the request guard built on top of them.

mod authenticator;
mod claims;
mod guard;
mod jwt;
mod password;
mod refresh_token;

pub use authenticator::{Authenticator, Session};
pub use claims::Claims;
pub use guard::{
    api_key, authenticate, authorize_api_key, authorize_owner, bearer_token, AuthenticatedUser,
    WebhookCaller,
};
pub use jwt::{ttl_from_seconds, AccessTokenCodec, IssuedAccessToken, TokenError};
pub use password::{hash_password, verify_password};
pub use refresh_token::{
    generate_refresh_token, IssuedRefreshToken, RefreshTokenError, RefreshTokenStore,
};
