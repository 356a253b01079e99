/// Request authorization
///
/// Two schemes share the `Authorization` header:
/// - `Bearer <token>` carries an access token (or, on /api/refresh and /api/revoke, a
///   refresh token)
/// - `ApiKey <key>` identifies the billing provider on the webhook
///
/// Handlers opt in by taking `AuthenticatedUser` or `WebhookCaller` as an argument.

use std::future::{ready, Ready};

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::auth::jwt::AccessTokenCodec;
use crate::configuration::WebhookSettings;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

fn authorization_credential<'a>(
    headers: &'a HeaderMap,
    prefix: &str,
) -> Result<&'a str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials("missing authorization header"))?
        .to_str()
        .map_err(|_| AuthError::MissingCredentials("authorization header is not ASCII"))?;

    let credential = value
        .strip_prefix(prefix)
        .ok_or(AuthError::MissingCredentials("unexpected authorization scheme"))?
        .trim();

    if credential.is_empty() {
        return Err(AuthError::MissingCredentials("empty credential"));
    }
    Ok(credential)
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, BEARER_PREFIX)
}

/// Key from `Authorization: ApiKey <key>`
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, API_KEY_PREFIX)
}

/// Verify the bearer access token and return the caller's user id
///
/// # Errors
/// `Unauthorized` for a missing header or any rejected token; the specific reason is
/// only logged
pub fn authenticate(headers: &HeaderMap, codec: &AccessTokenCodec) -> Result<Uuid, AppError> {
    let token = bearer_token(headers)?;
    codec.verify(token).map_err(|e| {
        tracing::info!(reason = %e, "Access token rejected");
        AppError::from(AuthError::AccessToken(e))
    })
}

/// Only the owner of a resource may act on it
pub fn authorize_owner(owner_id: Uuid, caller_id: Uuid) -> Result<(), AppError> {
    if owner_id != caller_id {
        tracing::warn!(
            owner_id = %owner_id,
            caller_id = %caller_id,
            "Caller is not the owner of the resource"
        );
        return Err(AuthError::Forbidden.into());
    }
    Ok(())
}

pub fn authorize_api_key(headers: &HeaderMap, expected: &Secret<String>) -> Result<(), AppError> {
    let key = api_key(headers)?;
    if key != expected.expose_secret() {
        return Err(AuthError::InvalidApiKey.into());
    }
    Ok(())
}

/// Caller identity established from a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AccessTokenCodec>>() {
            Some(codec) => authenticate(req.headers(), codec).map(AuthenticatedUser),
            None => Err(AppError::Internal(
                "Access token codec is not registered".to_string(),
            )),
        };
        ready(result)
    }
}

/// Marker for requests carrying the configured webhook API key
#[derive(Debug, Clone, Copy)]
pub struct WebhookCaller;

impl FromRequest for WebhookCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<WebhookSettings>>() {
            Some(settings) => {
                authorize_api_key(req.headers(), &settings.api_key).map(|_| WebhookCaller)
            }
            None => Err(AppError::Internal(
                "Webhook settings are not registered".to_string(),
            )),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::error::ErrorKind;
    use actix_web::http::header::HeaderValue;
    use actix_web::test::TestRequest;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn codec() -> AccessTokenCodec {
        AccessTokenCodec::new(&JwtSettings {
            secret: Secret::new("test-secret-key-at-least-32-characters-long".to_string()),
            issuer: "test".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry_days: 60,
        })
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("Bearer   padded  ")), Ok("padded"));
    }

    #[test]
    fn test_bearer_token_rejections() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
        assert!(bearer_token(&headers_with("Bearer    ")).is_err());
        assert!(bearer_token(&headers_with("ApiKey secret")).is_err());
    }

    #[test]
    fn test_api_key_extraction() {
        assert_eq!(api_key(&headers_with("ApiKey f271c81ff7084ee5")), Ok("f271c81ff7084ee5"));
        assert!(api_key(&headers_with("Bearer f271c81ff7084ee5")).is_err());
    }

    #[test]
    fn test_authenticate_valid_token() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let issued = codec.issue(user_id, None).unwrap();

        let headers = headers_with(&format!("Bearer {}", issued.token));
        assert_eq!(authenticate(&headers, &codec).unwrap(), user_id);
    }

    #[test]
    fn test_authenticate_failures_are_unauthorized() {
        let codec = codec();
        let expired = codec
            .issue_at(Uuid::new_v4(), None, chrono::Utc::now() - chrono::Duration::hours(2))
            .unwrap();

        for headers in [
            HeaderMap::new(),
            headers_with("Bearer not-a-jwt"),
            headers_with(&format!("Bearer {}", expired.token)),
        ] {
            let err = authenticate(&headers, &codec).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
        }
    }

    #[test]
    fn test_authorize_owner() {
        let owner = Uuid::new_v4();
        assert!(authorize_owner(owner, owner).is_ok());

        let err = authorize_owner(owner, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_authorize_api_key() {
        let expected = Secret::new("f271c81ff7084ee5".to_string());

        assert!(authorize_api_key(&headers_with("ApiKey f271c81ff7084ee5"), &expected).is_ok());

        let wrong = authorize_api_key(&headers_with("ApiKey nope"), &expected).unwrap_err();
        assert_eq!(wrong.kind(), ErrorKind::Unauthorized);
        let missing = authorize_api_key(&HeaderMap::new(), &expected).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Unauthorized);
    }

    #[actix_web::test]
    async fn test_authenticated_user_extractor() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let issued = codec.issue(user_id, None).unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(codec))
            .insert_header((AUTHORIZATION, format!("Bearer {}", issued.token)))
            .to_http_request();

        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user, AuthenticatedUser(user_id));
    }

    #[actix_web::test]
    async fn test_webhook_caller_extractor_rejects_wrong_key() {
        let settings = WebhookSettings {
            api_key: Secret::new("f271c81ff7084ee5".to_string()),
        };

        let req = TestRequest::default()
            .app_data(web::Data::new(settings))
            .insert_header((AUTHORIZATION, "ApiKey wrong"))
            .to_http_request();

        let err = WebhookCaller::extract(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
