/// Middleware module
///
/// Cross-cutting request handling. Authentication lives in the `auth::AuthenticatedUser`
/// and `auth::WebhookCaller` extractors.

mod request_logger;

pub use request_logger::RequestLogger;
