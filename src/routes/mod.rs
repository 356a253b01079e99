mod admin;
mod auth;
mod gobits;
mod health_check;
mod users;
mod validate;
mod webhooks;

pub use admin::{metrics, reset};
pub use auth::{login, refresh, revoke};
pub use gobits::{create_gobit, delete_gobit, get_gobit, list_gobits};
pub use health_check::health_check;
pub use users::{register, update};
pub use validate::validate;
pub use webhooks::billing_webhook;
