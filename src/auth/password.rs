/// Password Hashing and Verification
///
/// bcrypt at the library's default cost. Strength rules live in `validators`; hashing
/// itself never rejects input.
///
/// Each call runs on tokio's blocking pool so a slow hash never stalls the worker that
/// serves other requests.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::AppError;

lazy_static! {
    /// Hash of a throwaway password, verified against when the account does not exist so
    /// that unknown emails take as long as wrong passwords.
    static ref DUMMY_HASH: String =
        hash("gohost-dummy-password", DEFAULT_COST).unwrap_or_default();
}

async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(format!("Password task panicked: {}", e)))?
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns an internal error only if bcrypt itself fails
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    run_blocking(move || {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
}

/// Verify a password against its hash
///
/// # Errors
/// Returns an internal error if the stored hash cannot be parsed
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    run_blocking(move || {
        verify(password, &hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    })
    .await
}

/// Burn the same amount of work as a real verification. The result is ignored.
pub(crate) async fn verify_dummy_password(password: &str) {
    let password = password.to_owned();
    let _ = run_blocking(move || {
        let _ = verify(password, &DUMMY_HASH);
        Ok(())
    })
    .await;
}
