/// Password Hashing and Verification
///
/// The login flow treats password checking as a black box behind
/// `PasswordVerifier`. `BcryptVerifier` is the production implementation.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::AppError;

lazy_static! {
    /// Checked against when no account matches a login, so an unknown email
    /// costs the same bcrypt work as a wrong password.
    static ref UNKNOWN_ACCOUNT_HASH: String =
        hash_password("unknown-account-placeholder").unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not build the unknown-account hash");
            String::new()
        });
}

/// Default-cost bcrypt hash that no submitted password is expected to match.
pub fn unknown_account_hash() -> &'static str {
    UNKNOWN_ACCOUNT_HASH.as_str()
}

pub trait PasswordVerifier: Send + Sync {
    /// True if `plaintext` matches `hash`. Never errors: an unreadable hash
    /// simply does not match.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptVerifier;

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
        }
    }
}

/// Hash a password using bcrypt at the default cost
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}
