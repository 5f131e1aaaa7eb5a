/// Authentication module
///
/// Token codec and service, claim types, roles, time sources and the
/// password verification seam.

mod claims;
mod clock;
mod jwt;
mod password;
mod role;
mod service;

pub use claims::{AccessClaims, RefreshClaims, TokenUse, ValidityWindow};
pub use clock::{FixedClock, TimeSource, WallClock};
pub use jwt::{parse_algorithm, TokenCodec};
pub use password::{
    hash_password, hash_password_with_cost, unknown_account_hash, BcryptVerifier, PasswordVerifier,
};
pub use role::Role;
pub use service::{TokenService, MAX_TOKEN_LIFETIME};
