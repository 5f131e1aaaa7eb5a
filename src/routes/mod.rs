mod auth;
mod health_check;

pub use auth::{get_current_user, login, refresh, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
pub use health_check::health_check;
