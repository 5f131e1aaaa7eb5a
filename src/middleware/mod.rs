/// Middleware module
///
/// Request pipeline: `AuthGate` (strict or optional) establishes identity,
/// `RequireRoles` authorizes it. In actix the last `.wrap` runs first, so a
/// scope wraps `RequireRoles` before `AuthGate`.

mod identity;
mod jwt_middleware;
mod role_middleware;

pub use identity::RequestIdentity;
pub use jwt_middleware::{evaluate, AuthGate, GateMode, GateOutcome};
pub use role_middleware::{authorize, RequireRoles};
