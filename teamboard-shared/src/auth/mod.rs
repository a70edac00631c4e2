/// Identity and access control
///
/// # Modules
///
/// - [`permissions`]: the role → permission table ([`permissions::RoleRegistry`])
/// - [`authorization`]: the permission evaluator built on memberships
/// - [`jwt`]: HS256 token verification
/// - [`middleware`]: Axum layer that turns a bearer token into an
///   [`middleware::AuthContext`]

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod permissions;
