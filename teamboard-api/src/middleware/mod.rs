/// Middleware modules for the API server
///
/// Authentication lives in `teamboard_shared::auth::middleware`; this crate
/// only adds response security headers.

pub mod security;
