/// API route handlers
///
/// Handlers are thin: validate the request body, call one service
/// operation with the caller's username, and serialize the result.
///
/// - `health`: Health check endpoint
/// - `projects`: Project CRUD and progress recomputation
/// - `members`: Team membership
/// - `tasks`: Task CRUD, status transitions and assignment
/// - `analytics`: Project, timeline and member analytics
/// - `dashboard`: Personal dashboard and activity feed

pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;
