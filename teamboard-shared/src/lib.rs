//! # Teamboard Shared Library
//!
//! Domain core of the Teamboard project tracker: role-based access control,
//! the task state machine, progress calculation and analytics, plus the
//! record store they run on.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Role registry, permission evaluator and JWT identity
//! - `store`: Record store trait with PostgreSQL and in-memory backends
//! - `services`: Membership, task, progress, analytics and dashboard logic
//! - `db`: Connection pool and migrations
//! - `error`: Core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Teamboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
