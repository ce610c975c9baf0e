//! # TaskDesk Shared Library
//!
//! This crate contains the data layer and security primitives used by the
//! TaskDesk API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, signed session tokens, and the current-user extractor
//! - `db`: SQLite connection pool and embedded migrations
//! - `models`: Database models (users, tasks, sessions) and their queries
//! - `storage`: Attachment upload directory and filename sanitizing
//! - `timefmt`: ISO-8601 parsing/formatting for task due dates

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;
pub mod timefmt;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
