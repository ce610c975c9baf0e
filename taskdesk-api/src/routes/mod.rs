/// Route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout
/// - `tasks`: Task CRUD, completion toggle, stats
/// - `uploads`: Attachment download
/// - `pages`: HTML pages

pub mod auth;
pub mod health;
pub mod pages;
pub mod tasks;
pub mod uploads;
