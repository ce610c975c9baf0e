/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
///
/// Session authentication lives in `app` next to the router it guards.

pub mod security;
