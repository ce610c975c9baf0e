//! # TaskDesk API Server Library
//!
//! This library provides the core functionality for the TaskDesk API server.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, session gates
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
