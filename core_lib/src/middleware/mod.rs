//! Middleware components for the HTTP server

pub mod auth;
pub mod errors;
pub mod logging;
