//! HTTP handlers and route table

pub mod files;
pub mod health;
pub mod routes;
