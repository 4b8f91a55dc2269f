//! Request-level business logic behind the HTTP handlers

pub mod auth;
pub mod simulation;
pub mod strategies;
