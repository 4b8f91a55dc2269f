//! Core application primitives (HTTP server, job runtime)

pub mod http;
pub mod runtime;

pub use http::*;
pub use runtime::*;
