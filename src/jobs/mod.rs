//! Background processing of strategy update notifications

pub mod context;
pub mod handlers;
pub mod types;

pub use context::JobContext;
pub use types::{StrategyAction, StrategyEvent};
