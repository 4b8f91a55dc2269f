//! Trading-strategy management backend with a backtest simulator

pub mod auth;
pub mod cache;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod services;
pub mod simulation;
