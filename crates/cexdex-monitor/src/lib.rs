//! CEX/DEX price divergence monitor.
//!
//! Main application that wires the components together:
//! - Trade stream connection to the centralized exchange
//! - Pool price polling on the decentralized exchange
//! - Divergence monitor with latched thresholds
//! - Dashboard and metrics

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
