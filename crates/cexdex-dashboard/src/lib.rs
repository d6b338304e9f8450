//! cexdex-dashboard - Web dashboard for the divergence monitor.
//!
//! - REST API for the snapshot, the event log and the thresholds
//! - WebSocket for live updates
//! - Static HTML dashboard UI
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     cexdex-monitor process                    │
//! │                                                              │
//! │  ┌───────────────────┐ on_change  ┌──────────────────────┐   │
//! │  │ DivergenceMonitor │ ─────────▶ │    DashboardState     │   │
//! │  └─────────▲─────────┘            └──────────┬───────────┘   │
//! │            │ current()                       │               │
//! │  ┌─────────┴─────────┐   apply()             │               │
//! │  │  ThresholdHandle  │ ◀──────────┐          │               │
//! │  └───────────────────┘            │          ▼               │
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │       axum HTTP Server (port 8080)                     │   │
//! │  │  GET  /               → Static HTML/JS                 │   │
//! │  │  GET  /api/snapshot   → JSON state                     │   │
//! │  │  GET  /api/log        → paginated log                  │   │
//! │  │  GET/POST /api/thresholds                              │   │
//! │  │  GET  /metrics        → Prometheus text                │   │
//! │  │  GET  /ws             → WebSocket upgrade              │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod broadcast;
mod config;
mod server;
mod state;
mod types;

pub use config::DashboardConfig;
pub use server::{create_router, run_server, serve, AppState};
pub use state::DashboardState;
pub use types::{
    DashboardMessage, DashboardSnapshot, DivergenceSnapshot, ErrorBody, LogEntryView, LogPageView,
    PriceCard,
};
