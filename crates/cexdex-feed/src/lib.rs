//! Price feeds for the divergence monitor.
//!
//! The streamed side arrives as raw trade frames that [`TradeParser`] turns
//! into prices. The polled side is fetched by [`PoolClient`] on a timer
//! driven by [`run_poller`]. [`FeedHealth`] tracks which side is stale.

pub mod error;
pub mod health;
pub mod parser;
pub mod poller;
pub mod pool_client;

pub use error::{FeedError, FeedResult};
pub use health::{FeedHealth, SourceHealth, SourceStatus};
pub use parser::{ParseStats, StreamedTrade, TradeParser};
pub use poller::{run_poller, PollerConfig};
pub use pool_client::{parse_pool_price, PoolClient};
