//! Main application.
//!
//! One event loop owns the [`DivergenceMonitor`]. Trade frames arrive from
//! the connection task and pool prices from the poller task, both over
//! mpsc channels, so handlers never interleave and a streamed tick always
//! sees the reference from the latest completed poll.

use crate::config::AppConfig;
use crate::error::AppResult;
use cexdex_core::{LogEntry, PriceSource};
use cexdex_dashboard::DashboardState;
use cexdex_detector::{DivergenceMonitor, ThresholdHandle};
use cexdex_feed::{run_poller, FeedError, FeedHealth, FeedResult, PollerConfig, PoolClient, TradeParser};
use cexdex_telemetry::{Metrics, MetricsObserver};
use cexdex_ws::{ConnectionManager, WsEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Grace period for the connection task to send its Close frame.
const WS_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Application {
    config: AppConfig,
    monitor: DivergenceMonitor,
    thresholds: ThresholdHandle,
    health: Arc<FeedHealth>,
    parser: TradeParser,
    dashboard: DashboardState,
    shutdown: CancellationToken,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let mut monitor = DivergenceMonitor::new(config.monitor);
        let thresholds = ThresholdHandle::new(config.thresholds);
        let health = Arc::new(FeedHealth::new(config.feed.stale_after_ms));
        let dashboard = DashboardState::new(
            monitor.view(),
            thresholds.clone(),
            health.clone(),
            &config.dashboard,
        );

        monitor.subscribe(Arc::new(dashboard.clone()));
        monitor.subscribe(Arc::new(MetricsObserver));

        let current = thresholds.current();
        Metrics::thresholds(current.min_diff, current.max_diff);
        Metrics::latch(monitor.armed());

        Ok(Self {
            parser: TradeParser::for_symbol(config.symbol.clone()),
            config,
            monitor,
            thresholds,
            health,
            dashboard,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn monitor(&self) -> &DivergenceMonitor {
        &self.monitor
    }

    pub fn thresholds(&self) -> ThresholdHandle {
        self.thresholds.clone()
    }

    pub fn dashboard_state(&self) -> DashboardState {
        self.dashboard.clone()
    }

    pub fn health(&self) -> Arc<FeedHealth> {
        self.health.clone()
    }

    /// Cancelling this token stops [`Application::run`] like Ctrl-C does.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Handle one event from the trade stream.
    pub fn handle_ws_event(&mut self, event: WsEvent) -> Option<LogEntry> {
        match event {
            WsEvent::Connected => {
                info!("Trade stream connected");
                Metrics::ws_connected();
                None
            }
            WsEvent::Text(text) => self.handle_trade_frame(&text),
            WsEvent::Closed { code, reason } => {
                warn!(code, %reason, "Trade stream closed, not reconnecting");
                Metrics::ws_disconnected();
                self.health.record_failure(
                    PriceSource::Streamed,
                    format!("connection closed: code={code} reason={reason}"),
                );
                self.publish_stale(PriceSource::Streamed);
                None
            }
        }
    }

    fn handle_trade_frame(&mut self, text: &str) -> Option<LogEntry> {
        match self.parser.parse(text) {
            Ok(Some(trade)) => {
                self.health.record_success(PriceSource::Streamed);
                self.publish_stale(PriceSource::Streamed);
                let thresholds = self.thresholds.current();
                self.monitor.on_streamed_price(trade.price, &thresholds)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Discarding malformed trade frame");
                Metrics::feed_error(PriceSource::Streamed.as_str(), e.kind());
                None
            }
        }
    }

    /// Handle one pool poll result. Never evaluates thresholds.
    pub fn handle_poll_result(&mut self, result: FeedResult<f64>) {
        match result {
            Ok(price) => {
                self.health.record_success(PriceSource::Polled);
                self.monitor.on_reference_price(price);
            }
            Err(e) => {
                Metrics::feed_error(PriceSource::Polled.as_str(), e.kind());
                match &e {
                    FeedError::Unavailable(reason) => {
                        warn!(%reason, "Pool price unavailable");
                        self.health.record_failure(PriceSource::Polled, reason.clone());
                    }
                    FeedError::Parse(reason) => {
                        warn!(%reason, "Discarding malformed pool response");
                    }
                }
            }
        }
        self.publish_stale(PriceSource::Polled);
    }

    fn publish_stale(&self, source: PriceSource) {
        Metrics::feed_stale(source.as_str(), self.health.is_stale(source));
    }

    /// Run until Ctrl-C or the shutdown token fires.
    pub async fn run(mut self) -> AppResult<()> {
        info!(
            ws_url = %self.config.ws_url,
            stream = %self.config.stream_name(),
            pool = %self.config.pool_address,
            "Starting application"
        );

        let capacity = self.config.feed.channel_capacity;
        let (ws_tx, mut ws_rx) = mpsc::channel::<WsEvent>(capacity);
        let (poll_tx, mut poll_rx) = mpsc::channel::<FeedResult<f64>>(capacity);

        let connection_manager = Arc::new(ConnectionManager::new(
            self.config.connection_config(),
            ws_tx,
        ));
        let connection_manager_clone = connection_manager.clone();
        let ws_handle = tokio::spawn(async move {
            if let Err(e) = connection_manager_clone.connect().await {
                error!(error = %e, "Trade stream connection ended with error");
            }
        });

        let pool_client = PoolClient::with_timeout(
            &self.config.pool_api_url,
            &self.config.pool_address,
            Duration::from_millis(self.config.feed.request_timeout_ms),
        )?;
        let poller_token = self.shutdown.child_token();
        let poller_handle = tokio::spawn(run_poller(
            pool_client,
            PollerConfig {
                interval: Duration::from_millis(self.config.feed.poll_interval_ms),
            },
            poll_tx,
            poller_token.clone(),
        ));

        let dashboard_handle = if self.config.dashboard.enabled {
            let state = self.dashboard.clone();
            let config = self.config.dashboard.clone();
            let token = self.shutdown.child_token();
            Some(tokio::spawn(async move {
                if let Err(e) = cexdex_dashboard::run_server(state, config, token).await {
                    error!(error = %e, "Dashboard server failed");
                }
            }))
        } else {
            info!("Dashboard disabled");
            None
        };

        info!("Entering main event loop");
        let mut entries = 0u64;
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                Some(event) = ws_rx.recv() => {
                    if let Some(entry) = self.handle_ws_event(event) {
                        entries += 1;
                        debug!(sequence = entry.sequence, event = %entry.event, "Log entry recorded");
                    }
                }

                Some(result) = poll_rx.recv() => {
                    self.handle_poll_result(result);
                }

                () = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(entries, "Shutting down");

        // Release the periodic task and close the socket
        poller_token.cancel();
        self.shutdown.cancel();
        connection_manager.shutdown();

        if tokio::time::timeout(WS_SHUTDOWN_TIMEOUT, ws_handle)
            .await
            .is_err()
        {
            warn!("Trade stream did not close in time");
        }
        if let Err(e) = poller_handle.await {
            warn!(error = %e, "Poller task failed");
        }
        if let Some(handle) = dashboard_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Dashboard task failed");
            }
        }

        Ok(())
    }
}
