//! Mock exchange and pool servers for end-to-end tests.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub const POOL: &str = "0x4e962BB3889Bf030368F56810A9c96B83CB3E778";

#[derive(Default)]
struct Recorded {
    subscriptions: Vec<Value>,
    close_received: bool,
}

/// Trade stream server. Frames passed to [`MockExchange::push`] go to every
/// subscribed client.
#[derive(Clone)]
pub struct MockExchange {
    addr: SocketAddr,
    push_tx: broadcast::Sender<String>,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockExchange {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (push_tx, _) = broadcast::channel::<String>(64);
        let recorded = Arc::new(Mutex::new(Recorded::default()));

        let push_clone = push_tx.clone();
        let recorded_clone = recorded.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_connection(
                    stream,
                    push_clone.clone(),
                    recorded_clone.clone(),
                ));
            }
        });

        Self {
            addr,
            push_tx,
            recorded,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn push(&self, frame: String) {
        let _ = self.push_tx.send(frame);
    }

    pub async fn subscriptions(&self) -> Vec<Value> {
        self.recorded.lock().await.subscriptions.clone()
    }

    pub async fn close_received(&self) -> bool {
        self.recorded.lock().await.close_received
    }
}

async fn handle_connection(
    stream: TcpStream,
    push_tx: broadcast::Sender<String>,
    recorded: Arc<Mutex<Recorded>>,
) {
    let Ok(ws_stream) = accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws_stream.split();
    let mut push_rx = push_tx.subscribe();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let Ok(parsed) = serde_json::from_str::<Value>(&text) else {
                        continue;
                    };
                    if parsed.get("method") == Some(&json!("SUBSCRIBE")) {
                        let id = parsed.get("id").cloned().unwrap_or(json!(0));
                        let ack = json!({"result": null, "id": id});
                        let _ = write.send(Message::Text(ack.to_string())).await;
                        recorded.lock().await.subscriptions.push(parsed);
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) => {
                    recorded.lock().await.close_received = true;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
            Ok(frame) = push_rx.recv() => {
                if write.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Pool API server returning whatever price is currently set.
#[derive(Clone)]
pub struct MockPool {
    addr: SocketAddr,
    response: Arc<Mutex<(StatusCode, Value)>>,
}

impl MockPool {
    pub async fn start(initial_price: &str) -> Self {
        let response = Arc::new(Mutex::new((StatusCode::OK, pool_doc(initial_price))));
        let app = Router::new()
            .route("/pools/{address}", get(pool_handler))
            .with_state(response.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, response }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/pools/", self.addr)
    }

    pub async fn set_price(&self, price: &str) {
        *self.response.lock().await = (StatusCode::OK, pool_doc(price));
    }

    pub async fn set_unavailable(&self) {
        *self.response.lock().await = (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"errors": [{"status": "503"}]}),
        );
    }
}

async fn pool_handler(
    State(response): State<Arc<Mutex<(StatusCode, Value)>>>,
    Path(address): Path<String>,
) -> (StatusCode, Json<Value>) {
    if address != POOL {
        return (StatusCode::NOT_FOUND, Json(json!({"errors": []})));
    }
    let (status, body) = response.lock().await.clone();
    (status, Json(body))
}

pub fn pool_doc(price: &str) -> Value {
    json!({"data": {"attributes": {"base_token_price_usd": price}}})
}

pub fn trade_frame(symbol: &str, price: &str) -> String {
    json!({
        "e": "trade",
        "E": 1_700_000_000_000u64,
        "s": symbol,
        "t": 1,
        "p": price,
        "q": "0.01",
        "T": 1_700_000_000_000u64,
        "m": false,
        "M": true
    })
    .to_string()
}

/// Poll `check` every 20 ms until it holds or 5 s pass.
pub async fn wait_until<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
