//! Mock trade-stream server for integration tests.
//!
//! Acknowledges SUBSCRIBE requests, then pushes a scripted list of frames
//! and optionally closes the socket.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// What the server does after acknowledging a subscription.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Frames pushed after the ack.
    pub frames: Vec<String>,
    /// Reply with an error instead of an ack.
    pub reject_subscribe: bool,
    /// Send a Close frame after the scripted frames.
    pub close_after: bool,
    /// Send a Ping before the scripted frames.
    pub ping_first: bool,
}

#[derive(Default)]
struct Recorded {
    messages: Vec<String>,
    pongs: u32,
    close_received: bool,
}

pub struct MockStreamServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockStreamServer {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let recorded_clone = recorded.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(stream, script.clone(), recorded_clone.clone()));
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            recorded,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn received_messages(&self) -> Vec<String> {
        self.recorded.lock().await.messages.clone()
    }

    pub async fn pong_count(&self) -> u32 {
        self.recorded.lock().await.pongs
    }

    pub async fn close_received(&self) -> bool {
        self.recorded.lock().await.close_received
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, script: Script, recorded: Arc<Mutex<Recorded>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                recorded.lock().await.messages.push(text.clone());

                let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&text) else {
                    continue;
                };
                if parsed.get("method") != Some(&serde_json::json!("SUBSCRIBE")) {
                    continue;
                }
                let id = parsed.get("id").cloned().unwrap_or(serde_json::json!(0));

                if script.reject_subscribe {
                    let response = serde_json::json!({
                        "error": {"code": 2, "msg": "Invalid request"},
                        "id": id
                    });
                    let _ = write.send(Message::Text(response.to_string())).await;
                    continue;
                }

                let ack = serde_json::json!({"result": null, "id": id});
                let _ = write.send(Message::Text(ack.to_string())).await;

                if script.ping_first {
                    let _ = write.send(Message::Ping(b"hb".to_vec())).await;
                }
                for frame in &script.frames {
                    let _ = write.send(Message::Text(frame.clone())).await;
                }
                if script.close_after {
                    let _ = write
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Away,
                            reason: "maintenance".into(),
                        })))
                        .await;
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Pong(_)) => {
                recorded.lock().await.pongs += 1;
            }
            Ok(Message::Close(_)) => {
                recorded.lock().await.close_received = true;
                break;
            }
            Err(_) => break,
            _ => {}
        }
    }
}

pub fn trade_frame(price: &str) -> String {
    serde_json::json!({
        "e": "trade",
        "E": 1_700_000_000_000u64,
        "s": "BTCUSDC",
        "t": 1,
        "p": price,
        "q": "0.01",
        "T": 1_700_000_000_000u64,
        "m": false,
        "M": true
    })
    .to_string()
}
