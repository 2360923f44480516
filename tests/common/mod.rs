//! In-process WebSocket server for session tests.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

/// How long a test waits for an expected frame or event.
pub const WAIT: Duration = Duration::from_secs(5);

/// Accepts WebSocket connections on a random local port.
pub struct MockWsServer {
    /// `ws://127.0.0.1:<port>`
    pub base_url: String,
    connections: mpsc::UnboundedReceiver<ServerConnection>,
}

/// One accepted client connection.
pub struct ServerConnection {
    /// Request path and query of the upgrade request.
    pub path_and_query: String,
    /// Headers of the upgrade request.
    pub headers: HeaderMap,
    ws: WebSocketStream<TcpStream>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("ws://{}", listener.local_addr().unwrap());
        let (tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut captured = None;
                    let callback =
                        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                            let path_and_query = request
                                .uri()
                                .path_and_query()
                                .map(|p| p.as_str().to_string())
                                .unwrap_or_default();
                            captured = Some((path_and_query, request.headers().clone()));
                            Ok(response)
                        };
                    let Ok(ws) = accept_hdr_async(stream, callback).await else {
                        return;
                    };
                    let Some((path_and_query, headers)) = captured else {
                        return;
                    };
                    let _ = tx.send(ServerConnection {
                        path_and_query,
                        headers,
                        ws,
                    });
                });
            }
        });

        Self {
            base_url,
            connections,
        }
    }

    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> ServerConnection {
        tokio::time::timeout(WAIT, self.connections.recv())
            .await
            .expect("no client connected")
            .expect("server stopped")
    }

    /// Check that no client connects for `wait`.
    pub async fn expect_no_connection(&mut self, wait: Duration) {
        if let Ok(Some(connection)) = tokio::time::timeout(wait, self.connections.recv()).await {
            panic!("unexpected connection to {}", connection.path_and_query);
        }
    }
}

impl ServerConnection {
    /// Next text frame from the client, parsed as JSON.
    pub async fn recv_json(&mut self) -> serde_json::Value {
        loop {
            let frame = tokio::time::timeout(WAIT, self.ws.next())
                .await
                .expect("no frame from client")
                .expect("client went away")
                .expect("websocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    /// Read `count` text frames.
    pub async fn recv_many(&mut self, count: usize) -> Vec<serde_json::Value> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(self.recv_json().await);
        }
        frames
    }

    /// Check that the client sends nothing for `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, self.ws.next()).await {
            panic!("unexpected frame: {}", text.as_str());
        }
    }

    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .unwrap();
    }

    /// Close the connection from the server side.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        // Drain until the client acknowledges.
        let drain = Duration::from_millis(500);
        while let Ok(Some(Ok(_))) = tokio::time::timeout(drain, self.ws.next()).await {}
    }

    /// Drop the TCP connection without a close handshake.
    pub fn abort(self) {
        drop(self);
    }
}

/// Receive from `rx` or fail after [`WAIT`].
pub async fn recv_event<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no event")
        .expect("sender dropped")
}
