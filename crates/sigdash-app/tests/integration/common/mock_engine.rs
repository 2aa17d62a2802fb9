//! Mock signal engine for integration tests.
//!
//! A minimal HTTP/1.1 server that:
//! - Answers canned JSON per `METHOD path` route
//! - Records every request line it receives
//! - Closes each connection after one response

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;

/// A mock engine API for testing.
pub struct MockEngine {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    routes: Routes,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockEngine {
    /// Start a new mock engine on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let routes_clone = routes.clone();
        let requests_clone = requests.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let routes = routes_clone.clone();
                        let requests = requests_clone.clone();
                        tokio::spawn(handle_connection(stream, routes, requests));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            routes,
            requests,
        }
    }

    /// API root for `ApiClient`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// Answer `method path` (path relative to the API root, without query)
    /// with `status` and `body`.
    pub async fn route(&self, method: &str, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .await
            .insert(format!("{method} {path}"), (status, body.to_string()));
    }

    /// Request lines received so far, e.g. `GET /api/worker/status`.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    /// Number of requests whose line starts with `prefix`.
    pub async fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    /// Poll until a request starting with `prefix` arrives.
    pub async fn wait_for(&self, prefix: &str, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                if self.count(prefix).await > 0 {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    routes: Routes,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    // Read headers.
    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    // Drain the body so the client sees a clean close.
    let mut body_read = buffer.len() - header_end;
    while body_read < content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body_read += n,
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    requests.lock().await.push(format!("{method} {target}"));

    let path = target
        .split('?')
        .next()
        .unwrap_or_default()
        .trim_start_matches("/api/")
        .to_string();
    let (status, body) = routes
        .lock()
        .await
        .get(&format!("{method} {path}"))
        .cloned()
        .unwrap_or((404, r#"{"detail":"no such route"}"#.to_string()));

    let response = format!(
        "HTTP/1.1 {status} MOCK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
