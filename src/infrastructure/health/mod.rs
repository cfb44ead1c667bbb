//! Liveness endpoint
//!
//! Minimal HTTP responder for the external scheduler's keep-warm probe.
//! One route, `GET /health`; everything else is a 404.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::domain::entities::HealthStatus;

pub struct HealthServer {
    listener: TcpListener,
    status: watch::Receiver<HealthStatus>,
}

enum Route {
    Health,
    NotFound,
}

impl HealthServer {
    pub async fn bind(port: u16, status: watch::Receiver<HealthStatus>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self { listener, status })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve probes until the shutdown signal flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        match self.local_addr() {
            Ok(addr) => tracing::info!("Health endpoint listening on {}", addr),
            Err(e) => tracing::warn!("Health endpoint listening (addr unknown: {})", e),
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let status = *self.status.borrow();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, status).await {
                                tracing::debug!("Health connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => tracing::warn!("Health accept failed: {}", e),
                }
            }
        }

        tracing::info!("Health endpoint stopped");
    }
}

async fn handle_connection(mut stream: TcpStream, status: HealthStatus) -> std::io::Result<()> {
    // A probe request fits in one read; only the request line matters.
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let head = String::from_utf8_lossy(&buf[..n]);
    let request_line = head.lines().next().unwrap_or_default();

    let (status_line, body) = match route(request_line) {
        Route::Health => match status {
            HealthStatus::Ok => ("200 OK", r#"{"status":"OK"}"#),
            HealthStatus::Degraded => ("503 Service Unavailable", r#"{"status":"DEGRADED"}"#),
        },
        Route::NotFound => ("404 Not Found", r#"{"error":"not found"}"#),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn route(request_line: &str) -> Route {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    if method == "GET" && (path == "/health" || path.starts_with("/health?")) {
        Route::Health
    } else {
        Route::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_only_get_health() {
        assert!(matches!(route("GET /health HTTP/1.1"), Route::Health));
        assert!(matches!(route("GET /health?probe=1 HTTP/1.1"), Route::Health));
        assert!(matches!(route("POST /health HTTP/1.1"), Route::NotFound));
        assert!(matches!(route("GET /other HTTP/1.1"), Route::NotFound));
        assert!(matches!(route(""), Route::NotFound));
    }
}
