//! Demo HTTP server instrumented with [`MetricsService`]
//!
//! Routes:
//! - `/`: 204
//! - `/keys/{id}`: 200, the id is what gets anonymized
//! - `/health`: 200 "OK"
//! - `/metrics`: Prometheus text format
//! - anything else: 404

use anyhow::{Context, Result};
use beacon_core::manager::MetricsManager;
use beacon_core::middleware::MetricsService;
use beacon_core::monitoring::{encode_metrics, TelemetryMetrics};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub struct DemoServer {
    listen_addr: SocketAddr,
    manager: Arc<MetricsManager>,
    metrics: Arc<TelemetryMetrics>,
}

impl DemoServer {
    pub fn new(
        listen_addr: SocketAddr,
        manager: Arc<MetricsManager>,
        metrics: Arc<TelemetryMetrics>,
    ) -> Self {
        Self {
            listen_addr,
            manager,
            metrics,
        }
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .with_context(|| format!("Failed to bind demo server to {}", self.listen_addr))?;

        info!("Demo server listening on http://{}", self.listen_addr);

        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };

            let manager = self.manager.clone();
            let metrics = self.metrics.clone();

            // Spawn a new task for each connection
            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let inner = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let metrics = metrics.clone();
                    async move { handle_request(req, metrics).await }
                });
                let service = MetricsService::new(inner, manager);

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }

        info!("Demo server stopped accepting connections");
        Ok(())
    }
}

/// Handle HTTP request
pub async fn handle_request<B>(
    req: Request<B>,
    metrics: Arc<TelemetryMetrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!("Request: {} {}", req.method(), req.uri().path());
    Ok(route(req.uri().path(), &metrics))
}

fn route(path: &str, metrics: &TelemetryMetrics) -> Response<Full<Bytes>> {
    match path {
        "/" => respond(StatusCode::NO_CONTENT, Bytes::new()),
        "/health" => respond(StatusCode::OK, Bytes::from_static(b"OK")),
        "/metrics" => match encode_metrics(metrics) {
            Ok(text) => {
                let mut response = respond(StatusCode::OK, Bytes::from(text));
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => {
                error!("Failed to encode metrics: {:#}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from(format!("Error: {}", e)),
                )
            }
        },
        _ => match path.strip_prefix("/keys/") {
            Some(id) if !id.is_empty() && !id.contains('/') => {
                respond(StatusCode::OK, Bytes::from(format!("key {}\n", id)))
            }
            _ => respond(StatusCode::NOT_FOUND, Bytes::from_static(b"Not Found")),
        },
    }
}

fn respond(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}
