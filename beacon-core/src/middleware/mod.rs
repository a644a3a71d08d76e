//! hyper middleware that reports every request to the [`MetricsManager`]
//!
//! The wrapped service always runs; its response or error is returned
//! untouched. Reporting happens after the response is produced and only
//! enqueues an event, so the added latency is a hash and a channel send.

use crate::manager::{MetricsManager, RequestRecord};
use hyper::body::Body;
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Wraps an inner hyper service with request telemetry
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    manager: Arc<MetricsManager>,
}

impl<S> MetricsService<S> {
    pub fn new(inner: S, manager: Arc<MetricsManager>) -> Self {
        Self { inner, manager }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Body + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let future = self.inner.call(req);
        let manager = self.manager.clone();

        Box::pin(async move {
            let result = future.await;

            if let Ok(response) = &result {
                let record = RequestRecord::new(method, uri, response.status())
                    .with_size(response.body().size_hint().exact())
                    .with_latency(start.elapsed());
                manager.track_request(&record);
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;
    use crate::testing::RecordingTransport;
    use crate::transport::EventKind;
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use hyper::StatusCode;
    use serde_json::Value;
    use std::convert::Infallible;

    fn manager(transport: &RecordingTransport) -> Arc<MetricsManager> {
        let config = TelemetryConfig {
            service_id: "svc".to_string(),
            is_production: true,
            write_key: "wk".to_string(),
            whitelisted_paths: vec!["/keys".to_string()],
            salt: Some("somesupersaltysalt".to_string()),
            ..Default::default()
        };
        Arc::new(MetricsManager::new(&config, Arc::new(transport.clone())).unwrap())
    }

    async fn no_content(
        _req: Request<Full<Bytes>>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;
        Ok(response)
    }

    #[tokio::test]
    async fn test_passes_response_through_and_tracks() {
        let transport = RecordingTransport::new();
        let service = MetricsService::new(service_fn(no_content), manager(&transport));

        let req = Request::builder()
            .method("DELETE")
            .uri("/keys/1234")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = service.call(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let events = transport.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Page);
        assert_eq!(events[0].properties["method"], Value::from("DELETE"));
        assert_eq!(events[0].properties["status"], Value::from(204));
        assert_eq!(events[0].properties["size"], Value::from(0));
        assert_eq!(
            events[0].name,
            "/keys/1ff859393eee86e018a4181951953d3658f8935f981646fc83155bf42d958eb5"
        );
    }

    #[tokio::test]
    async fn test_inner_error_passes_through_untracked() {
        let transport = RecordingTransport::new();
        let failing = service_fn(|_req: Request<Full<Bytes>>| async {
            Err::<Response<Full<Bytes>>, &'static str>("boom")
        });
        let service = MetricsService::new(failing, manager(&transport));

        let req = Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();

        assert_eq!(service.call(req).await.unwrap_err(), "boom");
        assert_eq!(transport.count(), 0);
    }
}
