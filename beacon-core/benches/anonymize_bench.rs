//! Anonymization Benchmarks
//!
//! Measures the per-request cost added by the middleware before the event is
//! enqueued: path hashing, query parsing and hashing, and the full page event.
//!
//! ## Scenarios
//!
//! - Whitelisted path (no hashing)
//! - Key path (one salted hash)
//! - Query with several keys and repeated values

use beacon_core::anonymize::{Anonymizer, QueryParams};
use beacon_core::config::TelemetryConfig;
use beacon_core::manager::{MetricsManager, RequestRecord};
use beacon_core::transport::NoopTransport;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hyper::{Method, StatusCode, Uri};
use std::sync::Arc;

const SALT: &str = "somesupersaltysalt";

fn anonymizer() -> Anonymizer {
    Anonymizer::new(vec!["/".to_string(), "/health".to_string()], SALT)
}

fn path_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("anonymize/path");
    let anonymizer = anonymizer();

    group.bench_function("whitelisted", |b| {
        b.iter(|| anonymizer.anonymize_path(black_box("/health")));
    });

    group.bench_function("key", |b| {
        b.iter(|| anonymizer.anonymize_path(black_box("/keys/1234")));
    });

    group.bench_function("nested", |b| {
        b.iter(|| anonymizer.anonymize_path(black_box("/v1/accounts/42/keys/deadbeef")));
    });

    group.finish();
}

fn query_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("anonymize/query");
    let anonymizer = anonymizer();
    let raw = "foo=bar&foo=baz&foo2=bar2&foo2=baz2&token=abcdef0123456789";

    group.bench_function("parse", |b| {
        b.iter(|| QueryParams::parse(black_box(raw)));
    });

    let query = QueryParams::parse(raw);
    group.bench_function("hash", |b| {
        b.iter(|| anonymizer.anonymize_query(black_box(&query)));
    });

    group.finish();
}

fn page_event_bench(c: &mut Criterion) {
    let config = TelemetryConfig {
        service_id: "bench".to_string(),
        whitelisted_paths: vec!["/".to_string()],
        salt: Some(SALT.to_string()),
        ..Default::default()
    };
    let manager = match MetricsManager::new(&config, Arc::new(NoopTransport)) {
        Ok(manager) => manager,
        Err(e) => panic!("invalid bench config: {}", e),
    };
    let record = RequestRecord::new(
        Method::GET,
        Uri::from_static("/keys/1234?foo=bar&foo2=baz2"),
        StatusCode::OK,
    )
    .with_size(Some(128));

    c.bench_function("anonymize/page_event", |b| {
        b.iter(|| manager.page_event(black_box(&record)));
    });
}

criterion_group!(benches, path_bench, query_bench, page_event_bench);
criterion_main!(benches);
