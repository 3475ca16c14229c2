// benches/presenter_performance.rs
//! Benchmarks for the error construction and presentation paths.
//!
//! Errors are built on every failed resolver call and presented once per
//! failed field, so both paths sit on the request hot path.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gqlerr::ring_buffer::RingBufferSink;
use gqlerr::{
    Code, ErrorPresenter, Field, GqlError, LogEntry, LogSink, Path, RequestContext, gql_error,
};
use std::io;
use std::sync::Arc;

/// Sink that renders fields and throws the result away.
struct RenderingSink;

impl LogSink for RenderingSink {
    fn log(&self, entry: &LogEntry<'_>) {
        let mut buffer = String::new();
        let _ = entry.write_to(&mut buffer);
        black_box((entry.level(), entry.message(), buffer));
    }
}

fn resolver_ctx() -> RequestContext {
    RequestContext::with_path(Path::root().field("users").index(2).field("orders"))
}

// ============================================================================
// Construction
// ============================================================================

fn bench_error_creation(c: &mut Criterion) {
    let ctx = resolver_ctx();
    let mut group = c.benchmark_group("error_creation");

    group.bench_function("static_message", |b| {
        b.iter(|| black_box(GqlError::not_found(&ctx, "no muffins", [])))
    });

    group.bench_function("formatted_message", |b| {
        b.iter(|| black_box(gql_error!(&ctx, Code::NotFound, "user {} has no muffins", 42)))
    });

    group.bench_function("with_fields", |b| {
        b.iter(|| {
            black_box(GqlError::internal(&ctx, "db down", [
                Field::string("table", "muffins"),
                Field::int("attempt", 3),
                Field::error(io::Error::other("connection reset")),
            ]))
        })
    });

    group.bench_function("fully_decorated", |b| {
        b.iter(|| {
            black_box(
                GqlError::permission_denied(&ctx, "not an admin", [Field::int("user_id", 7)])
                    .with_message("you cannot do that")
                    .with_error_id("admin_only")
                    .at_info(),
            )
        })
    });

    group.finish();
}

// ============================================================================
// Presentation
// ============================================================================

fn bench_present(c: &mut Criterion) {
    let ctx = resolver_ctx();
    let presenter = ErrorPresenter::new(RenderingSink);
    let mut group = c.benchmark_group("present");

    group.bench_function("gql_error", |b| {
        b.iter(|| {
            let err = GqlError::not_found(&ctx, "no muffins", [Field::int("user_id", 42)]);
            black_box(presenter.present(&ctx, Some(err)))
        })
    });

    group.bench_function("unrecognized_error", |b| {
        b.iter(|| black_box(presenter.present(&ctx, Some(io::Error::other("boom")))))
    });

    group.bench_function("nil_error", |b| {
        b.iter(|| black_box(presenter.present(&ctx, None::<GqlError>)))
    });

    group.finish();
}

fn bench_field_rendering(c: &mut Criterion) {
    let ctx = resolver_ctx();
    let presenter = ErrorPresenter::new(RenderingSink);
    let mut group = c.benchmark_group("field_rendering");

    for size in [16, 1024, 10_000] {
        let payload = Field::string("payload", "A".repeat(size));
        let err = GqlError::internal(&ctx, "large payload", [payload]);
        group.bench_with_input(BenchmarkId::from_parameter(size), &err, |b, err| {
            b.iter(|| presenter.log_error(black_box(err)))
        });
    }

    group.finish();
}

// ============================================================================
// Ring Buffer Sink
// ============================================================================

fn bench_ring_buffer(c: &mut Criterion) {
    let ctx = resolver_ctx();
    let mut group = c.benchmark_group("ring_buffer");

    group.bench_function("log_with_eviction", |b| {
        let presenter = ErrorPresenter::new(RingBufferSink::new(64, 1024));
        let err = GqlError::internal(&ctx, "db down", [Field::string("table", "muffins")]);
        b.iter(|| presenter.log_error(black_box(&err)))
    });

    group.bench_function("concurrent_log", |b| {
        let sink = RingBufferSink::new(256, 1024);
        let presenter = Arc::new(ErrorPresenter::new(sink));
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let presenter = Arc::clone(&presenter);
                    std::thread::spawn(move || {
                        let ctx = RequestContext::background();
                        for _ in 0..32 {
                            presenter.log_error(&GqlError::not_found(&ctx, "missing", []));
                        }
                    })
                })
                .collect();
            for handle in handles {
                let _ = handle.join();
            }
        })
    });

    group.finish();
}

criterion_group!(creation_benches, bench_error_creation);
criterion_group!(presenter_benches, bench_present, bench_field_rendering);
criterion_group!(ring_buffer_benches, bench_ring_buffer);

criterion_main!(creation_benches, presenter_benches, ring_buffer_benches);
