use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rask_remote_logger::buffer::StagingQueue;
use rask_remote_logger::sender::{
    ConnectionFactory, OutboundRequest, Payload, PayloadEncoder, TransportError,
};
use rask_remote_logger::{LogEvent, LogLevel, PipelineConfig, RemoteLogger};
use std::hint::black_box;
use std::time::Duration;
use url::Url;

struct NullCollector;
struct NullRequest;

impl OutboundRequest for NullRequest {
    async fn send(self, payload: Payload) -> Result<u16, TransportError> {
        black_box(payload);
        Ok(202)
    }
}

impl ConnectionFactory for NullCollector {
    type Request = NullRequest;

    fn create(&self, _endpoint: &Url) -> Result<NullRequest, TransportError> {
        Ok(NullRequest)
    }
}

fn sample_event() -> LogEvent {
    LogEvent::builder(LogLevel::Warn, "bench.logger", "request took longer than expected")
        .context_entry("path", "/api/orders")
        .context_entry("elapsed_ms", "812")
        .build()
}

fn benchmark_submit(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    let mut config = PipelineConfig::new(Url::parse("http://collector.bench/log").unwrap());
    config.overflow.max_queue_size = 1_000_000;
    let logger = RemoteLogger::with_runtime(config, NullCollector, runtime.handle()).unwrap();
    let event = sample_event();

    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("admitted", |b| {
        b.iter(|| logger.submit(black_box(event.clone())));
    });

    let debug_event = LogEvent::builder(LogLevel::Debug, "bench.logger", "filtered").build();
    group.bench_function("filtered", |b| {
        b.iter(|| logger.submit(black_box(debug_event.clone())));
    });

    group.finish();

    runtime.block_on(logger.shutdown(Duration::from_secs(5)));
}

fn benchmark_queue(c: &mut Criterion) {
    let queue = StagingQueue::new();
    let event = sample_event();

    c.bench_function("queue_insert_remove", |b| {
        b.iter(|| {
            queue.insert(black_box(event.clone())).unwrap();
            black_box(queue.try_remove())
        });
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let event = sample_event();
    let plain = PayloadEncoder::new(false);
    let gzip = PayloadEncoder::new(true);

    let mut group = c.benchmark_group("encode");
    group.bench_function("json", |b| b.iter(|| plain.encode(black_box(&event))));
    group.bench_function("json_gzip", |b| b.iter(|| gzip.encode(black_box(&event))));
    group.finish();
}

criterion_group!(benches, benchmark_submit, benchmark_queue, benchmark_encode);
criterion_main!(benches);
