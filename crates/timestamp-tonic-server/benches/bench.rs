use core::{fmt, hint::black_box};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::stream::FuturesUnordered;
use std::{
    net::TcpStream,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use timestamp_tonic_core::proto::{
    GetCurrentTimestampRequest, StreamTimestampsRequest, TimestampPrecision,
    timestamp_service_client::TimestampServiceClient,
};
use tokio::runtime::Builder;
use tokio_stream::StreamExt;
use tonic::{
    codec::CompressionEncoding,
    transport::{Channel, Uri},
};

#[derive(Clone, Copy, Debug)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

impl From<Compression> for Option<CompressionEncoding> {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => None,
            Compression::Gzip => Some(CompressionEncoding::Gzip),
            Compression::Zstd => Some(CompressionEncoding::Zstd),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct UnaryBenchParams {
    calls_per_task: u64,
    concurrency: usize,
    compression: Compression,
}

fn grpc_bench(c: &mut Criterion) {
    let uri = Uri::try_from("http://127.0.0.1:50051").expect("Invalid URI");
    // Start the server. This may require a full compilation so set the timeout
    // high.
    let mut server = Command::new("cargo")
        .args([
            "run",
            "--bin",
            "timestamp-tonic-server",
            "--release",
            "--",
            "127.0.0.1:50051",
        ])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to start timestamp-tonic-server");
    wait_for_port(uri.authority().expect("missing authority").as_str(), 300);

    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    let mut cases = Vec::new();
    for &concurrency in &[1, 4, 16, 64] {
        for &compression in &[Compression::None, Compression::Gzip, Compression::Zstd] {
            cases.push(UnaryBenchParams {
                calls_per_task: 100,
                concurrency,
                compression,
            });
        }
    }

    for params in &cases {
        let mut group = c.benchmark_group("grpc/get_current_timestamp");
        group.throughput(Throughput::Elements(
            params.calls_per_task * params.concurrency as u64,
        ));
        group.bench_function(
            format!(
                "calls/{}/conc/{}/comp/{}",
                params.calls_per_task, params.concurrency, params.compression,
            ),
            |b| {
                b.to_async(&rt).iter_custom(|iters| {
                    let uri = uri.clone();
                    async move {
                        let channel = Channel::builder(uri)
                            .connect()
                            .await
                            .expect("Failed to connect to server");

                        let start = Instant::now();
                        for _ in 0..iters {
                            run_unary_bench(&channel, params).await;
                        }
                        start.elapsed()
                    }
                });
            },
        );
        group.finish();
    }

    // A 1ms interval keeps the stream close to its scheduling overhead.
    let mut group = c.benchmark_group("grpc/stream_timestamps");
    group.throughput(Throughput::Elements(100));
    group.bench_function("records/100/interval_ms/1", |b| {
        b.to_async(&rt).iter_custom(|iters| {
            let uri = uri.clone();
            async move {
                let channel = Channel::builder(uri)
                    .connect()
                    .await
                    .expect("Failed to connect to server");
                let mut client = TimestampServiceClient::new(channel);

                let start = Instant::now();
                for _ in 0..iters {
                    let mut stream = client
                        .stream_timestamps(StreamTimestampsRequest {
                            interval_ms: 1,
                            max_count: 100,
                            source: "bench".into(),
                            timezone: String::new(),
                            precision: TimestampPrecision::Nanoseconds as i32,
                        })
                        .await
                        .expect("stream call failed")
                        .into_inner();
                    while let Some(record) = stream.next().await {
                        black_box(record.expect("record"));
                    }
                }
                start.elapsed()
            }
        });
    });
    group.finish();

    if server.kill().is_err() {
        eprintln!("failed to kill server");
    }
}

async fn run_unary_bench(channel: &Channel, params: &UnaryBenchParams) {
    let mut tasks = FuturesUnordered::new();

    for _ in 0..params.concurrency {
        let channel = channel.clone();
        let compression = params.compression;
        let calls = params.calls_per_task;

        tasks.push(tokio::spawn(async move {
            let mut client = TimestampServiceClient::new(channel);
            if let Some(encoding) = compression.into() {
                client = client.accept_compressed(encoding).send_compressed(encoding)
            }

            for _ in 0..calls {
                let resp = client
                    .get_current_timestamp(GetCurrentTimestampRequest {
                        source: "bench".into(),
                        timezone: String::new(),
                        precision: TimestampPrecision::Microseconds as i32,
                    })
                    .await
                    .expect("unary call failed")
                    .into_inner();
                black_box(resp);
            }
        }));
    }

    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

pub fn wait_for_port(addr: &str, timeout_secs: u64) {
    let start = Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("Server did not start listening on {}", addr);
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
