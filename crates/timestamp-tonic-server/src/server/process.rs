//! Server lifecycle.
//!
//! [`ServerProcess`] owns the timestamp service and serves it, together with
//! the health and reflection services, on whatever listener it is handed. It
//! runs until its [`ShutdownHandle`] fires. The entry point keeps the process
//! and gives only the handle to the signal listener.
//!
//! Shutdown order:
//! 1. Health flips to `NOT_SERVING`.
//! 2. Every in-flight stream is cancelled and ends with `OK`.
//! 3. tonic drains connections and the listener is dropped.

use crate::server::{config::ServerConfig, service::handler::TimestampHandler};
use futures::Stream;
use timestamp_tonic_core::proto::{
    FILE_DESCRIPTOR_SET, timestamp_service_server::TimestampServiceServer,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tonic::{
    codec::CompressionEncoding,
    transport::{Server, server::Connected},
};
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Cloneable trigger for a graceful shutdown.
///
/// Safe to fire any number of times, from any task, before or while the server
/// runs.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    async fn wait(&self) {
        self.token.cancelled().await;
    }
}

pub struct ServerProcess {
    config: ServerConfig,
    service: TimestampHandler,
    shutdown: ShutdownHandle,
}

impl ServerProcess {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            service: TimestampHandler::new(config.clone()),
            config,
            shutdown: ShutdownHandle::default(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serves on `incoming` until the shutdown handle fires.
    ///
    /// Consumes the process: there is no restart after shutdown.
    pub async fn run_with_incoming<I, IO, IE>(self, incoming: I) -> anyhow::Result<()>
    where
        I: Stream<Item = Result<IO, IE>>,
        IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
        IE: Into<tower::BoxError>,
    {
        let Self {
            service, shutdown, ..
        } = self;

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<TimestampServiceServer<TimestampHandler>>()
            .await;

        let reflection = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let on_shutdown = {
            let service = service.clone();
            async move {
                shutdown.wait().await;
                tracing::info!("Shutdown requested, terminating gracefully...");

                health_reporter
                    .set_not_serving::<TimestampServiceServer<TimestampHandler>>()
                    .await;
                service.shutdown();
            }
        };

        Server::builder()
            .accept_http1(true)
            .layer(
                ServiceBuilder::new()
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(GrpcWebLayer::new()),
            )
            .add_service(health_service)
            .add_service(reflection)
            .add_service(build_timestamp_service(service))
            .serve_with_incoming_shutdown(incoming, on_shutdown)
            .await?;

        tracing::info!("Timestamp service shut down");
        Ok(())
    }
}

fn build_timestamp_service(service: TimestampHandler) -> TimestampServiceServer<TimestampHandler> {
    TimestampServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use timestamp_tonic_core::proto::{
        GetCurrentTimestampRequest, StreamTimestampsRequest, TimestampPrecision,
        timestamp_service_client::TimestampServiceClient,
    };
    use tokio::net::TcpListener;
    use tokio_stream::{StreamExt, wrappers::TcpListenerStream};

    #[test]
    fn shutdown_handle_is_idempotent() {
        let process = ServerProcess::new(ServerConfig::default());
        let handle = process.shutdown_handle();
        assert!(!handle.token.is_cancelled());

        handle.shutdown();
        handle.clone().shutdown();
        assert!(handle.token.is_cancelled());
        assert!(process.shutdown_handle().token.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serves_unary_and_stream_then_shuts_down() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let process = ServerProcess::new(ServerConfig::default());
        let handle = process.shutdown_handle();
        let server = tokio::spawn(process.run_with_incoming(TcpListenerStream::new(listener)));

        let mut client = TimestampServiceClient::connect(format!("http://{addr}")).await?;

        let resp = client
            .get_current_timestamp(GetCurrentTimestampRequest {
                source: "e2e".into(),
                timezone: "Asia/Tokyo".into(),
                precision: TimestampPrecision::Milliseconds as i32,
            })
            .await?
            .into_inner();
        let record = resp.timestamp_record.expect("record present");
        assert_eq!(record.timezone, "UTC");
        assert_eq!(record.source, "e2e");
        assert_eq!(record.precision(), TimestampPrecision::Milliseconds);
        assert!(resp.processing_time_ns >= 0);

        let mut stream = client
            .stream_timestamps(StreamTimestampsRequest {
                interval_ms: 10,
                max_count: 3,
                source: "e2e".into(),
                timezone: String::new(),
                precision: 0,
            })
            .await?
            .into_inner();
        let mut messages = Vec::new();
        while let Some(record) = stream.next().await {
            messages.push(record?.message);
        }
        assert_eq!(
            messages,
            [
                "Stream timestamp #1",
                "Stream timestamp #2",
                "Stream timestamp #3"
            ]
        );

        // An unbounded stream must not hold up shutdown.
        let mut open = client
            .stream_timestamps(StreamTimestampsRequest {
                interval_ms: 60_000,
                max_count: 0,
                source: "e2e".into(),
                timezone: String::new(),
                precision: 0,
            })
            .await?
            .into_inner();
        open.next().await.expect("first record")?;

        handle.shutdown();
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(item) = open.next().await {
                item?;
            }
            Ok::<_, tonic::Status>(())
        })
        .await?;
        drained?;

        tokio::time::timeout(Duration::from_secs(5), server).await???;
        Ok(())
    }
}
