//! The upstream ingestor: a ZeroMQ SUB socket consumer bridged onto the
//! async runtime via a blocking task, mirroring the shape the teacher uses
//! to drive synchronous C-library bindings (`rocksdb`, `sqlite-lambda`) from
//! async code — see `rocksdb`-adjacent `spawn_blocking` usage in the pack.

use crate::relay::Relay;
use crate::retention::RetentionStore;
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How often to log rolling counters, in received-message count.
const MESSAGE_LOG_INTERVAL: u64 = 10_000;
/// How often to log rolling counters, in error count.
const ERROR_LOG_INTERVAL: u64 = 10;
/// Back-off after a malformed frame or socket error.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Runs the ingest loop until `cancel` fires. Returns only on cancellation
/// or an unrecoverable setup failure (e.g. the ZMQ socket can't be opened).
pub async fn run(
    upstream_url: String,
    upstream_timeout: Duration,
    relay: Arc<Relay>,
    store: Option<Arc<dyn RetentionStore>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(64);

    let socket_cancel = cancel.clone();
    let socket_task = tokio::task::spawn_blocking(move || {
        recv_loop(&upstream_url, upstream_timeout, frame_tx, socket_cancel)
    });

    let mut messages: u64 = 0;
    let mut errors: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("ingestor shutting down");
                break;
            }
            frame = frame_rx.recv() => {
                let Some(frame) = frame else {
                    tracing::warn!("upstream socket task ended; ingestor shutting down");
                    break;
                };
                if frame.is_empty() {
                    continue;
                }
                match decode_event(&frame) {
                    Ok(event) => {
                        messages += 1;
                        relay.process_event(&event);
                        if let Some(store) = &store {
                            if let Err(err) = store.store_event(event).await {
                                tracing::warn!(error = %err, "failed to persist event to retention store");
                            }
                        }
                        if messages % MESSAGE_LOG_INTERVAL == 0 {
                            tracing::info!(messages, errors, "ingestor progress");
                        }
                    }
                    Err(err) => {
                        errors += 1;
                        tracing::error!(error = %err, "malformed upstream frame");
                        if errors % ERROR_LOG_INTERVAL == 0 {
                            tracing::warn!(messages, errors, "ingestor error rate");
                        }
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                }
            }
        }
    }

    // The recv loop observes `cancel` on its own and drops the socket on exit.
    let _ = socket_task.await;
    Ok(())
}

/// Decompresses a DEFLATE/zlib-framed frame and decodes it as a single JSON
/// document.
fn decode_event(frame: &[u8]) -> anyhow::Result<serde_json::Value> {
    let mut decoder = ZlibDecoder::new(frame);
    let mut inflated = String::new();
    decoder
        .read_to_string(&mut inflated)
        .map_err(|err| anyhow::anyhow!("zlib inflate failed: {err}"))?;
    let event = serde_json::from_str(&inflated)?;
    Ok(event)
}

/// Blocking ZMQ SUB recv loop, run on a dedicated thread via
/// `spawn_blocking`. Forwards raw frames over `frame_tx`; exits when `cancel`
/// fires or the channel's receiver is dropped.
fn recv_loop(
    upstream_url: &str,
    upstream_timeout: Duration,
    frame_tx: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
) {
    let ctx = zmq::Context::new();
    let socket = match ctx.socket(zmq::SUB) {
        Ok(socket) => socket,
        Err(err) => {
            tracing::error!(error = %err, "failed to create ZMQ socket");
            return;
        }
    };

    if let Err(err) = socket.connect(upstream_url) {
        tracing::error!(error = %err, upstream_url, "failed to connect to upstream");
        return;
    }
    if let Err(err) = socket.set_subscribe(b"") {
        tracing::error!(error = %err, "failed to subscribe to all topics");
        return;
    }
    if let Err(err) = socket.set_rcvtimeo(upstream_timeout.as_millis() as i32) {
        tracing::error!(error = %err, "failed to set receive timeout");
        return;
    }

    tracing::info!(upstream_url, "connected to upstream");

    while !cancel.is_cancelled() {
        match socket.recv_bytes(0) {
            Ok(frame) => {
                if frame_tx.blocking_send(frame).is_err() {
                    break;
                }
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(err) => {
                tracing::error!(error = %err, "upstream recv error");
                std::thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    tracing::debug!("ingestor socket thread exiting");
}
