//! The decompress-and-forward pipeline.
//!
//! One archive stream goes in; each decoded line is delivered to the sink in
//! file order, one request in flight at a time. Decoding runs on the blocking
//! pool and feeds lines through a short queue so the bzip2 work never stalls
//! the async executor.

use bytes::Bytes;
use eddn_replay_types::{Progress, Record};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, error, info, warn};

use crate::decompress::bz2_lines;
use crate::lines::{DEFAULT_MAX_LINE_BYTES, LineError};
use crate::sink::{Delivery, DeliveryError, Sink};

/// Decoded lines buffered ahead of delivery.
const LINE_QUEUE_DEPTH: usize = 16;

type LineItem = Result<Vec<u8>, LineError>;

/// Options for one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Longest line accepted, in bytes. Longer lines are skipped.
    pub max_line_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// What happened to one archive stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Lines whose delivery attempt completed, successfully or not.
    pub lines: u64,
    /// Lines the sink accepted at the transport level.
    pub delivered: u64,
    /// Lines whose delivery failed in transport.
    pub delivery_failures: u64,
    /// Delivered lines whose header could not be decoded.
    pub parse_failures: u64,
    /// Oversized lines dropped before delivery.
    pub skipped_lines: u64,
    /// Terminal read or decode error, if the stream ended early.
    pub decode_error: Option<String>,
    /// True if the run was cancelled while this stream was in progress.
    pub cancelled: bool,
}

impl StreamOutcome {
    /// Returns true if every line was read and delivered.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.delivery_failures == 0
            && self.skipped_lines == 0
            && self.decode_error.is_none()
            && !self.cancelled
    }
}

/// Decompresses one bzip2 archive stream and forwards every line to `sink`.
///
/// Per-line faults (transport failures, undecodable headers, oversized
/// lines) are logged and skipped. A decode error ends the stream and is
/// logged once the delivered lines are accounted for. Nothing here aborts
/// the run.
///
/// `progress` is started if idle and updated after each delivered line;
/// resetting it between streams is up to the caller. When `cancel` fires the
/// remaining lines are abandoned, and a line whose delivery was interrupted
/// is not counted.
///
/// The reader is consumed and dropped before this returns, on every path.
/// A read blocked on a stalled stream fails as soon as `cancel` fires.
pub async fn forward_stream<R, S>(
    reader: R,
    sink: &S,
    progress: &mut Progress,
    options: &PipelineOptions,
    cancel: &CancellationToken,
) -> StreamOutcome
where
    R: AsyncRead + Send + Unpin + 'static,
    S: Sink + ?Sized,
{
    progress.begin();
    let mut outcome = StreamOutcome::default();

    let (tx, mut rx) = mpsc::channel::<LineItem>(LINE_QUEUE_DEPTH);
    let bridge = SyncIoBridge::new(CancellableReader::new(reader, cancel.clone()));
    let max_line_bytes = options.max_line_bytes;
    let decoder = tokio::task::spawn_blocking(move || decode_into(bridge, max_line_bytes, &tx));

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            next = rx.recv() => Some(next),
        };
        let Some(next) = next else {
            outcome.cancelled = true;
            break;
        };
        let Some(item) = next else {
            break;
        };

        let line = match item {
            Ok(line) => Bytes::from(line),
            Err(LineError::TooLong { len, max }) => {
                warn!(len, max, "Skipping oversized line");
                progress.record_skipped_line();
                outcome.skipped_lines += 1;
                continue;
            }
            Err(LineError::Decode(_)) if cancel.is_cancelled() => {
                outcome.cancelled = true;
                break;
            }
            Err(LineError::Decode(e)) => {
                outcome.decode_error = Some(e.to_string());
                break;
            }
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = sink.deliver(line.clone()) => Some(result),
        };
        let Some(result) = result else {
            outcome.cancelled = true;
            break;
        };
        outcome.lines += 1;
        complete_line(&line, result, progress, &mut outcome);
    }

    // A decoder blocked on a full queue exits on its next send
    drop(rx);
    if let Err(e) = decoder.await {
        error!(error = %e, "Decoder task failed");
    }
    if outcome.cancelled {
        info!(lines = outcome.lines, "Stream cancelled");
    }

    if let Some(e) = &outcome.decode_error {
        error!(error = %e, "Error reading from bzip2 reader");
    }

    outcome
}

/// Archive reader that fails once the run is cancelled, releasing a decoder
/// parked on a stalled body.
struct CancellableReader<R> {
    inner: R,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl<R> CancellableReader<R> {
    fn new(inner: R, cancel: CancellationToken) -> Self {
        let cancelled = Box::pin(cancel.clone().cancelled_owned());
        Self {
            inner,
            cancel,
            cancelled,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CancellableReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        // The token is checked first so a finished future is never polled again
        if this.cancel.is_cancelled() || this.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Err(io::Error::other("stream cancelled")));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Accounts for one line after its delivery attempt.
fn complete_line(
    line: &[u8],
    result: Result<Delivery, DeliveryError>,
    progress: &mut Progress,
    outcome: &mut StreamOutcome,
) {
    match result {
        Ok(delivery) => {
            debug!(status = delivery.status, drained = delivery.drained, "Record delivered");
        }
        Err(e @ DeliveryError::Drain { .. }) => {
            warn!(error = %e, "Error reading and dumping response body");
        }
        Err(e @ DeliveryError::Transport(_)) => {
            warn!(error = %e, "Error posting record to sink");
            progress.record_delivery_failure();
            outcome.delivery_failures += 1;
            return;
        }
    }
    outcome.delivered += 1;

    let timestamp = match Record::from_line(line) {
        Ok(record) => {
            debug!(
                uploader = ?record.header.uploader_id,
                software = ?record.header.software_name,
                version = ?record.header.software_version,
                "Record header"
            );
            record.header.gateway_timestamp
        }
        Err(e) => {
            warn!(error = %e, "Error parsing record header");
            progress.record_parse_failure();
            outcome.parse_failures += 1;
            String::new()
        }
    };

    let snapshot = progress.record();
    info!(
        average = ?snapshot.average,
        total = ?snapshot.elapsed,
        iterations = snapshot.count,
        "Processed {timestamp}"
    );
}

/// Runs on the blocking pool: decode, split, and queue lines until the
/// stream ends or the receiver goes away.
fn decode_into<R: io::Read>(
    reader: R,
    max_line_bytes: usize,
    tx: &mpsc::Sender<LineItem>,
) {
    for item in bz2_lines(reader, max_line_bytes) {
        if tx.blocking_send(item).is_err() {
            debug!("Line receiver dropped, stopping decoder");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bzip2::{Compression, write::BzEncoder};
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        bodies: Mutex<Vec<Bytes>>,
        fail_on: Vec<usize>,
        drain_fail_on: Vec<usize>,
    }

    impl RecordingSink {
        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                ..Default::default()
            }
        }

        fn draining_badly_on(drain_fail_on: Vec<usize>) -> Self {
            Self {
                drain_fail_on,
                ..Default::default()
            }
        }

        fn bodies(&self) -> Vec<String> {
            self.bodies
                .lock()
                .unwrap()
                .iter()
                .map(|b| String::from_utf8(b.to_vec()).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        async fn deliver(&self, body: Bytes) -> Result<Delivery, DeliveryError> {
            let attempt = {
                let mut bodies = self.bodies.lock().unwrap();
                bodies.push(body);
                bodies.len() - 1
            };
            if self.fail_on.contains(&attempt) {
                return Err(DeliveryError::Transport("connection refused".into()));
            }
            if self.drain_fail_on.contains(&attempt) {
                return Err(DeliveryError::Drain {
                    status: 200,
                    source: "connection reset".into(),
                });
            }
            Ok(Delivery {
                status: 200,
                drained: 0,
            })
        }
    }

    async fn run(data: &[u8], sink: &RecordingSink, progress: &mut Progress) -> StreamOutcome {
        forward_stream(
            Cursor::new(compress(data)),
            sink,
            progress,
            &PipelineOptions::default(),
            &CancellationToken::new(),
        )
        .await
    }

    #[tokio::test]
    #[traced_test]
    async fn test_lines_forwarded_in_order() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();
        let data = b"{\"header\":{\"gatewayTimestamp\":\"T1\"}}\n{\"header\":{\"gatewayTimestamp\":\"T2\"}}\n";

        let outcome = run(data, &sink, &mut progress).await;

        assert_eq!(
            sink.bodies(),
            vec![
                r#"{"header":{"gatewayTimestamp":"T1"}}"#,
                r#"{"header":{"gatewayTimestamp":"T2"}}"#,
            ]
        );
        assert_eq!(outcome.lines, 2);
        assert_eq!(outcome.delivered, 2);
        assert!(outcome.is_clean());
        assert_eq!(progress.count(), 2);
        assert!(logs_contain("Processed T1"));
        assert!(logs_contain("Processed T2"));
        assert!(logs_contain("iterations=2"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unparseable_lines_are_still_delivered_and_counted() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();

        let outcome = run(b"not json\n{\"header\":{}}\n\n", &sink, &mut progress).await;

        assert_eq!(sink.bodies(), vec!["not json", r#"{"header":{}}"#, ""]);
        assert_eq!(outcome.delivered, 3);
        assert_eq!(outcome.parse_failures, 2);
        assert_eq!(progress.count(), 3);
        assert!(logs_contain("Error parsing record header"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transport_failure_does_not_stop_stream() {
        let sink = RecordingSink::failing_on(vec![1]);
        let mut progress = Progress::new();
        let data = b"{\"n\":0}\n{\"n\":1}\n{\"n\":2}";

        let outcome = run(data, &sink, &mut progress).await;

        assert_eq!(sink.bodies(), vec![r#"{"n":0}"#, r#"{"n":1}"#, r#"{"n":2}"#]);
        assert_eq!(outcome.lines, 3);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(outcome.delivery_failures, 1);
        assert_eq!(progress.count(), 2);
        assert_eq!(progress.delivery_failures(), 1);
        assert!(logs_contain("Error posting record to sink"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_drain_failure_still_counts_line() {
        let sink = RecordingSink::draining_badly_on(vec![0]);
        let mut progress = Progress::new();
        let data = b"{\"header\":{\"gatewayTimestamp\":\"T1\"}}\n{}\n";

        let outcome = run(data, &sink, &mut progress).await;

        assert_eq!(outcome.lines, 2);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(outcome.delivery_failures, 0);
        assert_eq!(progress.count(), 2);
        assert!(logs_contain("Error reading and dumping response body"));
        assert!(logs_contain("Processed T1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_loose_header_fields_keep_timestamp() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();
        let data = b"{\"header\":{\"gatewayTimestamp\":\"T1\",\"softwareVersion\":5}}\n";

        let outcome = run(data, &sink, &mut progress).await;

        assert_eq!(outcome.parse_failures, 0);
        assert!(logs_contain("Processed T1"));
        assert!(!logs_contain("Error parsing record header"));
    }

    #[tokio::test]
    async fn test_every_line_attempted_when_sink_is_down() {
        let sink = RecordingSink::failing_on((0..50).collect());
        let mut progress = Progress::new();
        let data: Vec<u8> = (0..50)
            .flat_map(|i| format!("{{\"n\":{i}}}\n").into_bytes())
            .collect();

        let outcome = run(&data, &sink, &mut progress).await;

        assert_eq!(sink.bodies().len(), 50);
        assert_eq!(outcome.delivery_failures, 50);
        assert_eq!(outcome.delivered, 0);
        assert_eq!(progress.count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_line_skipped() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();
        let data = format!("{{}}\n{}\n{{}}\n", "x".repeat(64));

        let outcome = forward_stream(
            Cursor::new(compress(data.as_bytes())),
            &sink,
            &mut progress,
            &PipelineOptions { max_line_bytes: 16 },
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(sink.bodies(), vec!["{}", "{}"]);
        assert_eq!(outcome.skipped_lines, 1);
        assert_eq!(progress.skipped_lines(), 1);
        assert_eq!(progress.count(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_corrupt_stream_is_logged() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();

        let outcome = forward_stream(
            Cursor::new(b"definitely not bzip2".to_vec()),
            &sink,
            &mut progress,
            &PipelineOptions::default(),
            &CancellationToken::new(),
        )
        .await;

        assert!(sink.bodies().is_empty());
        assert!(outcome.decode_error.is_some());
        assert!(!outcome.cancelled);
        assert!(logs_contain("Error reading from bzip2 reader"));
    }

    #[tokio::test]
    async fn test_progress_carries_across_streams() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();

        run(b"{}\n{}\n", &sink, &mut progress).await;
        run(b"{}\n", &sink, &mut progress).await;
        assert_eq!(progress.count(), 3);

        progress.reset();
        run(b"{}\n", &sink, &mut progress).await;
        assert_eq!(progress.count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = forward_stream(
            Cursor::new(compress(b"{}\n{}\n")),
            &sink,
            &mut progress,
            &PipelineOptions::default(),
            &cancel,
        )
        .await;

        assert!(outcome.cancelled);
        assert!(sink.bodies().is_empty());
        assert_eq!(progress.count(), 0);
    }

    struct StalledReader {
        dropped: Arc<AtomicBool>,
    }

    impl AsyncRead for StalledReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    impl Drop for StalledReader {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_cancel_releases_stalled_stream() {
        let sink = RecordingSink::default();
        let mut progress = Progress::new();
        let dropped = Arc::new(AtomicBool::new(false));
        let reader = StalledReader {
            dropped: Arc::clone(&dropped),
        };

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            forward_stream(
                reader,
                &sink,
                &mut progress,
                &PipelineOptions::default(),
                &cancel,
            ),
        )
        .await
        .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.lines, 0);
        assert!(outcome.decode_error.is_none());
        assert!(dropped.load(Ordering::SeqCst));
    }
}
