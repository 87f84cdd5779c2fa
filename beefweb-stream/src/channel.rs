//! Long-lived event stream connection with automatic reconnection
//!
//! [`SubscriptionChannel`] owns one background read loop. The loop opens the
//! stream, frames the body into server-sent events and forwards each event's
//! data to its owner as a [`ChannelEvent::Message`]. When the connection
//! fails it reports [`ChannelEvent::ConnectionLost`], waits for the reconnect
//! interval and tries again, until `disconnect` cancels it.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;

use beefweb_api::build_http_client;

use crate::codec::EventStreamCodec;
use crate::config::SubscriptionEndpoint;
use crate::error::{Result, StreamError};

/// Consecutive failed attempts after which the read loop gives up
pub const MAX_CONNECT_ATTEMPTS: u64 = 1_000_000_000;

/// Reconnect interval used when the caller has no preference
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest pause between reconnect attempts, whatever was requested
pub const MIN_RECONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// Clamp a requested reconnect interval to [`MIN_RECONNECT_INTERVAL`]
pub fn paced_interval(requested: Duration) -> Duration {
    requested.max(MIN_RECONNECT_INTERVAL)
}

const BUFFER_CAPACITY: usize = 16 * 1024;

/// Lifecycle of the stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    /// Opening the stream, or waiting to retry after a failure
    Connecting,
    Open,
    /// `disconnect` is tearing down the read loop
    Closing,
}

/// What the read loop reports to the channel's owner
#[derive(Debug)]
pub enum ChannelEvent {
    /// The server accepted the stream request
    Opened,
    /// Data of one server-sent event
    Message(String),
    /// The connection failed or ended; a retry follows after the interval
    ConnectionLost(StreamError),
}

struct ReadLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// One streaming connection to a fixed subscription endpoint
pub struct SubscriptionChannel {
    endpoint: SubscriptionEndpoint,
    http: reqwest::Client,
    state_tx: Arc<watch::Sender<ChannelState>>,
    reader: Option<ReadLoop>,
}

impl SubscriptionChannel {
    pub fn new(endpoint: SubscriptionEndpoint) -> Result<Self> {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Ok(Self {
            endpoint,
            http: build_http_client(None)?,
            state_tx: Arc::new(state_tx),
            reader: None,
        })
    }

    pub fn endpoint(&self) -> &SubscriptionEndpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Receiver that observes every state transition
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    /// True only while the stream is open
    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Start the read loop, forwarding events to `events`
    ///
    /// Returns `false` without doing anything when the channel is already
    /// open or connecting. Intervals below [`MIN_RECONNECT_INTERVAL`] are
    /// raised to it. Must be called from within a tokio runtime.
    pub fn connect(&mut self, reconnect_interval: Duration, events: mpsc::UnboundedSender<ChannelEvent>) -> bool {
        if matches!(self.state(), ChannelState::Open | ChannelState::Connecting) {
            tracing::debug!("connect ignored, channel is {:?}", self.state());
            return false;
        }

        // A loop that gave up after the retry ceiling may still be parked here
        if let Some(stale) = self.reader.take() {
            stale.cancel.cancel();
        }

        tracing::info!("Connecting to {}", self.endpoint.url());
        self.state_tx.send_replace(ChannelState::Connecting);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_read_loop(
            self.http.clone(),
            self.endpoint.clone(),
            Arc::clone(&self.state_tx),
            events,
            paced_interval(reconnect_interval),
            cancel.clone(),
        ));
        self.reader = Some(ReadLoop { cancel, handle });
        true
    }

    /// Cancel the read loop and wait for it to finish
    pub async fn disconnect(&mut self) {
        let Some(reader) = self.reader.take() else {
            self.state_tx.send_replace(ChannelState::Disconnected);
            return;
        };

        self.state_tx.send_replace(ChannelState::Closing);
        reader.cancel.cancel();

        match reader.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::warn!("Read loop ended abnormally: {}", e),
        }

        self.state_tx.send_replace(ChannelState::Disconnected);
        tracing::info!("Disconnected from {}", self.endpoint.url());
    }
}

impl Drop for SubscriptionChannel {
    fn drop(&mut self) {
        if let Some(reader) = &self.reader {
            reader.cancel.cancel();
        }
    }
}

struct ReadOutcome {
    opened: bool,
    error: StreamError,
}

async fn run_read_loop(
    http: reqwest::Client,
    endpoint: SubscriptionEndpoint,
    state_tx: Arc<watch::Sender<ChannelState>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut interval: Duration,
    cancel: CancellationToken,
) {
    let mut failures: u64 = 0;

    loop {
        state_tx.send_replace(ChannelState::Connecting);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = read_stream(&http, &endpoint, &state_tx, &events, &mut interval) => outcome,
        };

        if matches!(outcome.error, StreamError::ReceiverDropped) {
            tracing::debug!("Channel owner went away, stopping read loop");
            break;
        }

        failures = if outcome.opened { 1 } else { failures + 1 };
        tracing::warn!(
            "Event stream lost ({}), retrying in {:?} (attempt {})",
            outcome.error,
            interval,
            failures
        );

        state_tx.send_replace(ChannelState::Connecting);
        if events.send(ChannelEvent::ConnectionLost(outcome.error)).is_err() {
            break;
        }

        if failures >= MAX_CONNECT_ATTEMPTS {
            tracing::warn!("Giving up after {} failed attempts", failures);
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    if !cancel.is_cancelled() {
        state_tx.send_replace(ChannelState::Disconnected);
    }
}

/// Read one connection until it fails
///
/// `interval` is updated in place when the server sends a `retry:` hint.
async fn read_stream(
    http: &reqwest::Client,
    endpoint: &SubscriptionEndpoint,
    state_tx: &watch::Sender<ChannelState>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    interval: &mut Duration,
) -> ReadOutcome {
    let failed = |opened: bool, error: StreamError| ReadOutcome { opened, error };

    let response = match endpoint.request(http).send().await {
        Ok(response) => response,
        Err(e) => return failed(false, e.into()),
    };

    let status = response.status();
    if !status.is_success() {
        return failed(
            false,
            StreamError::TransportFailure(format!("server answered {status}")),
        );
    }

    state_tx.send_replace(ChannelState::Open);
    tracing::info!("Event stream open");
    if events.send(ChannelEvent::Opened).is_err() {
        return failed(true, StreamError::ReceiverDropped);
    }

    let mut stream = response.bytes_stream();
    let mut codec = EventStreamCodec::new();
    let mut buffer = BytesMut::with_capacity(BUFFER_CAPACITY);

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return failed(true, e.into()),
        };
        buffer.extend_from_slice(&chunk);

        loop {
            match codec.decode(&mut buffer) {
                Ok(Some(event)) => {
                    if let Some(retry) = event.retry {
                        *interval = paced_interval(retry);
                        tracing::debug!("Server set reconnect interval to {:?}", *interval);
                    }
                    if event.data.is_empty() {
                        continue;
                    }
                    tracing::trace!("Received event of {} bytes", event.data.len());
                    if events.send(ChannelEvent::Message(event.data)).is_err() {
                        return failed(true, StreamError::ReceiverDropped);
                    }
                }
                Ok(None) => break,
                Err(e) => return failed(true, e),
            }
        }
    }

    failed(
        true,
        StreamError::TransportFailure("event stream closed by server".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use beefweb_api::ServerAddress;

    use crate::config::SubscriptionConfig;

    fn unreachable_channel() -> SubscriptionChannel {
        let address = ServerAddress::new("127.0.0.1", 1).unwrap();
        let endpoint = SubscriptionEndpoint::new(&address, &SubscriptionConfig::default(), None).unwrap();
        SubscriptionChannel::new(endpoint).unwrap()
    }

    #[test]
    fn test_new_channel_is_disconnected() {
        let channel = unreachable_channel();
        assert_eq!(channel.state(), ChannelState::Disconnected);
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_noop_while_connecting() {
        let mut channel = unreachable_channel();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(channel.connect(Duration::from_secs(60), tx.clone()));
        assert!(!channel.connect(Duration::from_secs(60), tx));
        assert!(!channel.is_connected());

        channel.disconnect().await;
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_refused_connection_reports_loss() {
        let mut channel = unreachable_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.connect(Duration::from_secs(60), tx);

        match rx.recv().await {
            Some(ChannelEvent::ConnectionLost(StreamError::TransportFailure(_))) => {}
            other => panic!("expected ConnectionLost, got {other:?}"),
        }
        assert_eq!(channel.state(), ChannelState::Connecting);

        channel.disconnect().await;
        assert!(!channel.is_connected());
    }

    #[test]
    fn test_paced_interval_has_floor() {
        assert_eq!(paced_interval(Duration::ZERO), MIN_RECONNECT_INTERVAL);
        assert_eq!(paced_interval(Duration::from_millis(1)), MIN_RECONNECT_INTERVAL);
        assert_eq!(paced_interval(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_zero_interval_still_paces_retries() {
        let mut channel = unreachable_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.connect(Duration::ZERO, tx);

        assert!(matches!(rx.recv().await, Some(ChannelEvent::ConnectionLost(_))));
        let early = tokio::time::timeout(MIN_RECONNECT_INTERVAL / 2, rx.recv()).await;
        assert!(early.is_err(), "retried without pausing");

        channel.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_without_connect() {
        let mut channel = unreachable_channel();
        channel.disconnect().await;
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }
}
