//! The persistent channel to the matchmaking service.
//!
//! [`ConnectionManager`] lives inside the coordinator and owns the only
//! way to write to the socket. It never makes the coordinator wait on the
//! network:
//!
//! - connect attempts run on their own task and report back as
//!   [`LinkEvent::Connected`] / [`LinkEvent::ConnectFailed`]
//! - a reader task per connection forwards raw frames as
//!   [`LinkEvent::Inbound`] and ends with [`LinkEvent::Closed`]
//! - a writer task per connection drains a bounded outbound queue; sending
//!   only enqueues, and a full queue is a send failure
//!
//! Every event carries the generation of the attempt that produced it.
//! Events from an older generation (a reader still draining a socket we
//! already dropped) are ignored.

use std::sync::Arc;

use arenalink_protocol::{Codec, OutboundMessage, ParticipantId};
use arenalink_transport::{Connection, Connector, TransportError};
use tokio::sync::mpsc;

use crate::ArenalinkError;

/// What connection tasks report to the coordinator.
pub(crate) enum LinkEvent<C> {
    Connected { generation: u64, connection: C },
    ConnectFailed { generation: u64, error: TransportError },
    Inbound { generation: u64, data: Vec<u8> },
    Closed { generation: u64, reason: String },
}

pub(crate) type LinkSender<C> = mpsc::UnboundedSender<LinkEvent<C>>;

/// Owns the current connection and the tasks feeding it.
pub(crate) struct ConnectionManager<K: Connector> {
    connector: Arc<K>,
    url: String,
    /// Write side of the live connection; `None` while disconnected.
    outbound: Option<mpsc::Sender<Vec<u8>>>,
    outbound_capacity: usize,
    /// Bumped on every connect attempt and on close.
    generation: u64,
    connecting: bool,
    events: LinkSender<K::Connection>,
}

impl<K: Connector> ConnectionManager<K> {
    pub(crate) fn new(
        connector: K,
        url: String,
        outbound_capacity: usize,
        events: LinkSender<K::Connection>,
    ) -> Self {
        Self {
            connector: Arc::new(connector),
            url,
            outbound: None,
            outbound_capacity: outbound_capacity.max(1),
            generation: 0,
            connecting: false,
            events,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.outbound.is_some()
    }

    /// Starts a connect attempt unless one is running or we're connected.
    pub(crate) fn connect(&mut self) {
        if self.outbound.is_some() || self.connecting {
            return;
        }
        self.connecting = true;
        self.generation += 1;
        let generation = self.generation;

        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        let events = self.events.clone();
        tracing::info!(%url, generation, "connecting to matchmaking service");

        tokio::spawn(async move {
            let event = match connector.connect(&url).await {
                Ok(connection) => LinkEvent::Connected {
                    generation,
                    connection,
                },
                Err(error) => LinkEvent::ConnectFailed { generation, error },
            };
            let _ = events.send(event);
        });
    }

    /// Adopts a freshly opened connection and starts its reader and writer.
    /// Returns `false` if it belongs to a superseded attempt (it is closed
    /// and dropped).
    pub(crate) fn on_connected(&mut self, generation: u64, connection: K::Connection) -> bool {
        if generation != self.generation || self.outbound.is_some() {
            tracing::debug!(generation, "discarding stale connection");
            tokio::spawn(async move {
                let _ = connection.close().await;
            });
            return false;
        }
        self.connecting = false;

        let connection = Arc::new(connection);
        tracing::info!(conn_id = %connection.id(), generation, "connected to matchmaking service");
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        tokio::spawn(read_loop(
            Arc::clone(&connection),
            generation,
            self.events.clone(),
        ));
        tokio::spawn(write_loop(connection, rx, generation, self.events.clone()));
        self.outbound = Some(tx);
        true
    }

    pub(crate) fn on_connect_failed(&mut self, generation: u64, error: &TransportError) {
        if generation == self.generation {
            self.connecting = false;
        }
        tracing::warn!(generation, %error, "could not connect to matchmaking service");
    }

    /// Returns `true` if the live connection just went away.
    pub(crate) fn on_closed(&mut self, generation: u64, reason: &str) -> bool {
        if generation != self.generation || self.outbound.is_none() {
            return false;
        }
        // Dropping the sender lets the writer finish and close the socket.
        self.outbound = None;
        tracing::warn!(generation, %reason, "matchmaking connection closed");
        true
    }

    /// Whether an inbound frame came from the live connection.
    pub(crate) fn accepts(&self, generation: u64) -> bool {
        self.outbound.is_some() && generation == self.generation
    }

    /// Queues one frame for the writer task.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`] if there is no open channel, or
    /// [`TransportError::SendFailed`] if the outbound queue is full. A failed
    /// send does not trigger a reconnect; the reader and writer notice a
    /// dead socket on their own.
    pub(crate) fn send(&self, data: Vec<u8>) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotConnected)?;
        outbound.try_send(data).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "outbound queue is full",
            )),
            mpsc::error::TrySendError::Closed(_) => TransportError::NotConnected,
        })
    }

    /// Encodes and queues one message.
    pub(crate) fn send_message<C: Codec>(
        &self,
        codec: &C,
        msg: &OutboundMessage,
    ) -> Result<(), ArenalinkError> {
        let bytes = codec.encode(msg)?;
        self.send(bytes)?;
        tracing::debug!(kind = msg.kind(), "queued for matchmaking service");
        Ok(())
    }

    /// Tells the service `participant` left the queue, if we can. Failures
    /// are logged; local state has already moved on.
    pub(crate) fn cancel_queue<C: Codec>(&self, codec: &C, participant: ParticipantId) {
        if !self.is_connected() {
            return;
        }
        if let Err(e) = self.send_message(codec, &OutboundMessage::CancelQueue) {
            tracing::warn!(%participant, error = %e, "failed to send cancel_queue");
        }
    }

    /// Closes the channel on our side. Frames already queued are still
    /// written before the socket closes. The reader's final `Closed` event
    /// arrives with an old generation and is ignored.
    pub(crate) fn close(&mut self) {
        self.generation += 1;
        self.connecting = false;
        if self.outbound.take().is_some() {
            tracing::info!("matchmaking connection closing");
        }
    }
}

/// Writes queued frames in order, then closes the socket. Ends when the
/// manager drops its sender or when a write fails (reported as `Closed`).
async fn write_loop<C: Connection>(
    connection: Arc<C>,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    generation: u64,
    events: LinkSender<C>,
) {
    while let Some(data) = outbound.recv().await {
        if let Err(e) = connection.send(&data).await {
            let _ = events.send(LinkEvent::Closed {
                generation,
                reason: e.to_string(),
            });
            break;
        }
    }
    if let Err(e) = connection.close().await {
        tracing::debug!(error = %e, "error closing matchmaking connection");
    }
}

/// Forwards frames until the connection ends, then reports why.
async fn read_loop<C: Connection>(connection: Arc<C>, generation: u64, events: LinkSender<C>) {
    loop {
        match connection.recv().await {
            Ok(Some(data)) => {
                if events.send(LinkEvent::Inbound { generation, data }).is_err() {
                    return;
                }
            }
            Ok(None) => {
                let _ = events.send(LinkEvent::Closed {
                    generation,
                    reason: "closed by service".to_string(),
                });
                return;
            }
            Err(e) => {
                let _ = events.send(LinkEvent::Closed {
                    generation,
                    reason: e.to_string(),
                });
                return;
            }
        }
    }
}
