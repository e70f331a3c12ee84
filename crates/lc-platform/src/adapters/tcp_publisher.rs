//! TCP broadcast publisher.
//!
//! One listener, one writer task per accepted connection. Messages are fanned
//! out through a `tokio::sync::broadcast` channel; a connection only receives
//! messages published after it was accepted.

use std::net::SocketAddr;

use bytes::Bytes;
use futures::SinkExt;
use lc_core::ports::{BroadcastPublisherPort, PublisherError};
use lc_core::BroadcastMessage;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::{FramedWrite, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Frames buffered per connection before a slow reader starts losing them.
const FANOUT_CAPACITY: usize = 256;

pub struct TcpPublisher {
    local_addr: SocketAddr,
    frames: broadcast::Sender<Bytes>,
    max_frame_bytes: usize,
    shutdown: CancellationToken,
}

impl TcpPublisher {
    /// Bind the listener and start accepting subscribers.
    ///
    /// Fails when the address is already in use: only one publisher per node
    /// can exist.
    pub async fn bind(address: SocketAddr, max_frame_bytes: usize) -> Result<Self, PublisherError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| PublisherError::Bind { address, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| PublisherError::Bind { address, source })?;

        let (frames, _) = broadcast::channel(FANOUT_CAPACITY);
        let shutdown = CancellationToken::new();

        tokio::spawn(
            accept_loop(listener, frames.clone(), max_frame_bytes, shutdown.clone())
                .instrument(info_span!("publisher", address = %local_addr)),
        );
        info!(address = %local_addr, "Broadcast publisher listening");

        Ok(Self {
            local_addr,
            frames,
            max_frame_bytes,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and close every connection.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl BroadcastPublisherPort for TcpPublisher {
    fn publish(&self, message: &BroadcastMessage) -> usize {
        let payload = Bytes::from(message.encode());
        if payload.len() > self.max_frame_bytes {
            warn!(
                bytes = payload.len(),
                max_frame_bytes = self.max_frame_bytes,
                "Message exceeds frame limit, not published"
            );
            return 0;
        }
        // An error only means nobody is subscribed right now.
        self.frames.send(payload).unwrap_or(0)
    }

    fn subscriber_count(&self) -> usize {
        self.frames.receiver_count()
    }
}

impl Drop for TcpPublisher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    frames: broadcast::Sender<Bytes>,
    max_frame_bytes: usize,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                // Subscribe before spawning so the connection sees every
                // message published from now on.
                let rx = frames.subscribe();
                debug!(peer = %peer, "Subscriber connected");
                tokio::spawn(
                    write_frames(stream, rx, max_frame_bytes, shutdown.clone())
                        .instrument(info_span!("publisher_connection", peer = %peer)),
                );
            }
            Err(err) => warn!(error = %err, "Failed to accept subscriber"),
        }
    }
    debug!("Publisher accept loop stopped");
}

async fn write_frames(
    stream: TcpStream,
    mut rx: broadcast::Receiver<Bytes>,
    max_frame_bytes: usize,
    shutdown: CancellationToken,
) {
    if let Err(err) = stream.set_nodelay(true) {
        debug!(error = %err, "Failed to set TCP_NODELAY");
    }
    let (mut reader, writer) = stream.into_split();
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_bytes)
        .new_codec();
    let mut sink = FramedWrite::new(writer, codec);
    let mut scratch = [0u8; 64];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            // Subscribers never write; EOF or an error means they left.
            read = reader.read(&mut scratch) => match read {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            },
            frame = rx.recv() => match frame {
                Ok(frame) => {
                    if let Err(err) = sink.send(frame).await {
                        debug!(error = %err, "Subscriber write failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagging, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    debug!("Subscriber disconnected");
}
