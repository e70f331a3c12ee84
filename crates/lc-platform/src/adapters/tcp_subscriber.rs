use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use lc_core::ports::BroadcastSubscriberPort;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tracing::{debug, warn, Instrument};

const FRAME_QUEUE: usize = 64;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens TCP subscriptions to remote publishers.
pub struct TcpSubscriberConnector {
    max_frame_bytes: usize,
    connect_timeout: Duration,
}

impl TcpSubscriberConnector {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl BroadcastSubscriberPort for TcpSubscriberConnector {
    async fn connect(&self, address: SocketAddr) -> Result<mpsc::Receiver<Vec<u8>>> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(address))
            .await
            .with_context(|| format!("timed out connecting to {}", address))?
            .with_context(|| format!("failed to connect to {}", address))?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "Failed to set TCP_NODELAY");
        }

        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(self.max_frame_bytes)
            .new_codec();
        let mut frames = FramedRead::new(stream, codec);
        let (tx, rx) = mpsc::channel(FRAME_QUEUE);

        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        frame = frames.next() => match frame {
                            Some(Ok(frame)) => {
                                if tx.send(frame.to_vec()).await.is_err() {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                warn!(error = %err, "Broadcast stream failed");
                                break;
                            }
                            None => break,
                        },
                    }
                }
                debug!("Broadcast stream closed");
            }
            .instrument(tracing::debug_span!("subscriber_connection", peer = %address)),
        );

        Ok(rx)
    }
}
