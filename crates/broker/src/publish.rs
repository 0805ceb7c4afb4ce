//! Publish side of the fabric
//!
//! `Publisher` owns a writer task connected to the broker's pull side. The
//! caller-facing `send` is non-blocking; the writer connects lazily and
//! reconnects on the next frame after a failure. A frame that cannot be
//! written is dropped and logged - durability lives in storage, and clients
//! recover missed live deliveries with a since-query.

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use courier_protocol::PushFrame;

use crate::error::{BrokerError, Result};
use crate::wire;

/// Outbound queue depth before frames are shed
const PUBLISH_QUEUE_SIZE: usize = 256;

/// Handle for sending frames to the broker
#[derive(Debug, Clone)]
pub struct Publisher {
    sender: mpsc::Sender<PushFrame>,
}

impl Publisher {
    /// Create a publisher targeting the broker's pull address
    ///
    /// The connection is established lazily on the first send. Must be
    /// called within a Tokio runtime.
    pub fn connect(addr: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::channel(PUBLISH_QUEUE_SIZE);
        tokio::spawn(publish_loop(addr.into(), receiver));
        Self { sender }
    }

    /// Queue one frame for sending
    ///
    /// Never blocks; fails only when the outbound queue is full or the
    /// writer task is gone.
    pub fn send(&self, frame: PushFrame) -> Result<()> {
        self.sender
            .try_send(frame)
            .map_err(|_| BrokerError::PublishQueueUnavailable)
    }
}

async fn publish_loop(addr: String, mut receiver: mpsc::Receiver<PushFrame>) {
    let mut stream: Option<TcpStream> = None;

    while let Some(frame) = receiver.recv().await {
        if stream.is_none() {
            match TcpStream::connect(&addr).await {
                Ok(s) => {
                    debug!(addr = %addr, "publisher connected to broker");
                    stream = Some(s);
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "broker unreachable, dropping frame");
                    continue;
                }
            }
        }

        if let Some(s) = stream.as_mut() {
            if let Err(e) = wire::write_frame(s, &frame).await {
                warn!(addr = %addr, error = %e, "broker write failed, dropping frame");
                stream = None;
            }
        }
    }

    debug!(addr = %addr, "publisher closed");
}
