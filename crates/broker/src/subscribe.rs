//! Subscribe side of the fabric
//!
//! `Subscriber` connects to the broker's sub side, installs a topic filter,
//! and yields frames as they are pushed. Delivery is push-style: `recv`
//! awaits the socket, it never polls.

use tokio::net::TcpStream;
use tracing::debug;

use courier_protocol::PushFrame;

use crate::error::Result;
use crate::wire;

/// A topic-filtered subscription to the broker
pub struct Subscriber {
    stream: TcpStream,
}

impl Subscriber {
    /// Connect and install the topic filter
    pub async fn connect(addr: &str, topic: &str) -> Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        wire::write_topic(&mut stream, topic).await?;
        debug!(addr = %addr, topic = %topic, "subscribed to broker");
        Ok(Self { stream })
    }

    /// Receive the next matching frame; `Ok(None)` when the broker hangs up
    pub async fn recv(&mut self) -> Result<Option<PushFrame>> {
        wire::read_frame(&mut self.stream).await
    }
}
