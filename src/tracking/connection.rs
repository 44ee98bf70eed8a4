use async_trait::async_trait;

use crate::error::Error;

/// A live bidirectional text-message connection. The manager owns
/// exactly one at a time and closes it explicitly on every exit path.
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, text: String) -> Result<(), Error>;

    /// Next inbound text frame. None means the peer closed the stream.
    async fn recv(&mut self) -> Option<Result<String, Error>>;

    async fn close(&mut self) -> Result<(), Error>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    async fn connect(&self, url: &str) -> Result<Self::Conn, Error>;
}
