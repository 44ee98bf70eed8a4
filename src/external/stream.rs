use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::Error;
use crate::tracking::{Connection, Connector};

/// WebSocket implementation of the tracking connection seam.
pub struct WsConnector;

pub struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConnection;

    #[tracing::instrument(skip(self))]
    async fn connect(&self, url: &str) -> Result<Self::Conn, Error> {
        let (inner, _) = connect_async(url).await?;

        Ok(WsConnection { inner })
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), Error> {
        self.inner.send(Message::Text(text)).await?;

        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, Error>> {
        while let Some(frame) = self.inner.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                // control and binary frames are not part of the protocol
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }

        None
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.inner.close(None).await?;

        Ok(())
    }
}
