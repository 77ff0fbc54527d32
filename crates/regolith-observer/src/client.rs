//! A minimal client for the visualization service.

use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::ClientError;
use crate::protocol::{Reply, Request, read_message, write_message};

/// One connection to the visualization service.
#[derive(Debug)]
pub struct VisualizationClient {
    stream: TcpStream,
}

impl VisualizationClient {
    /// Connect to a running service.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the connection fails.
    pub async fn connect(address: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self { stream })
    }

    /// Send raw message parts and read the reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, an unreadable reply,
    /// or a closed connection.
    pub async fn send_parts<P: AsRef<[u8]>>(&mut self, parts: &[P]) -> Result<Reply, ClientError> {
        write_message(&mut self.stream, parts).await?;
        let reply = read_message(&mut self.stream)
            .await?
            .ok_or(ClientError::Closed)?;
        Ok(Reply::parse(&reply)?)
    }

    /// Send a request and read the reply.
    ///
    /// # Errors
    ///
    /// See [`send_parts`](Self::send_parts).
    pub async fn request(&mut self, request: Request) -> Result<Reply, ClientError> {
        self.send_parts(&request.to_parts()).await
    }

    /// Fetch the picture at a timeline index.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the service answers `ERROR`.
    pub async fn get(&mut self, index: usize) -> Result<String, ClientError> {
        match self.request(Request::Get(index)).await? {
            Reply::Ok(raster) => Ok(raster.unwrap_or_default()),
            Reply::Error => Err(ClientError::Rejected),
        }
    }

    /// Ask the service to shut down.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the service answers `ERROR`.
    pub async fn stop(mut self) -> Result<(), ClientError> {
        match self.request(Request::Stop).await? {
            Reply::Ok(_) => Ok(()),
            Reply::Error => Err(ClientError::Rejected),
        }
    }
}
