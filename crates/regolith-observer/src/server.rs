//! The serve loop.
//!
//! One connection is served at a time and its requests are answered in
//! order. The loop ends only when a client sends `STOP`. Transport
//! failures are recovered here:
//!
//! - an I/O error on a connection drops that connection, pauses, and
//!   goes back to accepting;
//! - an error accepting a connection drops the listener, pauses, and
//!   binds a fresh one, retrying until it succeeds.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use regolith_events::Timeline;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::protocol::{Reply, Request, read_message, write_message};

/// A source of client connections for [`serve`].
pub trait Accept: Send {
    /// Wait for the next client.
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        Self::accept(self)
    }
}

/// Answers requests against a recorded timeline.
#[derive(Debug)]
pub struct TimelineService {
    timeline: Timeline,
}

impl TimelineService {
    /// Take ownership of a finished timeline.
    pub const fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }

    /// The timeline being served.
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Answer one request.
    pub fn respond(&self, request: Request) -> Reply {
        match request {
            Request::Stop => Reply::Ok(None),
            Request::Get(index) => match self.timeline.reconstruct(index) {
                Ok(raster) => Reply::Ok(Some(raster)),
                Err(e) => {
                    warn!(index, error = %e, "Rejected GET");
                    Reply::Error
                }
            },
        }
    }

    /// Answer the raw parts of one message. Returns the reply and whether
    /// the service should stop.
    pub fn handle(&self, parts: &[Vec<u8>]) -> (Reply, bool) {
        match Request::parse(parts) {
            Ok(request) => {
                debug!(?request, "Handling request");
                (self.respond(request), request == Request::Stop)
            }
            Err(e) => {
                warn!(error = %e, "Malformed request");
                (Reply::Error, false)
            }
        }
    }
}

/// How a connection ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    /// The client hung up.
    Disconnected,
    /// The client asked the service to stop.
    Stop,
}

/// Serve the timeline until a client sends `STOP`.
///
/// `bind` produces a fresh listener after an accept error; the failed
/// one is dropped first so the address is free again.
pub async fn serve<L, B, F>(
    mut listener: L,
    mut bind: B,
    service: TimelineService,
    retry_delay: Duration,
) where
    L: Accept,
    B: FnMut() -> F + Send,
    F: Future<Output = io::Result<L>> + Send,
{
    info!(
        snapshots = service.timeline().len(),
        "Visualization service listening"
    );

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "Client connected");
                match serve_connection(stream, &service).await {
                    Ok(ConnectionEnd::Stop) => {
                        info!("Visualization service stopped");
                        return;
                    }
                    Ok(ConnectionEnd::Disconnected) => debug!(%peer, "Client disconnected"),
                    Err(e) => {
                        warn!(%peer, error = %e, "Transport error, dropping connection");
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Accept failed, reopening listener");
                drop(listener);
                listener = rebind(&mut bind, retry_delay).await;
            }
        }
    }
}

/// Answer requests on one connection until it closes or asks to stop.
///
/// A `STOP` ends the service even if its `OK` cannot be delivered.
async fn serve_connection<S>(
    mut stream: S,
    service: &TimelineService,
) -> Result<ConnectionEnd, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(parts) = read_message(&mut stream).await? {
        let (reply, stop) = service.handle(&parts);
        let written = write_message(&mut stream, &reply.into_parts()).await;
        if stop {
            if let Err(e) = written {
                warn!(error = %e, "Could not acknowledge STOP");
            }
            return Ok(ConnectionEnd::Stop);
        }
        written?;
    }
    Ok(ConnectionEnd::Disconnected)
}

async fn rebind<L, B, F>(bind: &mut B, retry_delay: Duration) -> L
where
    B: FnMut() -> F,
    F: Future<Output = io::Result<L>>,
{
    loop {
        tokio::time::sleep(retry_delay).await;
        match bind().await {
            Ok(listener) => {
                info!("Listener reopened");
                return listener;
            }
            Err(e) => warn!(error = %e, "Rebind failed, retrying"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use regolith_core::runner::{RunOptions, Variant, solve};

    use super::*;

    fn service() -> TimelineService {
        let options = RunOptions {
            verify_invariants: false,
            checkpoint_interval: Some(10),
        };
        let solution = solve(
            "498,4 -> 498,6 -> 496,6\n503,4 -> 502,4 -> 502,9 -> 494,9\n",
            Variant::Void,
            &options,
        )
        .unwrap();
        TimelineService::new(solution.timeline.unwrap())
    }

    fn parts(words: &[&str]) -> Vec<Vec<u8>> {
        words.iter().map(|w| w.as_bytes().to_vec()).collect()
    }

    #[test]
    fn get_zero_returns_the_empty_cave() {
        let service = service();
        let (reply, stop) = service.handle(&parts(&["GET", "0"]));
        assert!(!stop);
        match reply {
            Reply::Ok(Some(raster)) => {
                assert!(raster.starts_with("......+...\n"));
                assert!(!raster.contains('o'));
            }
            other => panic!("expected a raster, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_and_malformed_requests_are_errors() {
        let service = service();
        let len = service.timeline().len().to_string();
        for request in [
            parts(&["GET", len.as_str()]),
            parts(&["GET", "-1"]),
            parts(&["GET", "abc"]),
            parts(&["HELLO"]),
            Vec::new(),
        ] {
            assert_eq!(service.handle(&request), (Reply::Error, false));
        }
    }

    #[test]
    fn stop_replies_ok_and_stops() {
        assert_eq!(service().handle(&parts(&["STOP"])), (Reply::Ok(None), true));
    }

    /// Fails a set number of accepts before handing out real connections.
    struct FlakyListener {
        inner: TcpListener,
        failures: usize,
    }

    impl Accept for FlakyListener {
        async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
            if self.failures > 0 {
                self.failures = self.failures.saturating_sub(1);
                return Err(io::Error::other("accept failed"));
            }
            self.inner.accept().await
        }
    }

    #[tokio::test]
    async fn accept_error_reopens_the_listener() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use crate::client::VisualizationClient;

        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = first.local_addr().unwrap();
        let binds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&binds);
        let bind = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                TcpListener::bind(address)
                    .await
                    .map(|inner| FlakyListener { inner, failures: 0 })
            }
        };
        let flaky = FlakyListener {
            inner: first,
            failures: 1,
        };
        let task = tokio::spawn(serve(flaky, bind, service(), Duration::from_millis(10)));

        while binds.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let mut client = loop {
            match VisualizationClient::connect(address).await {
                Ok(client) => break client,
                Err(_) => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        };

        let raster = client.get(0).await.unwrap();
        assert!(raster.starts_with("......+...\n"));
        client.stop().await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(binds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_ends_the_service_even_if_the_reply_is_lost() {
        let service = service();
        let (mut client, server) = tokio::io::duplex(1024);
        write_message(&mut client, &Request::Stop.to_parts())
            .await
            .unwrap();
        drop(client);

        let end = serve_connection(server, &service).await.unwrap();
        assert_eq!(end, ConnectionEnd::Stop);
    }

    #[tokio::test]
    async fn lost_get_reply_is_a_transport_error() {
        let service = service();
        let (mut client, server) = tokio::io::duplex(1024);
        write_message(&mut client, &Request::Get(0).to_parts())
            .await
            .unwrap();
        drop(client);

        assert!(matches!(
            serve_connection(server, &service).await,
            Err(TransportError::Io { .. })
        ));
    }
}
