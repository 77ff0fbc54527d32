//! Wire protocol: multi-part message framing, requests, and replies.
//!
//! A message is a big-endian `u32` part count followed by each part as a
//! big-endian `u32` byte length and the bytes themselves.
//!
//! | Request | Success reply | Failure reply |
//! |---|---|---|
//! | `STOP` | `OK` | -- |
//! | `GET`, `<n>` | `OK`, `<raster>` | `ERROR` |
//! | anything else | -- | `ERROR` |
//!
//! `GET <n>` sent as a single part is accepted as well. Only the command
//! word of `STOP` is looked at; anything after it is ignored.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, TransportError};

/// Most parts a single message may carry.
pub const MAX_PARTS: u32 = 64;

/// Largest single part in bytes.
pub const MAX_PART_LEN: u32 = 16 * 1024 * 1024;

const STOP: &str = "STOP";
const GET: &str = "GET";
const OK: &str = "OK";
const ERROR: &str = "ERROR";

/// A client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Shut the service down.
    Stop,
    /// Fetch the picture at a timeline index.
    Get(usize),
}

impl Request {
    /// Interpret the parts of a received message.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for an empty message, an unknown
    /// command, or a missing or malformed step index.
    pub fn parse(parts: &[Vec<u8>]) -> Result<Self, ProtocolError> {
        let (first, rest) = parts.split_first().ok_or(ProtocolError::Empty)?;
        let first = String::from_utf8_lossy(first);
        let mut words = first.split_whitespace();
        let command = words.next().ok_or(ProtocolError::Empty)?;

        match command {
            STOP => Ok(Self::Stop),
            GET => {
                let index = match (words.next(), rest.first()) {
                    (Some(inline), None) if words.next().is_none() => inline.to_owned(),
                    (None, Some(part)) if rest.len() == 1 => {
                        String::from_utf8_lossy(part).trim().to_owned()
                    }
                    (None, None) => return Err(ProtocolError::MissingIndex),
                    _ => return Err(ProtocolError::InvalidIndex(first.to_string())),
                };
                index
                    .parse::<usize>()
                    .ok()
                    .map(Self::Get)
                    .ok_or(ProtocolError::InvalidIndex(index))
            }
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        }
    }

    /// The parts this request is sent as.
    pub fn to_parts(self) -> Vec<Vec<u8>> {
        match self {
            Self::Stop => vec![STOP.as_bytes().to_vec()],
            Self::Get(index) => vec![GET.as_bytes().to_vec(), index.to_string().into_bytes()],
        }
    }
}

/// The service's answer to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success, optionally carrying a raster.
    Ok(Option<String>),
    /// The request was rejected.
    Error,
}

impl Reply {
    /// The parts this reply is sent as.
    pub fn into_parts(self) -> Vec<Vec<u8>> {
        match self {
            Self::Ok(None) => vec![OK.as_bytes().to_vec()],
            Self::Ok(Some(raster)) => vec![OK.as_bytes().to_vec(), raster.into_bytes()],
            Self::Error => vec![ERROR.as_bytes().to_vec()],
        }
    }

    /// Interpret the parts of a received reply.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Empty`] for an empty message and
    /// [`ProtocolError::UnexpectedReply`] for anything other than `OK` or
    /// `ERROR`.
    pub fn parse(parts: &[Vec<u8>]) -> Result<Self, ProtocolError> {
        let (first, rest) = parts.split_first().ok_or(ProtocolError::Empty)?;
        match first.as_slice() {
            b"OK" => Ok(Self::Ok(
                rest.first()
                    .map(|raster| String::from_utf8_lossy(raster).into_owned()),
            )),
            b"ERROR" => Ok(Self::Error),
            other => Err(ProtocolError::UnexpectedReply(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

/// Read one message.
///
/// Returns `Ok(None)` if the peer closed the connection cleanly between
/// messages.
///
/// # Errors
///
/// Returns a [`TransportError`] on I/O failure, on a message exceeding
/// [`MAX_PARTS`] or [`MAX_PART_LEN`], or if the connection closes
/// mid-message.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<Vec<u8>>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let count = match reader.read_u32().await {
        Ok(count) => count,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if count > MAX_PARTS {
        return Err(TransportError::TooManyParts {
            parts: count,
            max: MAX_PARTS,
        });
    }

    let mut parts = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    for _ in 0..count {
        let len = reader.read_u32().await.map_err(truncated)?;
        if len > MAX_PART_LEN {
            return Err(TransportError::PartTooLarge {
                len,
                max: MAX_PART_LEN,
            });
        }
        let mut part = vec![0u8; usize::try_from(len).unwrap_or(0)];
        reader.read_exact(&mut part).await.map_err(truncated)?;
        parts.push(part);
    }
    Ok(Some(parts))
}

/// Write one message and flush it.
///
/// # Errors
///
/// Returns a [`TransportError`] on I/O failure or if the message exceeds
/// the framing limits.
pub async fn write_message<W, P>(writer: &mut W, parts: &[P]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    P: AsRef<[u8]>,
{
    let count = u32::try_from(parts.len())
        .ok()
        .filter(|&count| count <= MAX_PARTS)
        .ok_or(TransportError::TooManyParts {
            parts: u32::try_from(parts.len()).unwrap_or(u32::MAX),
            max: MAX_PARTS,
        })?;

    let mut frame = Vec::new();
    frame.extend_from_slice(&count.to_be_bytes());
    for part in parts {
        let bytes = part.as_ref();
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|&len| len <= MAX_PART_LEN)
            .ok_or(TransportError::PartTooLarge {
                len: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
                max: MAX_PART_LEN,
            })?;
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(bytes);
    }

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

fn truncated(e: std::io::Error) -> TransportError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        TransportError::Truncated
    } else {
        TransportError::Io { source: e }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parts(words: &[&str]) -> Vec<Vec<u8>> {
        words.iter().map(|w| w.as_bytes().to_vec()).collect()
    }

    #[test]
    fn parses_requests() {
        assert_eq!(Request::parse(&parts(&["STOP"])), Ok(Request::Stop));
        assert_eq!(Request::parse(&parts(&["GET", "12"])), Ok(Request::Get(12)));
        assert_eq!(Request::parse(&parts(&["GET 7"])), Ok(Request::Get(7)));
        assert_eq!(Request::parse(&parts(&["GET", " 3\n"])), Ok(Request::Get(3)));
    }

    #[test]
    fn rejects_malformed_requests() {
        assert_eq!(Request::parse(&[]), Err(ProtocolError::Empty));
        assert_eq!(Request::parse(&parts(&[""])), Err(ProtocolError::Empty));
        assert_eq!(Request::parse(&parts(&["GET"])), Err(ProtocolError::MissingIndex));
        assert_eq!(
            Request::parse(&parts(&["GET", "-1"])),
            Err(ProtocolError::InvalidIndex(String::from("-1")))
        );
        assert_eq!(
            Request::parse(&parts(&["GET", "abc"])),
            Err(ProtocolError::InvalidIndex(String::from("abc")))
        );
        assert!(matches!(
            Request::parse(&parts(&["GET", "1", "2"])),
            Err(ProtocolError::InvalidIndex(_))
        ));
        assert_eq!(
            Request::parse(&parts(&["PUT", "1"])),
            Err(ProtocolError::UnknownCommand(String::from("PUT")))
        );
    }

    #[test]
    fn stop_ignores_trailing_arguments() {
        assert_eq!(Request::parse(&parts(&["STOP", "now"])), Ok(Request::Stop));
        assert_eq!(Request::parse(&parts(&["STOP please"])), Ok(Request::Stop));
    }

    #[test]
    fn replies_use_ok_and_error_words() {
        assert_eq!(Reply::Ok(None).into_parts(), parts(&["OK"]));
        assert_eq!(
            Reply::Ok(Some(String::from("+\n"))).into_parts(),
            parts(&["OK", "+\n"])
        );
        assert_eq!(Reply::parse(&parts(&["ERROR"])), Ok(Reply::Error));
        assert!(matches!(
            Reply::parse(&parts(&["MAYBE"])),
            Err(ProtocolError::UnexpectedReply(_))
        ));
    }

    #[tokio::test]
    async fn framing_survives_a_stream() {
        let (mut client, mut server) = tokio::io::duplex(256);
        write_message(&mut client, &Request::Get(42).to_parts()).await.unwrap();
        drop(client);

        let received = read_message(&mut server).await.unwrap().unwrap();
        assert_eq!(Request::parse(&received), Ok(Request::Get(42)));
        assert!(read_message(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_messages_are_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(MAX_PARTS.saturating_add(1)).await.unwrap();
        assert!(matches!(
            read_message(&mut server).await,
            Err(TransportError::TooManyParts { .. })
        ));

        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(1).await.unwrap();
        client.write_u32(MAX_PART_LEN.saturating_add(1)).await.unwrap();
        assert!(matches!(
            read_message(&mut server).await,
            Err(TransportError::PartTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn truncated_message_is_reported() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(2).await.unwrap();
        client.write_u32(3).await.unwrap();
        client.write_all(b"GE").await.unwrap();
        drop(client);
        assert!(matches!(
            read_message(&mut server).await,
            Err(TransportError::Truncated)
        ));
    }
}
