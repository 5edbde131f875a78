//! Patch-server version probe.
//!
//! A single raw TCP exchange: send the two-byte version command, read the
//! fixed-layout announcement, and decode the CDN root URL it carries. Byte
//! 34 of the reply is the URL's length in UTF-16 code units; the string
//! itself starts at byte 35, encoded UTF-16LE.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::ProbeError;

/// Command that requests the current version announcement.
pub const VERSION_COMMAND: [u8; 2] = [0x01, 0x07];

const NAME_LENGTH_OFFSET: usize = 34;
const NAME_OFFSET: usize = 35;

/// Total reply bytes needed once the length byte is known, or `None` while
/// the reply is still too short to carry it.
fn reply_len(reply: &[u8]) -> Option<usize> {
    (reply.len() > NAME_LENGTH_OFFSET).then(|| NAME_OFFSET + reply[NAME_LENGTH_OFFSET] as usize * 2)
}

/// Decode the CDN root URL out of a complete version reply.
pub fn decode_reply(reply: &[u8]) -> Result<String, ProbeError> {
    let wanted = reply_len(reply).ok_or(ProbeError::ShortRead {
        wanted: NAME_OFFSET,
        got: reply.len(),
    })?;
    if reply.len() < wanted {
        return Err(ProbeError::ShortRead {
            wanted,
            got: reply.len(),
        });
    }

    let units = reply[NAME_OFFSET..wanted]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| ProbeError::InvalidUtf16)
}

/// Client for the patch server's version announcement.
#[derive(Debug, Clone)]
pub struct VersionProbe {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl VersionProbe {
    /// Create a probe with default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the patch server at `host:port` for its current CDN root URL.
    ///
    /// The connection lives for exactly one exchange and is closed on every
    /// exit path. A reply shorter than its announced length is a
    /// `ShortRead`, not a truncated decode.
    pub async fn probe(&self, host: &str, port: u16) -> Result<String, ProbeError> {
        trace!(host, port, "connecting to patch server");
        let mut stream =
            tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
                .await
                .map_err(|_| ProbeError::Timeout)??;

        stream.write_all(&VERSION_COMMAND).await?;

        let reply = tokio::time::timeout(self.read_timeout, read_reply(&mut stream))
            .await
            .map_err(|_| ProbeError::Timeout)??;
        drop(stream);

        let url = decode_reply(&reply)?;
        debug!(%url, "patch server announced version");
        Ok(url)
    }
}

/// Read until the announced reply length is satisfied or the server closes.
async fn read_reply(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut reply = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        reply.extend_from_slice(&buf[..n]);
        if let Some(wanted) = reply_len(&reply) {
            if reply.len() >= wanted {
                break;
            }
        }
    }
    Ok(reply)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Build a reply announcing `url`, truncating the announced length to
    /// `announced_units` UTF-16 code units when given.
    fn build_reply(url: &str, announced_units: Option<u8>) -> Vec<u8> {
        let units: Vec<u16> = url.encode_utf16().collect();
        let announced = announced_units.unwrap_or(units.len() as u8);
        let mut reply = vec![0u8; NAME_OFFSET];
        reply[NAME_LENGTH_OFFSET] = announced;
        for unit in units.iter().take(announced as usize) {
            reply.extend_from_slice(&unit.to_le_bytes());
        }
        reply
    }

    #[test]
    fn test_decode_announced_prefix() {
        // An 11-character URL announced as 10 units decodes to the prefix.
        let reply = build_reply("example.com", Some(10));
        assert_eq!(decode_reply(&reply).unwrap(), "example.co");
    }

    #[test]
    fn test_decode_full_url() {
        let reply = build_reply("http://patch.example.net/patch/", None);
        assert_eq!(decode_reply(&reply).unwrap(), "http://patch.example.net/patch/");
    }

    #[test]
    fn test_truncated_reply_is_short_read() {
        let mut reply = build_reply("example.com", None);
        reply.truncate(reply.len() - 4);
        assert!(matches!(
            decode_reply(&reply),
            Err(ProbeError::ShortRead { wanted: 57, got: 53 })
        ));
    }

    #[test]
    fn test_reply_without_length_byte_is_short_read() {
        assert!(matches!(
            decode_reply(&[0u8; 20]),
            Err(ProbeError::ShortRead { wanted: 35, got: 20 })
        ));
    }

    #[tokio::test]
    async fn test_probe_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut command = [0u8; 2];
            stream.read_exact(&mut command).await.unwrap();
            assert_eq!(command, VERSION_COMMAND);
            stream
                .write_all(&build_reply("http://cdn.example.net/", None))
                .await
                .unwrap();
        });

        let url = VersionProbe::new()
            .probe("127.0.0.1", addr.port())
            .await
            .unwrap();
        assert_eq!(url, "http://cdn.example.net/");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_short_reply_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut command = [0u8; 2];
            stream.read_exact(&mut command).await.unwrap();
            let mut reply = build_reply("http://cdn.example.net/", None);
            reply.truncate(40);
            stream.write_all(&reply).await.unwrap();
            // Closing the connection ends the read with a partial reply.
        });

        let result = VersionProbe::new().probe("127.0.0.1", addr.port()).await;
        assert!(matches!(result, Err(ProbeError::ShortRead { .. })));

        server.await.unwrap();
    }
}
