//! TLS record framing.
//!
//! Reads exactly one TLS record (header + payload) off an async reader and
//! classifies it. This never inspects anything past the first payload byte
//! — just enough to tell a ClientHello from anything else.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FramingError;

const HEADER_LEN: usize = 5;
const MAX_PAYLOAD_LEN: usize = 16384;

const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 0x01;

/// A single TLS record: header fields plus non-overlapping views into one
/// owned buffer containing the full raw record.
#[derive(Debug, Clone)]
pub struct TlsRecord {
    content_type: u8,
    protocol_version: u16,
    payload_len: u16,
    raw: Vec<u8>,
}

impl TlsRecord {
    /// Read exactly one TLS record from `reader`.
    ///
    /// Fails with `FramingError` on short read, or a payload length over
    /// 16,384 bytes.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FramingError::short_read(HEADER_LEN, 0)
            } else {
                FramingError::from(e)
            }
        })?;

        let content_type = header[0];
        let protocol_version = u16::from_be_bytes([header[1], header[2]]);
        let payload_len = u16::from_be_bytes([header[3], header[4]]);

        if payload_len as usize > MAX_PAYLOAD_LEN {
            return Err(FramingError::oversize_payload(payload_len as usize));
        }

        let mut raw = Vec::with_capacity(HEADER_LEN + payload_len as usize);
        raw.extend_from_slice(&header);
        raw.resize(HEADER_LEN + payload_len as usize, 0);
        reader
            .read_exact(&mut raw[HEADER_LEN..])
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    FramingError::short_read(payload_len as usize, 0)
                } else {
                    FramingError::from(e)
                }
            })?;

        Ok(TlsRecord {
            content_type,
            protocol_version,
            payload_len,
            raw,
        })
    }

    pub fn content_type(&self) -> u8 {
        self.content_type
    }

    pub fn protocol_version(&self) -> u16 {
        self.protocol_version
    }

    pub fn payload_len(&self) -> u16 {
        self.payload_len
    }

    /// The full raw record, header included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn header(&self) -> &[u8] {
        &self.raw[..HEADER_LEN]
    }

    pub fn payload(&self) -> &[u8] {
        &self.raw[HEADER_LEN..]
    }

    /// True iff this record is a TLS handshake record whose first payload
    /// byte names the ClientHello handshake type.
    pub fn is_client_hello(&self) -> bool {
        self.content_type == CONTENT_TYPE_HANDSHAKE
            && self.payload().first() == Some(&HANDSHAKE_TYPE_CLIENT_HELLO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(content_type: u8, version: u16, payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.push(content_type);
        v.extend_from_slice(&version.to_be_bytes());
        v.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        v.extend_from_slice(payload);
        v
    }

    #[tokio::test]
    async fn parses_client_hello() {
        let payload = [0x01, 0x00, 0x00, 0x10];
        let bytes = record_bytes(0x16, 0x0301, &payload);
        let mut cursor = std::io::Cursor::new(bytes.clone());
        let rec = TlsRecord::read_from(&mut cursor).await.unwrap();
        assert!(rec.is_client_hello());
        assert_eq!(rec.raw(), bytes.as_slice());
        assert_eq!(rec.raw().len(), 5 + payload.len());
    }

    #[tokio::test]
    async fn rejects_non_client_hello_type() {
        let payload = [0x01, 0x00, 0x00, 0x00];
        let bytes = record_bytes(0x17, 0x0301, &payload);
        let mut cursor = std::io::Cursor::new(bytes);
        let rec = TlsRecord::read_from(&mut cursor).await.unwrap();
        assert!(!rec.is_client_hello());
    }

    #[tokio::test]
    async fn rejects_non_client_hello_handshake_type() {
        let payload = [0x02, 0x00, 0x00, 0x00];
        let bytes = record_bytes(0x16, 0x0301, &payload);
        let mut cursor = std::io::Cursor::new(bytes);
        let rec = TlsRecord::read_from(&mut cursor).await.unwrap();
        assert!(!rec.is_client_hello());
    }

    #[tokio::test]
    async fn accepts_max_payload_len() {
        let payload = vec![0u8; 16384];
        let bytes = record_bytes(0x16, 0x0301, &payload);
        let mut cursor = std::io::Cursor::new(bytes);
        let rec = TlsRecord::read_from(&mut cursor).await.unwrap();
        assert_eq!(rec.raw().len(), 5 + 16384);
    }

    #[tokio::test]
    async fn rejects_oversize_payload() {
        // Hand-craft a header claiming a payload of 16385 bytes without
        // actually supplying it, to hit the length check before the read.
        let mut bytes = vec![0x16];
        bytes.extend_from_slice(&0x0301u16.to_be_bytes());
        bytes.extend_from_slice(&16385u16.to_be_bytes());
        let mut cursor = std::io::Cursor::new(bytes);
        let err = TlsRecord::read_from(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FramingError::OversizePayload(_)));
    }

    #[tokio::test]
    async fn short_read_is_an_error() {
        let mut cursor = std::io::Cursor::new(vec![0x16, 0x03]);
        let err = TlsRecord::read_from(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FramingError::ShortRead(_)));
    }
}
