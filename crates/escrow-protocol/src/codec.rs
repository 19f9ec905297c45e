use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{EscrowMessage, MAX_MESSAGE_SIZE};

const HEADER_LEN: usize = 5;

/// Codec for encoding/decoding escrow protocol messages.
pub struct EscrowCodec;

impl EscrowCodec {
    /// Encode a message with framing: [4 bytes len][1 byte tag][payload]
    pub fn encode(msg: &EscrowMessage) -> ProtocolResult<Bytes> {
        let payload = Self::encode_payload(msg)?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
        buf.put_u32(len);
        buf.put_u8(msg.type_tag());
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    /// Decode a framed message. Returns (message, bytes_consumed).
    pub fn decode(data: &[u8]) -> ProtocolResult<(EscrowMessage, usize)> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len - 1,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }
        let tag = data[4];
        let msg = Self::decode_payload(&data[HEADER_LEN..total])?;
        if msg.type_tag() != tag {
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        Ok((msg, total))
    }

    /// Encode payload only (no framing).
    pub fn encode_payload(msg: &EscrowMessage) -> ProtocolResult<Vec<u8>> {
        bincode::serialize(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Decode payload only (no framing).
    pub fn decode_payload(data: &[u8]) -> ProtocolResult<EscrowMessage> {
        bincode::deserialize(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}
