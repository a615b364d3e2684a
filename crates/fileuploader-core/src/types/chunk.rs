//! Chunked upload protocol types.

use serde::{Deserialize, Serialize};

/// Post field carrying the chunk descriptor.
pub const CHUNK_FIELD: &str = "_chunkedd";

/// File name prefix of chunk accumulation files.
pub const UNCONFIRMED_PREFIX: &str = ".unconfirmed_";

/// Descriptor sent by the client with every chunk of a logical file.
///
/// `name`, `type` and `size` describe the whole reassembled file, not the
/// chunk carried by the current request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    /// Original name of the whole file.
    #[serde(default)]
    pub name: String,
    /// Declared mime type of the whole file.
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Declared size of the whole file in bytes.
    #[serde(default)]
    pub size: u64,
    /// Set on the first chunk of a session.
    #[serde(rename = "isFirst", default)]
    pub is_first: bool,
    /// Set on the final chunk of a session.
    #[serde(rename = "isLast", default)]
    pub is_last: bool,
    /// Session token echoed back by the client after the first chunk.
    #[serde(default)]
    pub temp_name: Option<String>,
}

impl ChunkDescriptor {
    /// Parse the JSON chunk descriptor, ignoring malformed values.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Handshake returned while a chunk session is still accumulating.
///
/// Serializes as `{"fileuploader":{"temp_name":"<token>"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAck {
    /// Wrapper object expected by the client.
    pub fileuploader: ChunkToken,
}

/// Token body of a [`ChunkAck`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkToken {
    /// Token the client must echo on the next chunk.
    pub temp_name: String,
}

impl ChunkAck {
    /// Create an acknowledgment for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            fileuploader: ChunkToken {
                temp_name: token.into(),
            },
        }
    }

    /// The session token.
    pub fn token(&self) -> &str {
        &self.fileuploader.temp_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let chunk = ChunkDescriptor::parse(
            r#"{"name":"movie.mp4","type":"video/mp4","size":1536,"isLast":true,"temp_name":"Ab3dEf1700000000"}"#,
        )
        .unwrap();
        assert!(chunk.is_last);
        assert!(!chunk.is_first);
        assert_eq!(chunk.mime_type, "video/mp4");
        assert_eq!(chunk.temp_name.as_deref(), Some("Ab3dEf1700000000"));
    }

    #[test]
    fn test_ack_wire_shape() {
        let json = serde_json::to_value(ChunkAck::new("tok123")).unwrap();
        assert_eq!(json, serde_json::json!({"fileuploader": {"temp_name": "tok123"}}));
    }
}
