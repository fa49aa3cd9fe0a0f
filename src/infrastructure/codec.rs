//! JSON document codec.

use crate::application::ports::DocumentCodec;
use crate::domain::document::Document;
use crate::domain::outcome::CodecError;

/// Encodes documents as compact JSON with serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }

    /// Parse a document from JSON in the same wire schema.
    pub fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::new)
    }
}

impl DocumentCodec for JsonCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(document).map_err(CodecError::new)
    }
}
