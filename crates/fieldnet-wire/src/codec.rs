use crate::types::Message;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a message into its flat JSON record.
pub fn encode(message: &Message) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode a flat JSON record. Absent optional fields come back as `None`.
pub fn decode(payload: &[u8]) -> Result<Message, WireError> {
    Ok(serde_json::from_slice(payload)?)
}
