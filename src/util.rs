//! Hex helpers shared by the object model, the ABI bridge and the RPC layer.

/// Render bytes as 0x-prefixed lowercase hex.
pub fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode a hex string, with or without a 0x prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, String> {
    let trimmed = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(trimmed).map_err(|e| format!("failed to decode hex {:?}: {}", value, e))
}
