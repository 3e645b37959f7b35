//! Ethereum Name Service resolution: namehash the name, ask the registry
//! for its resolver, ask the resolver for the address.

use crate::abi::keccak256;
use crate::util;

use super::rpc::RpcClient;
use super::EthError;

pub const MAINNET_REGISTRY: &str = "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e";

// resolver(bytes32) and addr(bytes32)
const RESOLVER_SELECTOR: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
const ADDR_SELECTOR: [u8; 4] = [0x3b, 0x3b, 0x57, 0xde];

pub struct Ens {
    client: RpcClient,
    registry: String,
}

impl Ens {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: RpcClient::new(endpoint),
            registry: MAINNET_REGISTRY.to_string(),
        }
    }

    /// Resolve a name to its 20-byte address, 0x-prefixed lowercase hex.
    pub fn resolve(&self, name: &str) -> Result<String, EthError> {
        let node = namehash(name);

        let mut data = RESOLVER_SELECTOR.to_vec();
        data.extend_from_slice(&node);
        let output = self.client.call(&self.registry, &data)?;
        let resolver = address_from_word(&output)
            .ok_or_else(|| EthError::new(format!("no resolver for {}", name)))?;

        let mut data = ADDR_SELECTOR.to_vec();
        data.extend_from_slice(&node);
        let output = self.client.call(&resolver, &data)?;
        address_from_word(&output).ok_or_else(|| EthError::new(format!("name {} not found", name)))
    }
}

/// Recursive keccak over the dot-separated labels, rightmost first.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.split('.').rev() {
        let label_hash = keccak256(label.as_bytes());
        let mut buffer = [0u8; 64];
        buffer[..32].copy_from_slice(&node);
        buffer[32..].copy_from_slice(&label_hash);
        node = keccak256(&buffer);
    }
    node
}

// The low 20 bytes of a 32-byte return word; None when absent or zero.
fn address_from_word(output: &[u8]) -> Option<String> {
    if output.len() < 32 {
        return None;
    }
    let raw = &output[12..32];
    if raw.iter().all(|&b| b == 0) {
        return None;
    }
    Some(util::encode_hex(raw))
}
