pub mod codec;
pub mod types;

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use sha3::{Digest, Keccak256};

use types::AbiType;

#[derive(Debug)]
pub struct AbiError {
    pub message: String,
}

impl AbiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AbiError {}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbiParam {
    pub name: String,
    pub ty: AbiType,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
}

impl AbiFunction {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// First 4 bytes of keccak256 of the canonical signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = keccak256(self.signature().as_bytes());
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<AbiParam>,
}

impl AbiEvent {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// Full keccak256 of the canonical signature; topic 0 of emitted logs.
    pub fn topic0(&self) -> [u8; 32] {
        keccak256(self.signature().as_bytes())
    }
}

fn signature(name: &str, inputs: &[AbiParam]) -> String {
    let types = inputs
        .iter()
        .map(|p| p.ty.canonical())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", name, types)
}

/// A contract interface: its callable methods and its events, by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Abi {
    pub functions: HashMap<String, AbiFunction>,
    pub events: HashMap<String, AbiEvent>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    indexed: bool,
}

impl Abi {
    /// Parse standard Solidity ABI JSON. Constructors, fallbacks and other
    /// non function/event entries are ignored.
    pub fn from_json(data: &str) -> Result<Abi, AbiError> {
        let entries: Vec<RawEntry> = serde_json::from_str(data)
            .map_err(|e| AbiError::new(format!("invalid abi json: {}", e)))?;

        let mut abi = Abi::default();
        for entry in entries {
            match entry.kind.as_str() {
                "function" => {
                    let function = AbiFunction {
                        name: entry.name.clone(),
                        inputs: parse_params(entry.inputs)?,
                        outputs: parse_params(entry.outputs)?,
                    };
                    abi.functions.insert(entry.name, function);
                }
                "event" => {
                    let event = AbiEvent {
                        name: entry.name.clone(),
                        inputs: parse_params(entry.inputs)?,
                    };
                    abi.events.insert(entry.name, event);
                }
                _ => {}
            }
        }
        Ok(abi)
    }
}

fn parse_params(raw: Vec<RawParam>) -> Result<Vec<AbiParam>, AbiError> {
    raw.into_iter()
        .map(|p| {
            Ok(AbiParam {
                name: p.name,
                ty: AbiType::parse(&p.ty)?,
                indexed: p.indexed,
            })
        })
        .collect()
}
