use std::fmt;

use regex::Regex;

use super::AbiError;

/// A parsed Solidity ABI type. Tuples and fixed-point types are not
/// supported and fail at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint(usize),
    Int(usize),
    Bool,
    Address,
    Str,
    /// Dynamic `bytes`. Parsed, but rejected by the codec and the bridge.
    Bytes,
    FixedBytes(usize),
    /// `T[]`
    Slice(Box<AbiType>),
    /// `T[N]`. Parsed, but rejected by the codec and the bridge.
    Array(Box<AbiType>, usize),
}

impl AbiType {
    pub fn parse(value: &str) -> Result<AbiType, AbiError> {
        let array = Regex::new(r"^(.+)\[(\d*)\]$").expect("static pattern");
        if let Some(captures) = array.captures(value) {
            let elem = AbiType::parse(&captures[1])?;
            if captures[2].is_empty() {
                return Ok(AbiType::Slice(Box::new(elem)));
            }
            let size: usize = captures[2]
                .parse()
                .map_err(|_| AbiError::new(format!("invalid array size in {:?}", value)))?;
            return Ok(AbiType::Array(Box::new(elem), size));
        }

        match value {
            "bool" => return Ok(AbiType::Bool),
            "address" => return Ok(AbiType::Address),
            "string" => return Ok(AbiType::Str),
            "bytes" => return Ok(AbiType::Bytes),
            _ => {}
        }

        let numeric = Regex::new(r"^(u?int)(\d*)$").expect("static pattern");
        if let Some(captures) = numeric.captures(value) {
            let size = if captures[2].is_empty() {
                256
            } else {
                captures[2]
                    .parse()
                    .map_err(|_| AbiError::new(format!("invalid integer size in {:?}", value)))?
            };
            if size == 0 || size > 256 || size % 8 != 0 {
                return Err(AbiError::new(format!("invalid integer size in {:?}", value)));
            }
            return Ok(match &captures[1] {
                "uint" => AbiType::Uint(size),
                _ => AbiType::Int(size),
            });
        }

        let fixed_bytes = Regex::new(r"^bytes(\d+)$").expect("static pattern");
        if let Some(captures) = fixed_bytes.captures(value) {
            let size: usize = captures[1]
                .parse()
                .map_err(|_| AbiError::new(format!("invalid bytes size in {:?}", value)))?;
            if size == 0 || size > 32 {
                return Err(AbiError::new(format!("invalid bytes size in {:?}", value)));
            }
            return Ok(AbiType::FixedBytes(size));
        }

        Err(AbiError::new(format!("abi type {:?} not supported", value)))
    }

    /// Canonical rendering used for signatures (`uint256`, `address[]`, ...).
    pub fn canonical(&self) -> String {
        match self {
            AbiType::Uint(size) => format!("uint{}", size),
            AbiType::Int(size) => format!("int{}", size),
            AbiType::Bool => "bool".to_string(),
            AbiType::Address => "address".to_string(),
            AbiType::Str => "string".to_string(),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::FixedBytes(size) => format!("bytes{}", size),
            AbiType::Slice(elem) => format!("{}[]", elem.canonical()),
            AbiType::Array(elem, size) => format!("{}[{}]", elem.canonical(), size),
        }
    }

    /// Whether the encoding is placed in the tail with an offset word at the
    /// head position.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Str | AbiType::Bytes | AbiType::Slice(_) => true,
            AbiType::Array(elem, _) => elem.is_dynamic(),
            _ => false,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
