//! The canonical contract ABI word encoding: 32-byte heads for static
//! values, offset-addressed tails for dynamic ones.

use num_bigint::{BigInt, Sign};
use num_traits::{One, ToPrimitive, Zero};

use super::types::AbiType;
use super::AbiError;

pub const WORD: usize = 32;

/// An ABI-typed value, halfway between runtime objects and raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AbiValue {
    Uint(BigInt),
    Int(BigInt),
    Bool(bool),
    Address([u8; 20]),
    Str(String),
    FixedBytes(Vec<u8>),
    Slice(Vec<AbiValue>),
}

/// Encode a tuple of values against their types.
pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
    if values.len() != types.len() {
        return Err(AbiError::new(format!(
            "cannot encode {} values as {} types",
            values.len(),
            types.len()
        )));
    }

    let head_size = WORD * types.len();
    let mut heads = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (value, ty) in values.iter().zip(types) {
        if ty.is_dynamic() {
            heads.extend_from_slice(&usize_to_word(head_size + tail.len()));
            tail.extend(encode_dynamic(value, ty)?);
        } else {
            heads.extend_from_slice(&encode_static(value, ty)?);
        }
    }

    heads.extend(tail);
    Ok(heads)
}

/// Decode a tuple of types from calldata or return data.
pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    for (i, ty) in types.iter().enumerate() {
        let head = word_at(data, i * WORD)?;
        if ty.is_dynamic() {
            let offset = word_to_usize(head)?;
            let area = data
                .get(offset..)
                .ok_or_else(|| AbiError::new("offset out of bounds"))?;
            values.push(decode_dynamic(area, ty)?);
        } else {
            values.push(decode_static(head, ty)?);
        }
    }
    Ok(values)
}

fn encode_static(value: &AbiValue, ty: &AbiType) -> Result<[u8; WORD], AbiError> {
    match (value, ty) {
        (AbiValue::Uint(v), AbiType::Uint(_)) => int_to_word(v),
        (AbiValue::Int(v), AbiType::Int(_)) => int_to_word(v),
        (AbiValue::Bool(v), AbiType::Bool) => {
            let mut word = [0u8; WORD];
            if *v {
                word[WORD - 1] = 1;
            }
            Ok(word)
        }
        (AbiValue::Address(v), AbiType::Address) => {
            let mut word = [0u8; WORD];
            word[WORD - 20..].copy_from_slice(v);
            Ok(word)
        }
        (AbiValue::FixedBytes(v), AbiType::FixedBytes(size)) => {
            if v.len() != *size {
                return Err(AbiError::new(format!(
                    "expected {} bytes, found {}",
                    size,
                    v.len()
                )));
            }
            let mut word = [0u8; WORD];
            word[..v.len()].copy_from_slice(v);
            Ok(word)
        }
        (_, AbiType::Array(..)) => Err(AbiError::new("fixed array type not supported")),
        _ => Err(AbiError::new(format!("cannot encode value as {}", ty))),
    }
}

fn encode_dynamic(value: &AbiValue, ty: &AbiType) -> Result<Vec<u8>, AbiError> {
    match (value, ty) {
        (AbiValue::Str(v), AbiType::Str) => {
            let mut out = usize_to_word(v.len()).to_vec();
            out.extend_from_slice(v.as_bytes());
            pad_right(&mut out);
            Ok(out)
        }
        (AbiValue::Slice(elements), AbiType::Slice(elem)) => {
            let mut out = usize_to_word(elements.len()).to_vec();
            let elem_types = vec![(**elem).clone(); elements.len()];
            out.extend(encode(elements, &elem_types)?);
            Ok(out)
        }
        (_, AbiType::Bytes) => Err(AbiError::new("bytes type not supported")),
        _ => Err(AbiError::new(format!("cannot encode value as {}", ty))),
    }
}

fn decode_static(word: &[u8], ty: &AbiType) -> Result<AbiValue, AbiError> {
    match ty {
        AbiType::Uint(_) => Ok(AbiValue::Uint(BigInt::from_bytes_be(Sign::Plus, word))),
        AbiType::Int(_) => {
            let mut value = BigInt::from_bytes_be(Sign::Plus, word);
            if word[0] & 0x80 != 0 {
                value -= BigInt::one() << 256;
            }
            Ok(AbiValue::Int(value))
        }
        AbiType::Bool => Ok(AbiValue::Bool(word[WORD - 1] == 1)),
        AbiType::Address => {
            let mut out = [0u8; 20];
            out.copy_from_slice(&word[WORD - 20..]);
            Ok(AbiValue::Address(out))
        }
        AbiType::FixedBytes(size) => Ok(AbiValue::FixedBytes(word[..*size].to_vec())),
        AbiType::Array(..) => Err(AbiError::new("fixed array type not supported")),
        _ => Err(AbiError::new(format!("cannot decode {} as static", ty))),
    }
}

// `data` is positioned at the value's length word; element offsets inside a
// slice are relative to the start of the element area.
fn decode_dynamic(data: &[u8], ty: &AbiType) -> Result<AbiValue, AbiError> {
    match ty {
        AbiType::Str => {
            let length = word_to_usize(word_at(data, 0)?)?;
            let bytes = data
                .get(WORD..WORD + length)
                .ok_or_else(|| AbiError::new("string data out of bounds"))?;
            let value = String::from_utf8(bytes.to_vec())
                .map_err(|_| AbiError::new("string data is not utf-8"))?;
            Ok(AbiValue::Str(value))
        }
        AbiType::Slice(elem) => {
            let length = word_to_usize(word_at(data, 0)?)?;
            let area = data
                .get(WORD..)
                .ok_or_else(|| AbiError::new("slice data out of bounds"))?;
            // every element occupies at least a head word
            if length > area.len() / WORD {
                return Err(AbiError::new("slice length out of bounds"));
            }
            let elem_types = vec![(**elem).clone(); length];
            Ok(AbiValue::Slice(decode(area, &elem_types)?))
        }
        AbiType::Bytes => Err(AbiError::new("bytes type not supported")),
        _ => Err(AbiError::new(format!("cannot decode {} as dynamic", ty))),
    }
}

/// Two's-complement conversion into a single 32-byte big-endian word.
pub fn int_to_word(value: &BigInt) -> Result<[u8; WORD], AbiError> {
    let adjusted = if value.sign() == Sign::Minus {
        value + (BigInt::one() << 256)
    } else {
        value.clone()
    };
    if adjusted.sign() == Sign::Minus || adjusted.bits() > 256 {
        return Err(AbiError::new(format!("integer {} out of range", value)));
    }

    let (_, bytes) = adjusted.to_bytes_be();
    let mut word = [0u8; WORD];
    if adjusted.is_zero() {
        return Ok(word);
    }
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn usize_to_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    data.get(offset..offset + WORD)
        .ok_or_else(|| AbiError::new("data too short"))
}

fn word_to_usize(word: &[u8]) -> Result<usize, AbiError> {
    BigInt::from_bytes_be(Sign::Plus, word)
        .to_usize()
        .ok_or_else(|| AbiError::new("length word out of range"))
}

fn pad_right(data: &mut Vec<u8>) {
    while data.len() % WORD != 0 {
        data.push(0);
    }
}
