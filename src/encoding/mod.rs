//! The bridge between runtime objects and ABI-typed values: calldata
//! packing/unpacking and event log decoding.

pub mod topics;

use std::fmt;

use num_bigint::{BigInt, Sign};
use num_traits::One;

use crate::abi::codec::{self, AbiValue};
use crate::abi::types::AbiType;
use crate::abi::{AbiError, AbiParam};
use crate::object::Object;
use crate::util;

#[derive(Debug)]
pub struct EncodingError {
    pub message: String,
}

impl EncodingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EncodingError {}

impl From<AbiError> for EncodingError {
    fn from(err: AbiError) -> Self {
        EncodingError::new(err.message)
    }
}

/// Pack call arguments against a method's inputs.
pub fn pack(inputs: &[AbiParam], args: &[Object]) -> Result<Vec<u8>, EncodingError> {
    if inputs.len() != args.len() {
        return Err(EncodingError::new(format!(
            "not enough arguments to pack. Found {}, Expected {}",
            args.len(),
            inputs.len()
        )));
    }

    let mut values = Vec::with_capacity(args.len());
    for (arg, input) in args.iter().zip(inputs) {
        values.push(decode_object(arg, &input.ty)?);
    }

    let types: Vec<AbiType> = inputs.iter().map(|i| i.ty.clone()).collect();
    Ok(codec::encode(&values, &types)?)
}

/// Unpack return data against a method's outputs.
pub fn unpack(outputs: &[AbiParam], data: &[u8]) -> Result<Vec<Object>, EncodingError> {
    let types: Vec<AbiType> = outputs.iter().map(|o| o.ty.clone()).collect();
    let values = codec::decode(data, &types)?;

    values
        .iter()
        .zip(&types)
        .map(|(value, ty)| encode_object(value, ty))
        .collect()
}

/// Map a runtime object into an ABI value of the given type.
///
/// 256-bit integers keep their big-int value; narrower widths convert the
/// way a chain of hardware casts would, through 64 bits and then into the
/// target width.
pub fn decode_object(obj: &Object, ty: &AbiType) -> Result<AbiValue, EncodingError> {
    match ty {
        AbiType::Uint(size) => match obj {
            Object::Integer(value) => Ok(AbiValue::Uint(truncate(value, *size, false))),
            _ => Err(decode_err(obj, "uint")),
        },
        AbiType::Int(size) => match obj {
            Object::Integer(value) => Ok(AbiValue::Int(truncate(value, *size, true))),
            _ => Err(decode_err(obj, "int")),
        },
        AbiType::Bool => match obj {
            Object::Boolean(value) => Ok(AbiValue::Bool(*value)),
            _ => Err(decode_err(obj, "bool")),
        },
        AbiType::Str => match obj {
            Object::Str(value) => Ok(AbiValue::Str(value.clone())),
            _ => Err(decode_err(obj, "string")),
        },
        AbiType::Address => match obj {
            Object::Address(value) => {
                let raw = util::decode_hex(value).map_err(EncodingError::new)?;
                if raw.len() != 20 {
                    return Err(decode_err(obj, "address"));
                }
                let mut out = [0u8; 20];
                out.copy_from_slice(&raw);
                Ok(AbiValue::Address(out))
            }
            _ => Err(decode_err(obj, "address")),
        },
        AbiType::FixedBytes(size) => match obj {
            Object::Bytes(value) => {
                let raw = util::decode_hex(value).map_err(EncodingError::new)?;
                // Left-aligned: zero-padded or right-truncated to the width.
                let mut out = vec![0u8; *size];
                let len = raw.len().min(*size);
                out[..len].copy_from_slice(&raw[..len]);
                Ok(AbiValue::FixedBytes(out))
            }
            _ => Err(decode_err(obj, "fixed bytes")),
        },
        AbiType::Slice(elem) => match obj {
            Object::Array(elements) => {
                let values = elements
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        decode_object(e, elem)
                            .map_err(|err| EncodingError::new(format!("element {}: {}", i, err)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AbiValue::Slice(values))
            }
            _ => Err(decode_err(obj, "slice")),
        },
        AbiType::Bytes => Err(EncodingError::new("bytes type not supported")),
        AbiType::Array(..) => Err(EncodingError::new("fixed array type not supported")),
    }
}

/// Map an ABI value back into a runtime object. The inverse of
/// `decode_object`.
pub fn encode_object(value: &AbiValue, ty: &AbiType) -> Result<Object, EncodingError> {
    match (value, ty) {
        (AbiValue::Uint(v), AbiType::Uint(_)) => Ok(Object::Integer(v.clone())),
        (AbiValue::Int(v), AbiType::Int(_)) => Ok(Object::Integer(v.clone())),
        (AbiValue::Bool(v), AbiType::Bool) => Ok(Object::Boolean(*v)),
        (AbiValue::Str(v), AbiType::Str) => Ok(Object::Str(v.clone())),
        (AbiValue::Address(v), AbiType::Address) => Ok(Object::Address(util::encode_hex(v))),
        (AbiValue::FixedBytes(v), AbiType::FixedBytes(_)) => {
            Ok(Object::Bytes(util::encode_hex(v)))
        }
        (AbiValue::Slice(values), AbiType::Slice(elem)) => {
            let elements = values
                .iter()
                .map(|v| encode_object(v, elem))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Object::Array(elements))
        }
        _ => Err(EncodingError::new(format!(
            "failed to encode abi value as {}",
            ty
        ))),
    }
}

// Wrap into the low `bits` bits, reading the result as signed or unsigned.
fn wrap(value: &BigInt, bits: usize) -> BigInt {
    let modulus = BigInt::one() << bits;
    let mut out = value % &modulus;
    if out.sign() == Sign::Minus {
        out += &modulus;
    }
    out
}

fn truncate(value: &BigInt, size: usize, signed: bool) -> BigInt {
    if size == 256 {
        return value.clone();
    }
    let low = wrap(&wrap(value, 64), size);
    if signed && (&low >> (size - 1)) == BigInt::one() {
        return low - (BigInt::one() << size);
    }
    low
}

fn decode_err(obj: &Object, ty: &str) -> EncodingError {
    EncodingError::new(format!("failed to decode {} as {}", obj.kind(), ty))
}
