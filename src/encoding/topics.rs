//! Event log decoding: indexed parameters travel in topics 1..3 as single
//! 32-byte words, the rest are ABI-encoded in the data blob.

use num_bigint::{BigInt, Sign};

use crate::abi::codec::int_to_word;
use crate::abi::types::AbiType;
use crate::abi::{keccak256, AbiParam};
use crate::eth::rpc::Log;
use crate::object::Object;
use crate::util;

use super::{unpack, EncodingError};

const WORD: usize = 32;

/// Decode a full log against the event's inputs, returning the values in
/// declaration order.
pub fn parse_log(inputs: &[AbiParam], log: &Log) -> Result<Vec<Object>, EncodingError> {
    let indexed: Vec<&AbiParam> = inputs.iter().filter(|i| i.indexed).collect();
    let non_indexed: Vec<AbiParam> = inputs.iter().filter(|i| !i.indexed).cloned().collect();

    // topic 0 is the event signature hash
    let topic_words = log
        .topics
        .iter()
        .skip(1)
        .map(|t| util::decode_hex(t).map_err(EncodingError::new))
        .collect::<Result<Vec<_>, _>>()?;

    let mut indexed_objs = parse_topics(&indexed, &topic_words)
        .map_err(|e| EncodingError::new(format!("failed to parse indexed topics: {}", e)))?;

    let data = util::decode_hex(&log.data).map_err(EncodingError::new)?;
    let mut non_indexed_objs = unpack(&non_indexed, &data)
        .map_err(|e| EncodingError::new(format!("failed to parse non-indexed data: {}", e)))?;

    let mut elems = Vec::with_capacity(inputs.len());
    for input in inputs {
        let elem = if input.indexed {
            indexed_objs.remove(0)
        } else {
            non_indexed_objs.remove(0)
        };
        elems.push(elem);
    }
    Ok(elems)
}

pub fn parse_topics(
    args: &[&AbiParam],
    topics: &[Vec<u8>],
) -> Result<Vec<Object>, EncodingError> {
    if args.len() != topics.len() {
        return Err(EncodingError::new(format!(
            "length should be the same. Arguments {} and topics {}",
            args.len(),
            topics.len()
        )));
    }

    args.iter()
        .zip(topics)
        .map(|(arg, topic)| parse_topic(topic, &arg.ty))
        .collect()
}

/// Decode one 32-byte topic word.
pub fn parse_topic(data: &[u8], ty: &AbiType) -> Result<Object, EncodingError> {
    if data.len() != WORD {
        return Err(EncodingError::new(format!(
            "topic must be {} bytes, found {}",
            WORD,
            data.len()
        )));
    }

    match ty {
        AbiType::Bool => Ok(Object::Boolean(data[WORD - 1] == 1)),
        AbiType::Int(_) | AbiType::Uint(_) => Ok(Object::Integer(BigInt::from_bytes_be(
            Sign::Plus,
            data,
        ))),
        AbiType::Address => Ok(Object::Address(util::encode_hex(&data[WORD - 20..]))),
        AbiType::FixedBytes(size) => Ok(Object::Bytes(util::encode_hex(&data[..*size]))),
        // Indexed dynamic values arrive as their keccak256 hash.
        AbiType::Slice(_) | AbiType::Array(..) => Ok(Object::Bytes(util::encode_hex(data))),
        _ => Err(EncodingError::new(format!(
            "topic parsing of type {} not supported",
            ty
        ))),
    }
}

/// Encode filter values into topic words; `None` entries match anything.
pub fn encode_topics(
    args: &[AbiParam],
    objs: &[Option<Object>],
) -> Result<Vec<Vec<[u8; WORD]>>, EncodingError> {
    if args.len() != objs.len() {
        return Err(EncodingError::new(format!(
            "length should be the same. Arguments {} and objects {}",
            args.len(),
            objs.len()
        )));
    }

    let mut topics = Vec::with_capacity(args.len());
    for (arg, obj) in args.iter().zip(objs) {
        let mut slot = Vec::new();
        if let Some(obj) = obj {
            slot.push(encode_topic(obj, &arg.ty)?);
        }
        topics.push(slot);
    }
    Ok(topics)
}

/// Encode a single value into its 32-byte topic form.
pub fn encode_topic(obj: &Object, ty: &AbiType) -> Result<[u8; WORD], EncodingError> {
    match ty {
        AbiType::Bool => match obj {
            Object::Boolean(value) => {
                let mut topic = [0u8; WORD];
                if *value {
                    topic[WORD - 1] = 1;
                }
                Ok(topic)
            }
            _ => Err(encode_topic_err(obj, ty)),
        },
        AbiType::Int(_) | AbiType::Uint(_) => match obj {
            Object::Integer(value) => {
                int_to_word(value).map_err(|e| EncodingError::new(e.message))
            }
            _ => Err(encode_topic_err(obj, ty)),
        },
        AbiType::Address => {
            let value = match obj {
                Object::Address(value) => value,
                Object::Bytes(value) => value,
                _ => return Err(encode_topic_err(obj, ty)),
            };
            let raw = util::decode_hex(value).map_err(EncodingError::new)?;
            if raw.len() > WORD {
                return Err(encode_topic_err(obj, ty));
            }
            let mut topic = [0u8; WORD];
            topic[WORD - raw.len()..].copy_from_slice(&raw);
            Ok(topic)
        }
        AbiType::FixedBytes(_) => match obj {
            Object::Bytes(value) => {
                let raw = util::decode_hex(value).map_err(EncodingError::new)?;
                if raw.len() > WORD {
                    return Err(encode_topic_err(obj, ty));
                }
                let mut topic = [0u8; WORD];
                topic[..raw.len()].copy_from_slice(&raw);
                Ok(topic)
            }
            _ => Err(encode_topic_err(obj, ty)),
        },
        AbiType::Slice(elem) => match obj {
            // Indexed arrays are filtered on the hash of their element-wise
            // encoding.
            Object::Array(elements) => {
                let mut buffer = Vec::with_capacity(elements.len() * WORD);
                for element in elements {
                    buffer.extend_from_slice(&encode_topic(element, elem)?);
                }
                Ok(keccak256(&buffer))
            }
            _ => Err(encode_topic_err(obj, ty)),
        },
        _ => Err(EncodingError::new(format!(
            "topic encoding of type {} not supported",
            ty
        ))),
    }
}

fn encode_topic_err(obj: &Object, ty: &AbiType) -> EncodingError {
    EncodingError::new(format!("cannot encode {} as {}", obj.kind(), ty))
}
