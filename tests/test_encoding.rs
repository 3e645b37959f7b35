//! ABI bridge tests — type parsing, signatures, the word codec, the
//! object bridge, and topic handling

use num_bigint::BigInt;

use heura_lang::abi::codec::{self, AbiValue};
use heura_lang::abi::types::AbiType;
use heura_lang::abi::{keccak256, Abi, AbiEvent, AbiFunction, AbiParam};
use heura_lang::encoding::{self, topics};
use heura_lang::eth::artifacts::ERC20_ABI;
use heura_lang::eth::rpc::Log;
use heura_lang::object::Object;

fn param(ty: AbiType, indexed: bool) -> AbiParam {
    AbiParam {
        name: String::new(),
        ty,
        indexed,
    }
}

fn int(value: i64) -> Object {
    Object::Integer(BigInt::from(value))
}

const HOLDER: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

// ── Type parsing ────────────────────────────────────────────

#[test]
fn parse_elementary_types() {
    assert_eq!(AbiType::parse("uint256").unwrap(), AbiType::Uint(256));
    assert_eq!(AbiType::parse("int8").unwrap(), AbiType::Int(8));
    assert_eq!(AbiType::parse("bool").unwrap(), AbiType::Bool);
    assert_eq!(AbiType::parse("address").unwrap(), AbiType::Address);
    assert_eq!(AbiType::parse("string").unwrap(), AbiType::Str);
    assert_eq!(AbiType::parse("bytes32").unwrap(), AbiType::FixedBytes(32));
}

#[test]
fn parse_unsized_integers_default_to_256() {
    assert_eq!(AbiType::parse("uint").unwrap(), AbiType::Uint(256));
    assert_eq!(AbiType::parse("int").unwrap(), AbiType::Int(256));
}

#[test]
fn parse_array_types() {
    assert_eq!(
        AbiType::parse("address[]").unwrap(),
        AbiType::Slice(Box::new(AbiType::Address))
    );
    assert_eq!(
        AbiType::parse("uint256[3]").unwrap(),
        AbiType::Array(Box::new(AbiType::Uint(256)), 3)
    );
    assert_eq!(
        AbiType::parse("uint8[][]").unwrap(),
        AbiType::Slice(Box::new(AbiType::Slice(Box::new(AbiType::Uint(8)))))
    );
}

#[test]
fn parse_rejects_unsupported_types() {
    assert!(AbiType::parse("tuple").is_err());
    assert!(AbiType::parse("uint7").is_err());
    assert!(AbiType::parse("bytes33").is_err());
}

#[test]
fn canonical_rendering() {
    assert_eq!(AbiType::parse("uint").unwrap().canonical(), "uint256");
    assert_eq!(AbiType::parse("address[]").unwrap().canonical(), "address[]");
}

// ── Signatures & hashing ────────────────────────────────────

#[test]
fn keccak_of_empty_input() {
    assert_eq!(
        hex::encode(keccak256(b"")),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn function_selector() {
    let balance_of = AbiFunction {
        name: "balanceOf".to_string(),
        inputs: vec![param(AbiType::Address, false)],
        outputs: vec![param(AbiType::Uint(256), false)],
    };
    assert_eq!(balance_of.signature(), "balanceOf(address)");
    assert_eq!(balance_of.selector(), [0x70, 0xa0, 0x82, 0x31]);

    let transfer = AbiFunction {
        name: "transfer".to_string(),
        inputs: vec![param(AbiType::Address, false), param(AbiType::Uint(256), false)],
        outputs: vec![],
    };
    assert_eq!(transfer.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
}

#[test]
fn event_topic0() {
    let transfer = AbiEvent {
        name: "Transfer".to_string(),
        inputs: vec![
            param(AbiType::Address, true),
            param(AbiType::Address, true),
            param(AbiType::Uint(256), false),
        ],
    };
    assert_eq!(
        hex::encode(transfer.topic0()),
        "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
}

// ── ABI JSON ────────────────────────────────────────────────

#[test]
fn parse_erc20_abi() {
    let abi = Abi::from_json(ERC20_ABI).unwrap();

    let balance_of = &abi.functions["balanceOf"];
    assert_eq!(balance_of.inputs.len(), 1);
    assert_eq!(balance_of.inputs[0].ty, AbiType::Address);
    assert_eq!(balance_of.outputs[0].ty, AbiType::Uint(256));

    let transfer = &abi.events["Transfer"];
    assert_eq!(transfer.inputs.len(), 3);
    assert!(transfer.inputs[0].indexed);
    assert!(transfer.inputs[1].indexed);
    assert!(!transfer.inputs[2].indexed);
}

#[test]
fn abi_json_rejects_garbage() {
    assert!(Abi::from_json("not json").is_err());
}

// ── Word codec ──────────────────────────────────────────────

#[test]
fn encode_uint256() {
    let encoded = codec::encode(
        &[AbiValue::Uint(BigInt::from(100))],
        &[AbiType::Uint(256)],
    )
    .unwrap();
    assert_eq!(encoded.len(), 32);
    assert_eq!(
        hex::encode(&encoded),
        "0000000000000000000000000000000000000000000000000000000000000064"
    );
}

#[test]
fn encode_negative_int_is_twos_complement() {
    let encoded = codec::encode(&[AbiValue::Int(BigInt::from(-1))], &[AbiType::Int(256)]).unwrap();
    assert_eq!(encoded, vec![0xff; 32]);
}

#[test]
fn encode_string() {
    let encoded =
        codec::encode(&[AbiValue::Str("hello".to_string())], &[AbiType::Str]).unwrap();
    // offset word + length word + one padded data word
    assert_eq!(encoded.len(), 96);
    assert_eq!(encoded[31], 32);
    assert_eq!(encoded[63], 5);
    assert_eq!(&encoded[64..69], b"hello");
}

#[test]
fn codec_round_trips() {
    let cases: Vec<(AbiValue, AbiType)> = vec![
        (AbiValue::Uint(BigInt::from(0)), AbiType::Uint(256)),
        (AbiValue::Uint(BigInt::from(1u64) << 63), AbiType::Uint(256)),
        (AbiValue::Int(BigInt::from(-12345)), AbiType::Int(256)),
        (AbiValue::Bool(true), AbiType::Bool),
        (AbiValue::Address([0x11; 20]), AbiType::Address),
        (AbiValue::Str("heura".to_string()), AbiType::Str),
        (AbiValue::FixedBytes(vec![0xde, 0xad, 0xbe, 0xef]), AbiType::FixedBytes(4)),
        (
            AbiValue::Slice(vec![
                AbiValue::Uint(BigInt::from(1)),
                AbiValue::Uint(BigInt::from(2)),
            ]),
            AbiType::Slice(Box::new(AbiType::Uint(256))),
        ),
        (
            AbiValue::Slice(vec![
                AbiValue::Str("a".to_string()),
                AbiValue::Str("bc".to_string()),
            ]),
            AbiType::Slice(Box::new(AbiType::Str)),
        ),
    ];

    for (value, ty) in cases {
        let encoded = codec::encode(std::slice::from_ref(&value), &[ty.clone()]).unwrap();
        let decoded = codec::decode(&encoded, &[ty.clone()]).unwrap();
        assert_eq!(decoded, vec![value], "round trip failed for {:?}", ty);
    }
}

#[test]
fn codec_round_trips_mixed_tuple() {
    let values = vec![
        AbiValue::Uint(BigInt::from(7)),
        AbiValue::Str("transfer".to_string()),
        AbiValue::Address([0x22; 20]),
    ];
    let types = vec![AbiType::Uint(256), AbiType::Str, AbiType::Address];

    let encoded = codec::encode(&values, &types).unwrap();
    assert_eq!(codec::decode(&encoded, &types).unwrap(), values);
}

#[test]
fn decode_rejects_short_data() {
    assert!(codec::decode(&[0u8; 16], &[AbiType::Uint(256)]).is_err());
}

#[test]
fn codec_rejects_dynamic_bytes() {
    assert!(codec::encode(&[AbiValue::Bool(true)], &[AbiType::Bytes]).is_err());
}

// ── Object bridge ───────────────────────────────────────────

#[test]
fn object_round_trips() {
    let cases: Vec<(Object, AbiType)> = vec![
        (int(100), AbiType::Uint(256)),
        (int(-5), AbiType::Int(256)),
        (Object::Boolean(true), AbiType::Bool),
        (Object::Str("hello".to_string()), AbiType::Str),
        (Object::Address(HOLDER.to_string()), AbiType::Address),
        (
            Object::Bytes(format!("0x{}", "ab".repeat(32))),
            AbiType::FixedBytes(32),
        ),
        (
            Object::Array(vec![int(1), int(2), int(3)]),
            AbiType::Slice(Box::new(AbiType::Uint(256))),
        ),
    ];

    for (obj, ty) in cases {
        let value = encoding::decode_object(&obj, &ty).unwrap();
        let back = encoding::encode_object(&value, &ty).unwrap();
        assert_eq!(back, obj, "round trip failed for {:?}", ty);
    }
}

#[test]
fn narrow_widths_truncate() {
    let value = encoding::decode_object(&int(300), &AbiType::Uint(8)).unwrap();
    assert_eq!(value, AbiValue::Uint(BigInt::from(44)));

    let value = encoding::decode_object(&int(-1), &AbiType::Int(8)).unwrap();
    assert_eq!(value, AbiValue::Int(BigInt::from(-1)));
}

#[test]
fn short_fixed_bytes_are_left_aligned() {
    let value =
        encoding::decode_object(&Object::Bytes("0xab".to_string()), &AbiType::FixedBytes(4))
            .unwrap();
    assert_eq!(value, AbiValue::FixedBytes(vec![0xab, 0, 0, 0]));
}

#[test]
fn bridge_kind_mismatch() {
    let err = encoding::decode_object(&Object::Boolean(true), &AbiType::Uint(256)).unwrap_err();
    assert_eq!(err.message, "failed to decode BOOLEAN as uint");
}

#[test]
fn pack_checks_arity() {
    let inputs = vec![param(AbiType::Address, false)];
    let err = encoding::pack(&inputs, &[]).unwrap_err();
    assert_eq!(err.message, "not enough arguments to pack. Found 0, Expected 1");
}

#[test]
fn pack_address_argument() {
    let inputs = vec![param(AbiType::Address, false)];
    let packed = encoding::pack(&inputs, &[Object::Address(HOLDER.to_string())]).unwrap();
    assert_eq!(packed.len(), 32);
    assert_eq!(hex::encode(&packed[12..]), &HOLDER[2..]);
}

#[test]
fn unpack_multiple_outputs() {
    let outputs = vec![param(AbiType::Uint(256), false), param(AbiType::Bool, false)];
    let mut data = vec![0u8; 64];
    data[31] = 9;
    data[63] = 1;

    let objects = encoding::unpack(&outputs, &data).unwrap();
    assert_eq!(objects, vec![int(9), Object::Boolean(true)]);
}

// ── Topics ──────────────────────────────────────────────────

#[test]
fn topic_round_trips() {
    let cases: Vec<(Object, AbiType)> = vec![
        (int(7), AbiType::Uint(256)),
        (Object::Boolean(true), AbiType::Bool),
        (Object::Address(HOLDER.to_string()), AbiType::Address),
        (Object::Bytes("0xdeadbeef".to_string()), AbiType::FixedBytes(4)),
    ];

    for (obj, ty) in cases {
        let topic = topics::encode_topic(&obj, &ty).unwrap();
        let back = topics::parse_topic(&topic, &ty).unwrap();
        assert_eq!(back, obj, "round trip failed for {:?}", ty);
    }
}

#[test]
fn indexed_arrays_hash_lossily() {
    let ty = AbiType::Slice(Box::new(AbiType::Uint(256)));
    let obj = Object::Array(vec![int(1), int(2)]);

    let topic = topics::encode_topic(&obj, &ty).unwrap();

    // the documented keccak256 of the element-wise encoding
    let mut buffer = vec![0u8; 64];
    buffer[31] = 1;
    buffer[63] = 2;
    assert_eq!(topic, keccak256(&buffer));

    // only the hash form survives
    assert_eq!(
        topics::parse_topic(&topic, &ty).unwrap(),
        Object::Bytes(format!("0x{}", hex::encode(topic)))
    );
}

#[test]
fn encode_topics_skips_wildcards() {
    let args = vec![param(AbiType::Address, true), param(AbiType::Address, true)];
    let objs = vec![Some(Object::Address(HOLDER.to_string())), None];

    let encoded = topics::encode_topics(&args, &objs).unwrap();
    assert_eq!(encoded.len(), 2);
    assert_eq!(encoded[0].len(), 1);
    assert!(encoded[1].is_empty());
}

fn transfer_log(from: &str, to: &str, value: u64) -> Log {
    let abi = Abi::from_json(ERC20_ABI).unwrap();
    let topic0 = hex::encode(abi.events["Transfer"].topic0());

    let pad_address = |addr: &str| format!("0x{:0>64}", &addr[2..]);
    let mut data = [0u8; 32];
    data[24..].copy_from_slice(&value.to_be_bytes());

    Log {
        address: HOLDER.to_string(),
        topics: vec![format!("0x{}", topic0), pad_address(from), pad_address(to)],
        data: format!("0x{}", hex::encode(data)),
        block_number: 123,
        block_hash: format!("0x{}", "11".repeat(32)),
        tx_hash: format!("0x{}", "22".repeat(32)),
    }
}

#[test]
fn parse_log_interleaves_topics_and_data() {
    let from = "0x1111111111111111111111111111111111111111";
    let to = "0x2222222222222222222222222222222222222222";
    let abi = Abi::from_json(ERC20_ABI).unwrap();
    let log = transfer_log(from, to, 100);

    let values = topics::parse_log(&abi.events["Transfer"].inputs, &log).unwrap();
    assert_eq!(
        values,
        vec![
            Object::Address(from.to_string()),
            Object::Address(to.to_string()),
            int(100),
        ]
    );
}

#[test]
fn parse_log_checks_topic_count() {
    let abi = Abi::from_json(ERC20_ABI).unwrap();
    let mut log = transfer_log(
        "0x1111111111111111111111111111111111111111",
        "0x2222222222222222222222222222222222222222",
        1,
    );
    log.topics.pop();

    let err = topics::parse_log(&abi.events["Transfer"].inputs, &log).unwrap_err();
    assert!(err.message.contains("failed to parse indexed topics"));
}
