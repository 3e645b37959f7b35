pub mod environment;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::abi::Abi;
use crate::ast::{BlockStatement, OnIdentifier};
use crate::util;

use environment::Env;

/// A runtime value. Errors are values too, so short-circuit propagation in
/// the evaluator is a plain tag check.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Integer(BigInt),
    Boolean(bool),
    Str(String),
    /// 0x-prefixed lowercase hex.
    Bytes(String),
    /// 0x-prefixed lowercase hex, exactly 20 bytes.
    Address(String),
    Array(Vec<Object>),
    Hash(HashPairs),
    Function(Function),
    Builtin(Builtin),
    Contract(Contract),
    Instance(Instance),
    Account(String),
    Event(Event),
    /// Internal sentinel wrapping a value during return unwinding; never
    /// escapes a call frame.
    ReturnValue(Box<Object>),
    /// Several results at once: multi-output contract calls and tuple-valued
    /// `let`/`return`.
    Multiple(Vec<Object>),
    Error(String),
}

pub type HashPairs = HashMap<HashKey, HashPair>;

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

/// Stable hash over kind + canonical value bytes. Only `Integer`, `Boolean`
/// and `Str` values are hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub tag: u8,
    pub value: u64,
}

const TAG_INTEGER: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_STRING: u8 = 2;

fn fnv1a(tag: u8, data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    hash ^= tag as u64;
    hash = hash.wrapping_mul(0x100_0000_01b3);
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

pub type BuiltinFn = fn(Vec<Object>, &Env) -> Object;

/// A native function exposed to scripts.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.func == other.func
    }
}

/// A user function together with the environment it closed over.
#[derive(Debug, Clone)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Env,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters
            && self.body == other.body
            && Rc::ptr_eq(&self.env, &other.env)
    }
}

/// An ABI without an address; calling it with one yields an `Instance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub name: String,
    pub abi: Rc<Abi>,
}

/// An ABI bound to a deployed address; methods are callable via dot access.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub abi: Rc<Abi>,
    pub address: String,
}

/// A registered reaction block, waiting for matching logs.
#[derive(Debug, Clone)]
pub struct Event {
    pub contract: String,
    pub method: String,
    pub abi: Rc<Abi>,
    pub parameters: Vec<OnIdentifier>,
    pub body: BlockStatement,
    pub env: Env,
    pub address: Option<String>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.contract == other.contract
            && self.method == other.method
            && self.address == other.address
            && self.parameters == other.parameters
            && self.body == other.body
            && Rc::ptr_eq(&self.env, &other.env)
    }
}

impl Object {
    /// The kind tag used in equality, dispatch and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Null => "NULL",
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Str(_) => "STRING",
            Object::Bytes(_) => "BYTES",
            Object::Address(_) => "ADDRESS",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Contract(_) => "CONTRACT",
            Object::Instance(_) => "INSTANCE",
            Object::Account(_) => "ACCOUNT",
            Object::Event(_) => "EVENT",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Multiple(_) => "MULTIPLE",
            Object::Error(_) => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// The REPL rendering.
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(value) => Some(HashKey {
                tag: TAG_INTEGER,
                value: fnv1a(TAG_INTEGER, &value.to_signed_bytes_be()),
            }),
            Object::Boolean(value) => Some(HashKey {
                tag: TAG_BOOLEAN,
                value: fnv1a(TAG_BOOLEAN, &[*value as u8]),
            }),
            Object::Str(value) => Some(HashKey {
                tag: TAG_STRING,
                value: fnv1a(TAG_STRING, value.as_bytes()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Str(value) => f.write_str(value),
            Object::Bytes(value) => f.write_str(value),
            Object::Address(value) => f.write_str(value),
            Object::Array(elements) => {
                let rendered = elements
                    .iter()
                    .map(|e| e.inspect())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{}]", rendered)
            }
            Object::Hash(pairs) => {
                // Deterministic inspection regardless of map order.
                let mut rendered = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect::<Vec<_>>();
                rendered.sort();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Object::Function(function) => {
                write!(f, "fn({}) {}", function.parameters.join(", "), function.body)
            }
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::Contract(contract) => write!(f, "contract({})", contract.name),
            Object::Instance(instance) => {
                write!(f, "instance({}, {})", instance.name, instance.address)
            }
            Object::Account(address) => write!(f, "account({})", address),
            Object::Event(event) => write!(f, "event({}_{})", event.contract, event.method),
            Object::ReturnValue(value) => value.fmt(f),
            Object::Multiple(values) => {
                let rendered = values
                    .iter()
                    .map(|v| v.inspect())
                    .collect::<Vec<_>>()
                    .join(", ");
                f.write_str(&rendered)
            }
            Object::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

pub fn new_error(message: impl Into<String>) -> Object {
    Object::Error(message.into())
}

/// Reinterpret a bytes value as an address; succeeds iff it decodes to
/// exactly 20 bytes.
pub fn to_address(hex_value: &str) -> Result<String, String> {
    let raw = util::decode_hex(hex_value)?;
    if raw.len() != 20 {
        return Err("not an address".to_string());
    }
    Ok(util::encode_hex(&raw))
}

/// Insert a value under a string key; the helper used to assemble builtin
/// hash objects like `this`.
pub fn set_string_pair(pairs: &mut HashPairs, key: &str, value: Object) {
    let key = Object::Str(key.to_string());
    if let Some(hashed) = key.hash_key() {
        pairs.insert(hashed, HashPair { key, value });
    }
}

/// Look up a string key in a hash, yielding `Null` when absent.
pub fn get_string_pair(pairs: &HashPairs, key: &str) -> Object {
    let key = Object::Str(key.to_string());
    match key.hash_key().and_then(|hashed| pairs.get(&hashed)) {
        Some(pair) => pair.value.clone(),
        None => Object::Null,
    }
}
