//! Builtin plugins loaded with `import`: each name maps to a factory whose
//! result is bound in the current environment.

use std::rc::Rc;

use serde::Deserialize;

use crate::abi::Abi;
use crate::eth::ens::Ens;
use crate::evaluator;
use crate::object::environment::Env;
use crate::object::{
    new_error, set_string_pair, to_address, Builtin, Contract, HashPairs, Instance, Object,
};

const ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

pub type Factory = fn(&Env) -> Object;

pub fn lookup(name: &str) -> Option<Factory> {
    match name {
        "account" => Some(account_factory),
        "ens" => Some(ens_factory),
        "etherscan" => Some(etherscan_factory),
        _ => None,
    }
}

// `import account; let a = account(0x..); a.balance()`
fn account_factory(_env: &Env) -> Object {
    Object::Builtin(Builtin {
        name: "account",
        func: account_builtin,
    })
}

fn account_builtin(args: Vec<Object>, env: &Env) -> Object {
    if args.len() != 1 {
        return new_error(format!("expected one parameter but found {}", args.len()));
    }
    match evaluator::new_account(&args[0], env) {
        Ok(account) => account,
        Err(message) => new_error(message),
    }
}

// `import ens; ens.Resolve("name.eth")`
fn ens_factory(_env: &Env) -> Object {
    let mut pairs = HashPairs::new();
    set_string_pair(
        &mut pairs,
        "Resolve",
        Object::Builtin(Builtin {
            name: "Resolve",
            func: ens_resolve_builtin,
        }),
    );
    Object::Hash(pairs)
}

fn ens_resolve_builtin(args: Vec<Object>, env: &Env) -> Object {
    if args.len() != 1 {
        return new_error(format!("expected one param but found {}", args.len()));
    }
    let name = match &args[0] {
        Object::Str(name) => name,
        other => {
            return new_error(format!(
                "expected argument to be string, got {}",
                other.kind()
            ))
        }
    };

    let endpoint = match env.borrow().rpc_endpoint() {
        Ok(endpoint) => endpoint,
        Err(message) => return new_error(message),
    };

    match Ens::new(&endpoint).resolve(name) {
        Ok(address) => Object::Address(address),
        Err(err) => new_error(err.message),
    }
}

// `import etherscan; let c = etherscan.Contract("0x..")`
fn etherscan_factory(_env: &Env) -> Object {
    let mut pairs = HashPairs::new();
    set_string_pair(
        &mut pairs,
        "ABI",
        Object::Builtin(Builtin {
            name: "ABI",
            func: etherscan_abi_builtin,
        }),
    );
    set_string_pair(
        &mut pairs,
        "Contract",
        Object::Builtin(Builtin {
            name: "Contract",
            func: etherscan_contract_builtin,
        }),
    );
    Object::Hash(pairs)
}

fn etherscan_abi_builtin(args: Vec<Object>, _env: &Env) -> Object {
    let address = match string_arg(&args) {
        Ok(address) => address,
        Err(err) => return err,
    };
    match fetch_abi(&address) {
        Ok(abi) => Object::Contract(Contract {
            name: "Artifact".to_string(),
            abi: Rc::new(abi),
        }),
        Err(message) => new_error(message),
    }
}

fn etherscan_contract_builtin(args: Vec<Object>, _env: &Env) -> Object {
    let address = match string_arg(&args) {
        Ok(address) => address,
        Err(err) => return err,
    };
    let address = match to_address(&address) {
        Ok(address) => address,
        Err(message) => return new_error(message),
    };
    match fetch_abi(&address) {
        Ok(abi) => Object::Instance(Instance {
            name: "Artifact".to_string(),
            abi: Rc::new(abi),
            address,
        }),
        Err(message) => new_error(message),
    }
}

fn string_arg(args: &[Object]) -> Result<String, Object> {
    if args.len() != 1 {
        return Err(new_error(format!(
            "expected one param but found {}",
            args.len()
        )));
    }
    match &args[0] {
        Object::Str(value) => Ok(value.clone()),
        other => Err(new_error(format!(
            "expected argument to be string, got {}",
            other.kind()
        ))),
    }
}

#[derive(Deserialize)]
struct EtherscanResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

fn fetch_abi(contract: &str) -> Result<Abi, String> {
    let url = format!(
        "{}?module=contract&action=getabi&address={}",
        ETHERSCAN_URL, contract
    );

    let response: EtherscanResponse = ureq::get(&url)
        .call()
        .map_err(|e| format!("etherscan request failed: {}", e))?
        .into_json()
        .map_err(|e| format!("etherscan response is not json: {}", e))?;

    if response.status != "1" {
        return Err(format!("etherscan lookup failed: {}", response.message));
    }

    Abi::from_json(&response.result).map_err(|e| e.message)
}
