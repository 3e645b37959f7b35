//! The tree-walking evaluator. Errors are `Object::Error` values that
//! short-circuit sub-evaluation; the walker itself never panics on user
//! input.

pub mod builtins;

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::ast::{BlockStatement, Expression, OnStatement, Program, Statement};
use crate::eth::artifacts;
use crate::eth::contract::BoundContract;
use crate::eth::ens::Ens;
use crate::eth::rpc::{Log, RpcClient};
use crate::object::environment::{Env, Environment};
use crate::object::{
    self, get_string_pair, new_error, set_string_pair, Contract, Event, Function, HashPair,
    HashPairs, Instance, Object,
};
use crate::plugins;

/// A root environment with the builtins table installed.
pub fn new_env() -> Env {
    let env = Environment::new();
    env.borrow_mut().add_builtins(builtins::all());
    env
}

/// Evaluate top-level statements in source order. Stops at the first error,
/// unwraps the first top-level `return`. Statements that only bind names
/// produce no value.
pub fn eval_program(program: &Program, env: &Env) -> Option<Object> {
    let mut result = None;

    for statement in &program.statements {
        result = eval_statement(statement, env);

        match result {
            Some(Object::ReturnValue(value)) => return Some(*value),
            Some(Object::Error(message)) => return Some(Object::Error(message)),
            _ => {}
        }
    }

    result
}

fn eval_statement(statement: &Statement, env: &Env) -> Option<Object> {
    match statement {
        Statement::Expression { expression } => Some(eval_expression(expression, env)),

        Statement::Let { names, value } => eval_let_statement(names, value, env),

        Statement::Return { value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return Some(value);
            }
            Some(Object::ReturnValue(Box::new(value)))
        }

        Statement::Function {
            name,
            parameters,
            body,
        } => {
            let function = Object::Function(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            });
            env.borrow_mut().set(name, function.clone());
            Some(function)
        }

        Statement::Artifact { items } => eval_artifact_statement(items, env),

        Statement::Import { items } => eval_import_statement(items, env),

        Statement::On(statement) => eval_on_statement(statement, env),
    }
}

// Blocks keep the `ReturnValue` sentinel wrapped; the enclosing call frame
// unwraps it.
fn eval_block(block: &BlockStatement, env: &Env) -> Option<Object> {
    let mut result = None;

    for statement in &block.statements {
        result = eval_statement(statement, env);

        if let Some(value) = &result {
            if matches!(value, Object::ReturnValue(_) | Object::Error(_)) {
                return result;
            }
        }
    }

    result
}

fn eval_let_statement(names: &[String], value: &Expression, env: &Env) -> Option<Object> {
    let value = eval_expression(value, env);
    if value.is_error() {
        return Some(value);
    }

    // A single name binds the value as-is, a whole tuple included; several
    // names require a tuple of exactly that arity.
    if names.len() == 1 {
        env.borrow_mut().set(&names[0], value);
        return None;
    }

    let values = match value {
        Object::Multiple(values) => values,
        other => vec![other],
    };
    if names.len() != values.len() {
        return Some(new_error(format!(
            "length of let and values is different: {}, {}",
            names.len(),
            values.len()
        )));
    }

    for (name, value) in names.iter().zip(values) {
        env.borrow_mut().set(name, value);
    }
    None
}

fn eval_artifact_statement(items: &[Expression], env: &Env) -> Option<Object> {
    let abis = match artifacts::read_artifacts(items) {
        Ok(abis) => abis,
        Err(err) => return Some(new_error(err.message)),
    };

    for (name, abi) in abis {
        // first binding wins
        if env.borrow().get(&name).is_some() {
            continue;
        }
        let contract = Object::Contract(Contract {
            name: name.clone(),
            abi: Rc::new(abi),
        });
        env.borrow_mut().set(&name, contract);
    }

    None
}

fn eval_import_statement(items: &[Expression], env: &Env) -> Option<Object> {
    for item in items {
        let name = match item {
            Expression::Identifier(name) => name,
            Expression::StringLiteral(name) => name,
            other => return Some(new_error(format!("invalid import expression {}", other))),
        };

        let factory = match plugins::lookup(name) {
            Some(factory) => factory,
            None => return Some(new_error(format!("plugin {} not found", name))),
        };

        let plugin = factory(env);
        if plugin.is_error() {
            return Some(plugin);
        }
        env.borrow_mut().set(name, plugin);
    }

    None
}

// Parsed -> Validated (ABI event found, arities match) -> Bound (address
// filter resolved) -> Registered. Any failure leaves the env unchanged.
fn eval_on_statement(statement: &OnStatement, env: &Env) -> Option<Object> {
    let target = { env.borrow().get(&statement.contract) };
    let target = match target {
        Some(target) => target,
        None => return Some(new_error("contract not found")),
    };

    let (abi, bound_address) = match target {
        Object::Contract(contract) => (contract.abi, None),
        Object::Instance(instance) => (instance.abi, Some(instance.address)),
        _ => return Some(new_error("object found but it is no contract")),
    };

    let event_abi = match abi.events.get(&statement.method) {
        Some(event_abi) => event_abi,
        None => {
            return Some(new_error(format!(
                "event {} not found on contract",
                statement.method
            )))
        }
    };

    if event_abi.inputs.len() != statement.parameters.len() {
        return Some(new_error(format!(
            "event arity is different: {} and {}",
            event_abi.inputs.len(),
            statement.parameters.len()
        )));
    }

    let address = match &statement.address {
        Some(expression) => {
            // an instance already carries its address
            if bound_address.is_some() {
                return Some(new_error(format!(
                    "instance {} already has a bound address",
                    statement.contract
                )));
            }
            let value = eval_expression(expression, env);
            if value.is_error() {
                return Some(value);
            }
            match eval_address(env, &value) {
                Ok(address) => Some(address),
                Err(message) => return Some(new_error(message)),
            }
        }
        None => bound_address,
    };

    let event = Object::Event(Event {
        contract: statement.contract.clone(),
        method: statement.method.clone(),
        abi,
        parameters: statement.parameters.clone(),
        body: statement.body.clone(),
        env: env.clone(),
        address,
    });

    let name = format!("{}_{}", statement.contract, statement.method);
    env.borrow_mut().set(&name, event);
    None
}

fn eval_expression(expression: &Expression, env: &Env) -> Object {
    match expression {
        Expression::IntegerLiteral(value) => Object::Integer(BigInt::from(*value)),
        Expression::StringLiteral(value) => Object::Str(value.clone()),
        Expression::BytesLiteral(value) => Object::Bytes(value.to_lowercase()),
        Expression::Boolean(value) => Object::Boolean(*value),

        Expression::Identifier(name) => eval_identifier(name, env),

        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(operator, right)
        }

        Expression::Infix {
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(operator, left, right)
        }

        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if is_truthy(&condition) {
                eval_block(consequence, env).unwrap_or(Object::Null)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env).unwrap_or(Object::Null)
            } else {
                Object::Null
            }
        }

        Expression::ArrayLiteral(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Object::Array(elements),
            Err(err) => err,
        },

        Expression::HashLiteral(pairs) => eval_hash_literal(pairs, env),

        Expression::Call {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env);
            if function.is_error() {
                return function;
            }
            match eval_expressions(arguments, env) {
                Ok(arguments) => apply_function(env, function, arguments),
                Err(err) => err,
            }
        }

        Expression::Index { left, index, dot } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            if *dot {
                return eval_dot_index_expression(env, left, index);
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }

        Expression::Multiple(expressions) => match eval_expressions(expressions, env) {
            Ok(values) => Object::Multiple(values),
            Err(err) => err,
        },
    }
}

fn eval_expressions(expressions: &[Expression], env: &Env) -> Result<Vec<Object>, Object> {
    let mut values = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let value = eval_expression(expression, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_identifier(name: &str, env: &Env) -> Object {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    if let Some(builtin) = env.borrow().builtin(name) {
        return Object::Builtin(builtin);
    }
    new_error(format!("identifier not found: {}", name))
}

fn eval_prefix_expression(operator: &str, right: Object) -> Object {
    match operator {
        "!" => eval_bang_operator(right),
        "-" => match right {
            Object::Integer(value) => Object::Integer(-value),
            other => new_error(format!("unknown operator: -{}", other.kind())),
        },
        _ => new_error(format!("unknown operator: {}{}", operator, right.kind())),
    }
}

fn eval_bang_operator(right: Object) -> Object {
    match right {
        Object::Boolean(value) => Object::Boolean(!value),
        Object::Null => Object::Boolean(true),
        _ => Object::Boolean(false),
    }
}

fn eval_infix_expression(operator: &str, left: Object, right: Object) -> Object {
    if let (Object::Integer(lhs), Object::Integer(rhs)) = (&left, &right) {
        return eval_integer_infix_expression(operator, lhs, rhs);
    }

    match operator {
        // structural equality across every other kind
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => {
            if let (Object::Str(lhs), Object::Str(rhs)) = (&left, &right) {
                if operator == "+" {
                    return Object::Str(format!("{}{}", lhs, rhs));
                }
                return new_error(format!(
                    "unknown operator: {} {} {}",
                    left.kind(),
                    operator,
                    right.kind()
                ));
            }
            if left.kind() != right.kind() {
                return new_error(format!(
                    "type mismatch: {} {} {}",
                    left.kind(),
                    operator,
                    right.kind()
                ));
            }
            new_error(format!(
                "unknown operator: {} {} {}",
                left.kind(),
                operator,
                right.kind()
            ))
        }
    }
}

fn eval_integer_infix_expression(operator: &str, left: &BigInt, right: &BigInt) -> Object {
    match operator {
        "+" => Object::Integer(left + right),
        "-" => Object::Integer(left - right),
        "*" => Object::Integer(left * right),
        "/" => {
            if right.is_zero() {
                return new_error("division by zero");
            }
            Object::Integer(left / right)
        }
        "<" => Object::Boolean(left < right),
        ">" => Object::Boolean(left > right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => new_error(format!("unknown operator: INTEGER {} INTEGER", operator)),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Env) -> Object {
    let mut hash = HashPairs::new();

    for (key_expression, value_expression) in pairs {
        let key = eval_expression(key_expression, env);
        if key.is_error() {
            return key;
        }

        let hashed = match key.hash_key() {
            Some(hashed) => hashed,
            None => return new_error(format!("unusable as hash key: {}", key.kind())),
        };

        let value = eval_expression(value_expression, env);
        if value.is_error() {
            return value;
        }

        hash.insert(hashed, HashPair { key, value });
    }

    Object::Hash(hash)
}

fn eval_index_expression(left: Object, index: Object) -> Object {
    match (&left, &index) {
        (Object::Array(elements), Object::Integer(idx)) => {
            match idx.to_i64() {
                Some(idx) if idx >= 0 && (idx as usize) < elements.len() => {
                    elements[idx as usize].clone()
                }
                _ => Object::Null,
            }
        }
        (Object::Hash(pairs), _) => match index.hash_key() {
            Some(hashed) => match pairs.get(&hashed) {
                Some(pair) => pair.value.clone(),
                None => Object::Null,
            },
            None => new_error(format!("unusable as hash key: {}", index.kind())),
        },
        _ => new_error(format!("index operator not supported: {}", left.kind())),
    }
}

fn eval_dot_index_expression(env: &Env, left: Object, index: &Expression) -> Object {
    match left {
        Object::Hash(pairs) => match index {
            Expression::Identifier(name) => get_string_pair(&pairs, name),

            // nested access: this.obj.balanceOf(..), h.a.b
            Expression::Index {
                left: inner_left,
                index: inner_index,
                dot,
            } => {
                let name = match &**inner_left {
                    Expression::Identifier(name) => name,
                    _ => return new_error("dot access to hash object requires an identifier"),
                };
                let next = get_string_pair(&pairs, name);
                if next.is_error() {
                    return next;
                }
                if *dot {
                    return eval_dot_index_expression(env, next, inner_index);
                }
                let idx = eval_expression(inner_index, env);
                if idx.is_error() {
                    return idx;
                }
                eval_index_expression(next, idx)
            }

            // a callable stored in the hash: ens.Resolve("name")
            Expression::Call {
                function,
                arguments,
            } => {
                let name = match &**function {
                    Expression::Identifier(name) => name,
                    _ => return new_error("name not found"),
                };
                let callee = get_string_pair(&pairs, name);
                match eval_expressions(arguments, env) {
                    Ok(arguments) => apply_function(env, callee, arguments),
                    Err(err) => err,
                }
            }

            _ => new_error("dot access to hash object requires an identifier"),
        },

        Object::Instance(instance) => eval_instance_call(&instance, index, env),

        Object::Account(address) => eval_account_call(&address, index, env),

        other => new_error(format!("dot index operator not supported: {}", other.kind())),
    }
}

// Instance methods resolve against the ABI and run over eth_call.
fn eval_instance_call(instance: &Instance, expression: &Expression, env: &Env) -> Object {
    let (function, arguments) = match expression {
        Expression::Call {
            function,
            arguments,
        } => (function, arguments),
        _ => return new_error("it is not a call"),
    };

    let method = match &**function {
        Expression::Identifier(name) => name,
        _ => return new_error("name not found"),
    };

    let args = match eval_expressions(arguments, env) {
        Ok(args) => args,
        Err(err) => return err,
    };

    let endpoint = match env.borrow().rpc_endpoint() {
        Ok(endpoint) => endpoint,
        Err(message) => return new_error(message),
    };

    let contract = BoundContract::new(
        instance.abi.clone(),
        RpcClient::new(&endpoint),
        instance.address.clone(),
    );

    match contract.call(method, &args) {
        Ok(mut result) => {
            if result.len() > 1 {
                Object::Multiple(result)
            } else {
                result.pop().unwrap_or(Object::Null)
            }
        }
        Err(err) => new_error(err.message),
    }
}

fn eval_account_call(address: &str, expression: &Expression, env: &Env) -> Object {
    let (function, arguments) = match expression {
        Expression::Call {
            function,
            arguments,
        } => (function, arguments),
        _ => return new_error("it is not a call"),
    };

    let method = match &**function {
        Expression::Identifier(name) => name,
        _ => return new_error("name not found"),
    };

    if !arguments.is_empty() {
        return new_error(format!("expected zero params but found {}", arguments.len()));
    }

    let endpoint = match env.borrow().rpc_endpoint() {
        Ok(endpoint) => endpoint,
        Err(message) => return new_error(message),
    };
    let client = RpcClient::new(&endpoint);

    match method.as_str() {
        "nonce" => match client.nonce(address) {
            Ok(nonce) => Object::Integer(BigInt::from(nonce)),
            Err(err) => new_error(err.message),
        },
        "balance" => match client.balance(address) {
            Ok(balance) => Object::Integer(balance),
            Err(err) => new_error(err.message),
        },
        _ => new_error(format!("method {} not found on account", method)),
    }
}

/// Coerce a value into an address: already an `Address`, a 20-byte `Bytes`,
/// or a string resolved through ENS.
pub fn eval_address(env: &Env, obj: &Object) -> Result<String, String> {
    match obj {
        Object::Address(address) => Ok(address.clone()),
        Object::Bytes(value) => object::to_address(value)
            .map_err(|e| format!("failed to convert bytes to address: {}", e)),
        Object::Str(name) => {
            let endpoint = env.borrow().rpc_endpoint()?;
            let ens = Ens::new(&endpoint);
            ens.resolve(name).map_err(|e| e.message)
        }
        other => Err(format!("not an address type: {}", other.kind())),
    }
}

/// Call dispatch: user functions, builtins, and contracts (which bind an
/// address and become instances).
pub fn apply_function(env: &Env, function: Object, args: Vec<Object>) -> Object {
    match function {
        Object::Function(function) => {
            if function.parameters.len() != args.len() {
                return new_error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    function.parameters.len()
                ));
            }
            let extended = Environment::new_enclosed(&function.env);
            for (parameter, arg) in function.parameters.iter().zip(args) {
                extended.borrow_mut().set(parameter, arg);
            }
            unwrap_return_value(eval_block(&function.body, &extended))
        }

        Object::Builtin(builtin) => (builtin.func)(args, env),

        Object::Contract(contract) => {
            if args.len() != 1 {
                return new_error(format!("expected 1 value, found {}", args.len()));
            }
            match eval_address(env, &args[0]) {
                Ok(address) => Object::Instance(Instance {
                    name: contract.name,
                    abi: contract.abi,
                    address,
                }),
                Err(message) => new_error(message),
            }
        }

        other => new_error(format!("not a function: {}", other.kind())),
    }
}

/// Run a reaction block for one decoded log. The body's return value is
/// unwrapped; an `Object::Error` result is the failure to report.
pub fn apply_event(event: &Event, args: Vec<Object>, log: &Log) -> Object {
    if event.parameters.len() != args.len() {
        return new_error(format!(
            "event parameters do not match: {} and {}",
            event.parameters.len(),
            args.len()
        ));
    }

    let env = Environment::new_enclosed(&event.env);
    for (parameter, arg) in event.parameters.iter().zip(args) {
        env.borrow_mut().set(&parameter.name, arg);
    }
    let this = this_object(log, event);
    env.borrow_mut().set("this", this);

    unwrap_return_value(eval_block(&event.body, &env))
}

// The `this` hash bound inside reaction blocks.
fn this_object(log: &Log, event: &Event) -> Object {
    let mut pairs = HashPairs::new();

    set_string_pair(
        &mut pairs,
        "blocknumber",
        Object::Integer(BigInt::from(log.block_number)),
    );
    set_string_pair(
        &mut pairs,
        "blockhash",
        Object::Str(strip_hex_prefix(&log.block_hash)),
    );
    set_string_pair(&mut pairs, "txhash", Object::Str(strip_hex_prefix(&log.tx_hash)));
    set_string_pair(
        &mut pairs,
        "obj",
        Object::Instance(Instance {
            name: String::new(),
            abi: event.abi.clone(),
            address: log.address.to_lowercase(),
        }),
    );

    Object::Hash(pairs)
}

fn strip_hex_prefix(value: &str) -> String {
    value.strip_prefix("0x").unwrap_or(value).to_string()
}

fn unwrap_return_value(result: Option<Object>) -> Object {
    match result {
        Some(Object::ReturnValue(value)) => *value,
        Some(other) => other,
        None => Object::Null,
    }
}

fn is_truthy(obj: &Object) -> bool {
    match obj {
        Object::Null => false,
        Object::Boolean(value) => *value,
        _ => true,
    }
}

// referenced by builtins and plugins for address coercion
pub(crate) fn new_account(obj: &Object, env: &Env) -> Result<Object, String> {
    let address = eval_address(env, obj)?;
    Ok(Object::Account(address))
}
