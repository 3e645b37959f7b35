//! Native functions seeded into the root environment.

use num_bigint::BigInt;

use crate::object::environment::Env;
use crate::object::{new_error, Builtin, Object};

pub fn all() -> Vec<(&'static str, Builtin)> {
    vec![
        ("len", Builtin { name: "len", func: len_builtin }),
        ("first", Builtin { name: "first", func: first_builtin }),
        ("last", Builtin { name: "last", func: last_builtin }),
        ("rest", Builtin { name: "rest", func: rest_builtin }),
        ("push", Builtin { name: "push", func: push_builtin }),
        ("print", Builtin { name: "print", func: print_builtin }),
        ("Account", Builtin { name: "Account", func: account_builtin }),
        ("kwei", Builtin { name: "kwei", func: kwei_builtin }),
        ("mwei", Builtin { name: "mwei", func: mwei_builtin }),
        ("gwei", Builtin { name: "gwei", func: gwei_builtin }),
        ("szabo", Builtin { name: "szabo", func: szabo_builtin }),
        ("finney", Builtin { name: "finney", func: finney_builtin }),
        ("ether", Builtin { name: "ether", func: ether_builtin }),
    ]
}

fn len_builtin(args: Vec<Object>, _env: &Env) -> Object {
    if args.len() != 1 {
        return new_error(format!("wrong number of arguments. got={}, want=1", args.len()));
    }
    match &args[0] {
        Object::Array(elements) => Object::Integer(BigInt::from(elements.len())),
        Object::Str(value) => Object::Integer(BigInt::from(value.len())),
        other => new_error(format!("argument to `len` not supported, got {}", other.kind())),
    }
}

fn first_builtin(args: Vec<Object>, _env: &Env) -> Object {
    let elements = match array_arg(&args, "first") {
        Ok(elements) => elements,
        Err(err) => return err,
    };
    elements.first().cloned().unwrap_or(Object::Null)
}

fn last_builtin(args: Vec<Object>, _env: &Env) -> Object {
    let elements = match array_arg(&args, "last") {
        Ok(elements) => elements,
        Err(err) => return err,
    };
    elements.last().cloned().unwrap_or(Object::Null)
}

fn rest_builtin(args: Vec<Object>, _env: &Env) -> Object {
    let elements = match array_arg(&args, "rest") {
        Ok(elements) => elements,
        Err(err) => return err,
    };
    if elements.is_empty() {
        return Object::Null;
    }
    Object::Array(elements[1..].to_vec())
}

fn push_builtin(args: Vec<Object>, _env: &Env) -> Object {
    if args.len() != 2 {
        return new_error(format!("wrong number of arguments. got={}, want=2", args.len()));
    }
    let elements = match &args[0] {
        Object::Array(elements) => elements,
        other => {
            return new_error(format!("argument to `push` must be ARRAY, got {}", other.kind()))
        }
    };
    let mut out = elements.clone();
    out.push(args[1].clone());
    Object::Array(out)
}

fn print_builtin(args: Vec<Object>, _env: &Env) -> Object {
    for arg in &args {
        println!("{}", arg.inspect());
    }
    Object::Null
}

fn account_builtin(args: Vec<Object>, env: &Env) -> Object {
    if args.len() != 1 {
        return new_error(format!("expected one parameter but found {}", args.len()));
    }
    match super::new_account(&args[0], env) {
        Ok(account) => account,
        Err(message) => new_error(message),
    }
}

fn array_arg<'a>(args: &'a [Object], name: &str) -> Result<&'a [Object], Object> {
    if args.len() != 1 {
        return Err(new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        )));
    }
    match &args[0] {
        Object::Array(elements) => Ok(elements),
        other => Err(new_error(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.kind()
        ))),
    }
}

// Denomination helpers: each multiplies a single integer by a power of ten.

fn kwei_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 3)
}

fn mwei_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 6)
}

fn gwei_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 9)
}

fn szabo_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 12)
}

fn finney_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 15)
}

fn ether_builtin(args: Vec<Object>, _env: &Env) -> Object {
    unit(args, 18)
}

fn unit(args: Vec<Object>, decimals: u32) -> Object {
    if args.len() != 1 {
        return new_error(format!("expected one parameter but found {}", args.len()));
    }
    match &args[0] {
        Object::Integer(value) => Object::Integer(value * BigInt::from(10u64.pow(decimals))),
        other => new_error(format!("expected number, got {}", other.kind())),
    }
}
