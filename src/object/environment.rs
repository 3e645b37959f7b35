use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Builtin, Contract, Event, HashPairs, Object};

/// Environments form a reference-counted parent chain so that closures and
/// registered events can outlive the frame that created them.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
    builtins: HashMap<&'static str, Builtin>,
}

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn new_enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(outer.clone()),
            builtins: HashMap::new(),
        }))
    }

    /// Walks outward through the scope chain.
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .outer
                .as_ref()
                .and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Binds in the current scope only; never rebinds outer scopes.
    pub fn set(&mut self, name: &str, value: Object) {
        self.store.insert(name.to_string(), value);
    }

    pub fn add_builtins(&mut self, builtins: Vec<(&'static str, Builtin)>) {
        for (name, builtin) in builtins {
            self.builtins.insert(name, builtin);
        }
    }

    pub fn builtin(&self, name: &str) -> Option<Builtin> {
        match self.builtins.get(name) {
            Some(builtin) => Some(*builtin),
            None => self
                .outer
                .as_ref()
                .and_then(|outer| outer.borrow().builtin(name)),
        }
    }

    pub fn rpc_endpoint(&self) -> Result<String, String> {
        match self.get("endpoint") {
            Some(Object::Str(endpoint)) => Ok(endpoint),
            Some(_) => Err("endpoint is not a string".to_string()),
            None => Err("endpoint not found".to_string()),
        }
    }

    pub fn contract(&self, name: &str) -> Option<Contract> {
        match self.get(name) {
            Some(Object::Contract(contract)) => Some(contract),
            _ => None,
        }
    }

    /// The reaction blocks registered in this scope, in no particular order.
    pub fn events(&self) -> Vec<Event> {
        self.store
            .values()
            .filter_map(|value| match value {
                Object::Event(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Seed `args` with the process argv tail.
    pub fn build_args(&mut self, args: &[String]) {
        let elements = args.iter().map(|a| Object::Str(a.clone())).collect();
        self.set("args", Object::Array(elements));
    }

    /// Seed `env` with the process environment, verbatim.
    pub fn build_envs(&mut self, vars: impl Iterator<Item = (String, String)>) {
        let mut pairs = HashPairs::new();
        for (key, value) in vars {
            super::set_string_pair(&mut pairs, &key, Object::Str(value));
        }
        self.set("env", Object::Hash(pairs));
    }
}
