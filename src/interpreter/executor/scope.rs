//! Variable store and mem register

use std::collections::HashMap;

use super::errors::ExecError;
use super::types::Value;

/// Variables that scripts can read but never write or free
pub const READ_ONLY: [&str; 2] = ["argv", "argc"];

/* ===================== Scope ===================== */

/// One variable scope (the globals, or one call frame's variables)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    /// Seed the global scope with `argv` and `argc`
    pub fn with_args(args: Vec<String>) -> Self {
        let mut vars = HashMap::new();
        vars.insert("argc".to_string(), Value::Int(args.len() as i64));
        vars.insert(
            "argv".to_string(),
            Value::Array(args.into_iter().map(Value::Str).collect()),
        );
        Scope { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value, ExecError> {
        guard_read_only(name)?;
        self.vars
            .get_mut(name)
            .ok_or_else(|| ExecError::UndefinedVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        guard_read_only(name)?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Value, ExecError> {
        guard_read_only(name)?;
        self.vars
            .remove(name)
            .ok_or_else(|| ExecError::UndefinedVariable(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.vars.keys()
    }
}

fn guard_read_only(name: &str) -> Result<(), ExecError> {
    if READ_ONLY.contains(&name) {
        return Err(ExecError::ReadOnly(name.to_string()));
    }
    Ok(())
}

/* ===================== Mem Register ===================== */

/// Single-slot mailbox for call arguments, results and caught errors.
///
/// Reading empties it; writing overwrites whatever was pending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mem {
    slot: Option<Value>,
}

impl Mem {
    pub fn put(&mut self, value: Value) {
        self.slot = Some(value);
    }

    /// Read and clear
    pub fn take(&mut self) -> Option<Value> {
        self.slot.take()
    }

    /// Look without clearing (harness inspection)
    pub fn peek(&self) -> Option<&Value> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
