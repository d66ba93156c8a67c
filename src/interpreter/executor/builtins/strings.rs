//! String helpers

use super::{expect_args, type_error};
use crate::interpreter::executor::errors::ExecError;
use crate::interpreter::executor::types::Value;

fn map_str(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>(name, args)?;
    match value {
        Value::Str(s) => Ok(Value::Str(f(s))),
        other => Err(type_error(name, other)),
    }
}

pub fn upper(args: &[Value]) -> Result<Value, ExecError> {
    map_str("upper", args, str::to_uppercase)
}

pub fn lower(args: &[Value]) -> Result<Value, ExecError> {
    map_str("lower", args, str::to_lowercase)
}

pub fn trim(args: &[Value]) -> Result<Value, ExecError> {
    map_str("trim", args, |s| s.trim().to_string())
}
