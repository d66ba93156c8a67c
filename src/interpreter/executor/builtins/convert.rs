//! Conversions between value types

use super::{expect_args, type_error};
use crate::interpreter::executor::errors::ExecError;
use crate::interpreter::executor::types::Value;

pub fn to_str(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("str", args)?;
    Ok(Value::Str(value.to_string()))
}

pub fn to_int(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("int", args)?;
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ExecError::Type(format!("invalid literal for int(): '{}'", s))),
        other => Err(type_error("int", other)),
    }
}

pub fn to_float(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("float", args)?;
    match value {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ExecError::Type(format!("invalid literal for float(): '{}'", s))),
        other => Err(type_error("float", other)),
    }
}

pub fn to_bool(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("bool", args)?;
    Ok(Value::Bool(value.is_truthy()))
}

pub fn type_of(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("typeof", args)?;
    Ok(Value::from(value.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_conversions() {
        assert_eq!(to_int(&[Value::from(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(to_int(&[Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert!(to_int(&[Value::from("4x")]).is_err());
        assert!(to_int(&[Value::Array(vec![])]).is_err());
    }

    #[test]
    fn test_argument_count_checked() {
        let err = to_str(&[]).unwrap_err();
        assert_eq!(err.to_string(), "str() takes 1 argument(s), 0 given");
    }
}
