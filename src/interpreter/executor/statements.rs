//! Operation handlers
//!
//! `dispatch` resolves an operation by command name to exactly one handler.
//! Handlers return the control signal for the program counter, or an
//! `ExecError` that the loop raises against the operation.

use std::env;
use std::fs;
use std::process::Command;

use tracing::debug;

use super::errors::ExecError;
use super::functions::PendingFunction;
use super::try_catch::TryContext;
use super::types::{CodeUnit, ControlSignal, Operation, Value};
use super::vm::VM;
use crate::interpreter::parser;

/* ===================== Dispatch ===================== */

/// Run one operation
pub fn dispatch(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    if op.command == "endfunc" {
        return execute_endfunc(vm);
    }

    if let Some(pending) = vm.defining.as_mut() {
        pending.body.push(op.clone());
        return Ok(ControlSignal::Advance);
    }

    match op.command.as_str() {
        "pass" | "section" => Ok(ControlSignal::Advance),
        "popstate" => execute_popstate(vm),
        "set" => execute_set(vm, op),
        "free" => execute_free(vm, op),
        "copy" => execute_copy(vm, op),
        "out" => execute_out(vm, op),
        "read" => execute_read(vm, op),
        "return" => execute_return(vm, op),
        "func" => execute_func(vm, op),
        "required" => execute_required(vm, op),
        "typeof" => execute_typeof(vm, op),
        "isset" => execute_isset(vm, op),
        "system" => execute_system(vm, op),
        "include" => execute_include(vm, op),
        "eval" => execute_eval(vm, op),
        "goto" => execute_goto(vm, op),
        "gotoif" => execute_gotoif(vm, op),
        "try" => execute_try(vm, op),
        "endtry" => {
            vm.try_state.exit();
            Ok(ControlSignal::Advance)
        }
        "fread" => execute_fread(vm, op),
        "fwrite" => execute_fwrite(vm, op),
        "chdir" => execute_chdir(vm, op),
        "cwd" => execute_cwd(vm),
        "arraypush" => execute_arraypush(vm, op),
        "arraypop" => execute_arraypop(vm, op),
        "namespace" => execute_namespace(vm, op),
        "endnamespace" => {
            vm.namespaces.close();
            Ok(ControlSignal::Advance)
        }
        "use" => execute_use(vm, op),
        _ => execute_call(vm, op),
    }
}

/* ===================== Operands ===================== */

/// `$name` token -> `name`
fn var_name<'a>(op: &Operation, token: &'a str) -> Result<&'a str, ExecError> {
    token
        .strip_prefix('$')
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ExecError::arguments(&op.command, "variable names like $name"))
}

/// Every argument as a variable name; at least one required
fn var_names<'a>(op: &'a Operation) -> Result<Vec<&'a str>, ExecError> {
    if op.args.is_empty() {
        return Err(ExecError::arguments(&op.command, "at least one variable"));
    }
    op.args.iter().map(|token| var_name(op, token)).collect()
}

fn single_arg<'a>(op: &'a Operation, expected: &'static str) -> Result<&'a str, ExecError> {
    match op.args.as_slice() {
        [only] => Ok(only.as_str()),
        _ => Err(ExecError::arguments(&op.command, expected)),
    }
}

/// Whole argument text as an expression
fn eval_args(vm: &mut VM, op: &Operation) -> Result<Value, ExecError> {
    if op.args_str.is_empty() {
        return Err(ExecError::arguments(&op.command, "an argument"));
    }
    vm.eval(&op.args_str)
}

fn eval_string(vm: &mut VM, op: &Operation, source: &str) -> Result<String, ExecError> {
    match vm.eval(source)? {
        Value::Str(s) => Ok(s),
        other => Err(ExecError::Type(format!(
            "\"{}\" expects a str, got {}",
            op.command,
            other.type_name()
        ))),
    }
}

/* ===================== Variables ===================== */

fn execute_set(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    for name in var_names(op)? {
        vm.scope_mut().set(name, Value::Null)?;
    }
    Ok(ControlSignal::Advance)
}

fn execute_free(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    for name in var_names(op)? {
        let resolved = vm.resolve_var(name).unwrap_or_else(|| name.to_string());
        vm.scope_mut().remove(&resolved)?;
    }
    Ok(ControlSignal::Advance)
}

/// `copy $b` stores mem in b; `copy $a $b` and `copy ^ $b` copy a (or mem) to b
fn execute_copy(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let (value, target) = match op.args.as_slice() {
        [target] => (vm.mem.take().unwrap_or(Value::Null), target),
        [source, target] => (vm.eval(source)?, target),
        _ => return Err(ExecError::arguments(&op.command, "one or two operands")),
    };
    let name = var_name(op, target)?;
    vm.scope_mut().set(name, value)?;
    Ok(ControlSignal::Advance)
}

fn execute_isset(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let all_set = var_names(op)?
        .into_iter()
        .all(|name| vm.resolve_var(name).is_some());
    vm.mem.put(Value::Bool(all_set));
    Ok(ControlSignal::Advance)
}

fn execute_required(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    for name in var_names(op)? {
        if vm.resolve_var(name).is_none() {
            return Err(ExecError::UndefinedVariable(name.to_string()));
        }
    }
    Ok(ControlSignal::Advance)
}

fn execute_typeof(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let value = eval_args(vm, op)?;
    vm.mem.put(Value::from(value.type_name()));
    Ok(ControlSignal::Advance)
}

fn execute_arraypush(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let (Some(first), rest) = (op.first_arg(), op.rest_args()) else {
        return Err(ExecError::arguments(&op.command, "an array variable and a value"));
    };
    if rest.is_empty() {
        return Err(ExecError::arguments(&op.command, "an array variable and a value"));
    }
    let name = var_name(op, first)?;
    let value = vm.eval(rest)?;
    let resolved = vm.resolve_var(name).unwrap_or_else(|| name.to_string());
    match vm.scope_mut().get_mut(&resolved)? {
        Value::Array(items) => {
            items.push(value);
            Ok(ControlSignal::Advance)
        }
        other => Err(ExecError::Type(format!(
            "\"{}\" is {}, not an array",
            name,
            other.type_name()
        ))),
    }
}

fn execute_arraypop(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let name = var_name(op, single_arg(op, "one array variable")?)?;
    let resolved = vm.resolve_var(name).unwrap_or_else(|| name.to_string());
    let popped = match vm.scope_mut().get_mut(&resolved)? {
        Value::Array(items) => items
            .pop()
            .ok_or_else(|| ExecError::Runtime("pop from empty array".to_string()))?,
        other => {
            return Err(ExecError::Type(format!(
                "\"{}\" is {}, not an array",
                name,
                other.type_name()
            )))
        }
    };
    vm.mem.put(popped);
    Ok(ControlSignal::Advance)
}

/* ===================== I/O ===================== */

fn execute_out(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let value = eval_args(vm, op)?;
    vm.write_output(&value.to_string())?;
    Ok(ControlSignal::Advance)
}

fn execute_read(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    for name in var_names(op)? {
        let line = vm.read_line()?;
        vm.scope_mut().set(name, Value::Str(line))?;
    }
    Ok(ControlSignal::Advance)
}

fn execute_system(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let command = eval_string(vm, op, &op.args_str)?;
    debug!(command = %command, "running system command");

    let mut shell = Command::new("sh");
    shell.arg("-c").arg(&command);

    let status = if vm.harness {
        let output = shell.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        vm.write_output(&stdout)?;
        output.status
    } else {
        shell.status()?
    };

    vm.mem.put(Value::Int(i64::from(status.code().unwrap_or(-1))));
    Ok(ControlSignal::Advance)
}

fn execute_fread(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let path = eval_string(vm, op, &op.args_str)?;
    let contents = fs::read_to_string(&path)?;
    vm.mem.put(Value::Str(contents));
    Ok(ControlSignal::Advance)
}

/// `fwrite <path> <content>`: the first token is the path expression, the
/// rest of the text the content expression
fn execute_fwrite(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let (Some(first), rest) = (op.first_arg(), op.rest_args()) else {
        return Err(ExecError::arguments(&op.command, "a path and content"));
    };
    if rest.is_empty() {
        return Err(ExecError::arguments(&op.command, "a path and content"));
    }
    let path = eval_string(vm, op, first)?;
    let content = vm.eval(rest)?;
    fs::write(&path, content.to_string())?;
    Ok(ControlSignal::Advance)
}

fn execute_chdir(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let path = eval_string(vm, op, &op.args_str)?;
    env::set_current_dir(&path)?;
    Ok(ControlSignal::Advance)
}

fn execute_cwd(vm: &mut VM) -> Result<ControlSignal, ExecError> {
    let cwd = env::current_dir()?;
    vm.mem.put(Value::Str(cwd.display().to_string()));
    Ok(ControlSignal::Advance)
}

/* ===================== Control Flow ===================== */

fn execute_goto(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let label = single_arg(op, "one section name")?;
    jump(vm, label)
}

/// Jump when the mem value is truthy; mem is consumed either way
fn execute_gotoif(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let label = single_arg(op, "one section name")?;
    let condition = vm.mem.take().unwrap_or(Value::Null);
    if condition.is_truthy() {
        return jump(vm, label);
    }
    Ok(ControlSignal::Advance)
}

/// Labels resolve in the code unit the cursor is walking
fn jump(vm: &mut VM, label: &str) -> Result<ControlSignal, ExecError> {
    let target = vm.unit_stream(&vm.cursor.unit).section(label)?;
    vm.cursor.pc = target;
    Ok(ControlSignal::Redirect)
}

fn execute_try(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let label = single_arg(op, "one section name")?;
    vm.unit_stream(&vm.cursor.unit).section(label)?;
    let context = TryContext {
        label: label.to_string(),
        unit: vm.cursor.unit.clone(),
        depth: vm.cursor.depth,
    };
    vm.try_state.enter(context);
    Ok(ControlSignal::Advance)
}

/* ===================== Functions ===================== */

fn execute_func(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let name = single_arg(op, "one function name")?;
    vm.defining = Some(PendingFunction {
        name: vm.namespaces.qualify(name),
        body: Vec::new(),
    });
    Ok(ControlSignal::Advance)
}

fn execute_endfunc(vm: &mut VM) -> Result<ControlSignal, ExecError> {
    if let Some(pending) = vm.defining.take() {
        let body = vm.functions.define(pending)?;
        debug!(function = %body.name, operations = body.stream.len(), "defined function");
    }
    Ok(ControlSignal::Advance)
}

fn execute_popstate(vm: &mut VM) -> Result<ControlSignal, ExecError> {
    if vm.pop_frame().is_some() {
        return Ok(ControlSignal::Redirect);
    }
    Ok(ControlSignal::Advance)
}

fn execute_return(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    if !op.args_str.is_empty() {
        let value = vm.eval(&op.args_str)?;
        vm.mem.put(value);
    }
    Ok(vm.return_from_call())
}

/// Any unknown command is a function invocation
fn execute_call(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let body = vm
        .functions
        .resolve(&op.command, &vm.namespaces)
        .ok_or_else(|| ExecError::UndefinedOperation(op.command.clone()))?;
    vm.invoke(op, body)
}

/* ===================== Namespaces ===================== */

fn execute_namespace(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let name = single_arg(op, "one namespace name")?;
    vm.namespaces.open(name);
    Ok(ControlSignal::Advance)
}

fn execute_use(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    for name in &op.args {
        vm.namespaces.use_namespace(name);
    }
    Ok(ControlSignal::Advance)
}

/* ===================== Code Loading ===================== */

/// Load a module once
fn execute_include(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let target = eval_string(vm, op, &op.args_str)?;
    let module = vm.modules.resolve(&target)?;
    if vm.modules.is_included(&module.id) {
        debug!(module = %module.id, "module already included");
        return Ok(ControlSignal::Advance);
    }

    let operations = parser::parse(&module.source)?;
    vm.modules.mark_included(&module.id);
    debug!(module = %module.id, operations = operations.len(), "including module");
    load_code(vm, op, &module.id, operations)
}

/// Run a code string
fn execute_eval(vm: &mut VM, op: &Operation) -> Result<ControlSignal, ExecError> {
    let code = eval_string(vm, op, &op.args_str)?;
    let operations = parser::parse(&code)?;
    load_code(vm, op, "<eval>", operations)
}

/// Main stream: splice right after the loading operation. Function bodies are
/// immutable, so there the code runs in an inline frame instead.
fn load_code(
    vm: &mut VM,
    op: &Operation,
    name: &str,
    operations: Vec<Operation>,
) -> Result<ControlSignal, ExecError> {
    if vm.cursor.unit == CodeUnit::Main {
        let at = vm.cursor.pc;
        vm.stream.splice(at, operations)?;
        return Ok(ControlSignal::Advance);
    }
    vm.enter_inline(op, name, operations)?;
    Ok(ControlSignal::Redirect)
}
