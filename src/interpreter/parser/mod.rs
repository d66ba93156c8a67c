//! Parser - PEST-based parser for Pashmak scripts
//!
//! Produces the flat operation list the executor walks, and the expression
//! AST the executor evaluates for argument text.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::executor::types::{BinaryOp, Expr, Operation, UnaryOp, Value};


/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/pashmak.pest"]
struct PashmakParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("parse error: {0}")]
    PestError(String),
    #[error("invalid {what}: {text}")]
    BuildError { what: &'static str, text: String },
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        ParseError::PestError(err.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Parse a script into its operations
///
/// Operations are separated by `;` or newlines; `#` starts a comment.
/// Indexes are left unassigned.
pub fn parse(source: &str) -> ParseResult<Vec<Operation>> {
    let program = PashmakParser::parse(Rule::program, source)?
        .next()
        .ok_or(ParseError::BuildError {
            what: "program",
            text: source.to_string(),
        })?;

    program
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::operation)
        .map(build_operation)
        .collect()
}

/// Parse exactly one operation (`pass`, `popstate`, ...)
pub fn parse_operation(source: &str) -> ParseResult<Operation> {
    let mut ops = parse(source)?;
    if ops.len() != 1 {
        return Err(ParseError::BuildError {
            what: "single operation",
            text: source.to_string(),
        });
    }
    Ok(ops.remove(0))
}

/// Split raw argument text into whitespace-separated tokens, keeping quoted
/// strings whole (quotes included)
pub fn tokenize(args: &str) -> ParseResult<Vec<String>> {
    let tokens = PashmakParser::parse(Rule::tokens, args)?
        .next()
        .ok_or(ParseError::BuildError {
            what: "arguments",
            text: args.to_string(),
        })?;

    Ok(tokens
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::token)
        .map(|pair| pair.as_str().to_string())
        .collect())
}

/// Parse argument text as an expression
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let expression = PashmakParser::parse(Rule::expression, source)?
        .next()
        .ok_or(ParseError::BuildError {
            what: "expression",
            text: source.to_string(),
        })?;

    // expression = { SOI ~ expr ~ EOI }
    let expr = first_inner(expression, "expression")?;
    build_expression(expr)
}

/* ===================== Operation Builder ===================== */

fn build_operation(pair: Pair<Rule>) -> ParseResult<Operation> {
    // operation = { command ~ (blank+ ~ arguments)? }
    let (line, _) = pair.as_span().start_pos().line_col();
    let source = pair.as_str().trim().to_string();
    let mut inner = pair.into_inner();

    let command = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or(ParseError::BuildError {
            what: "operation",
            text: source.clone(),
        })?;

    let args_str = inner
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default();

    let args = if args_str.is_empty() {
        Vec::new()
    } else {
        tokenize(&args_str)?
    };

    Ok(Operation {
        command,
        args,
        args_str,
        source,
        line,
        index: None,
    })
}

/* ===================== Expression Builder ===================== */

fn build_expression(pair: Pair<Rule>) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::expr => build_expression(first_inner(pair, "expression")?),

        Rule::disjunction | Rule::conjunction | Rule::comparison | Rule::sum | Rule::product => {
            build_binary_chain(pair)
        }

        Rule::negation | Rule::unary => build_prefixed(pair),

        Rule::postfix => {
            // postfix = { primary ~ subscript* }
            let mut inner = pair.into_inner();
            let primary = inner.next().ok_or(ParseError::BuildError {
                what: "postfix expression",
                text: String::new(),
            })?;
            let mut expr = build_expression(primary)?;
            for subscript in inner {
                let index = build_expression(first_inner(subscript, "subscript")?)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            }
            Ok(expr)
        }

        Rule::array => {
            let items = pair
                .into_inner()
                .map(build_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Array { items })
        }

        Rule::map => {
            let entries = pair
                .into_inner()
                .map(|entry| {
                    let text = entry.as_str().to_string();
                    let mut kv = entry.into_inner();
                    match (kv.next(), kv.next()) {
                        (Some(k), Some(v)) => Ok((build_expression(k)?, build_expression(v)?)),
                        _ => Err(ParseError::BuildError {
                            what: "map entry",
                            text,
                        }),
                    }
                })
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Map { entries })
        }

        Rule::call => {
            // call = { identifier ~ "(" ~ (expr ~ ("," ~ expr)*)? ~ ")" }
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            let args = inner.map(build_expression).collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Call { name, args })
        }

        Rule::variable => {
            let name = first_inner(pair, "variable")?.as_str().to_string();
            Ok(Expr::Var { name })
        }

        Rule::mem_ref => Ok(Expr::Mem),

        Rule::int => {
            let text = pair.as_str();
            let v = text.parse::<i64>().map_err(|_| ParseError::BuildError {
                what: "integer",
                text: text.to_string(),
            })?;
            Ok(Expr::Lit { v: Value::Int(v) })
        }

        Rule::float => {
            let text = pair.as_str();
            let v = text.parse::<f64>().map_err(|_| ParseError::BuildError {
                what: "float",
                text: text.to_string(),
            })?;
            Ok(Expr::Lit { v: Value::Float(v) })
        }

        Rule::string => {
            let raw = first_inner(pair, "string")?.as_str();
            Ok(Expr::Lit {
                v: Value::Str(unescape(raw)),
            })
        }

        Rule::boolean => Ok(Expr::Lit {
            v: Value::Bool(matches!(pair.as_str(), "true" | "True")),
        }),

        Rule::null => Ok(Expr::Lit { v: Value::Null }),

        rule => Err(ParseError::BuildError {
            what: "expression rule",
            text: format!("{:?}", rule),
        }),
    }
}

/// `operand (op operand)*`, folded left-associatively
fn build_binary_chain(pair: Pair<Rule>) -> ParseResult<Expr> {
    let text = pair.as_str().to_string();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or(ParseError::BuildError {
        what: "expression",
        text: text.clone(),
    })?;
    let mut expr = build_expression(first)?;

    while let Some(op_pair) = inner.next() {
        let op = binary_op(op_pair.as_str()).ok_or(ParseError::BuildError {
            what: "operator",
            text: op_pair.as_str().to_string(),
        })?;
        let rhs = inner.next().ok_or(ParseError::BuildError {
            what: "expression",
            text: text.clone(),
        })?;
        expr = Expr::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(build_expression(rhs)?),
        };
    }

    Ok(expr)
}

/// `prefix* operand`, applied innermost-first
fn build_prefixed(pair: Pair<Rule>) -> ParseResult<Expr> {
    let text = pair.as_str().to_string();
    let parts: Vec<Pair<Rule>> = pair.into_inner().collect();
    let Some((operand, prefixes)) = parts.split_last() else {
        return Err(ParseError::BuildError {
            what: "expression",
            text,
        });
    };

    let mut expr = build_expression(operand.clone())?;
    for prefix in prefixes.iter().rev() {
        let op = match prefix.as_rule() {
            Rule::neg_op => UnaryOp::Neg,
            _ => UnaryOp::Not,
        };
        expr = Expr::Unary {
            op,
            operand: Box::new(expr),
        };
    }
    Ok(expr)
}

fn binary_op(symbol: &str) -> Option<BinaryOp> {
    let op = match symbol {
        "or" | "||" => BinaryOp::Or,
        "and" | "&&" => BinaryOp::And,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

fn first_inner<'a>(pair: Pair<'a, Rule>, what: &'static str) -> ParseResult<Pair<'a, Rule>> {
    let text = pair.as_str().to_string();
    pair.into_inner()
        .next()
        .ok_or(ParseError::BuildError { what, text })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
