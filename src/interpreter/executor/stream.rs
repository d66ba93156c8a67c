//! Operation stream and section table
//!
//! A stream is the ordered list of operations one cursor walks, together with
//! the labels declared in it. Label declarations are neutralized into `pass`
//! when linked, so they leave no run-time side effect.
//!
//! Invariant: after every mutation, each section entry points at the operation
//! immediately following its declaration. `splice` keeps this by shifting
//! every entry recorded after the insertion point.

use std::collections::HashMap;

use tracing::debug;

use super::errors::ExecError;
use super::types::Operation;
use crate::interpreter::parser::{self, ParseError};

/* ===================== Section Table ===================== */

/// Label name -> index of the operation after the label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTable {
    entries: HashMap<String, usize>,
}

impl SectionTable {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries.get(label).copied()
    }

    pub fn insert(&mut self, label: &str, index: usize) {
        self.entries.insert(label.to_string(), index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shift every entry strictly greater than `after` by `count`
    pub fn shift_after(&mut self, after: usize, count: usize) {
        for index in self.entries.values_mut() {
            if *index > after {
                *index += count;
            }
        }
    }
}

/* ===================== Operation Stream ===================== */

#[derive(Debug, Clone, Default)]
pub struct OperationStream {
    ops: Vec<Operation>,
    sections: SectionTable,
}

impl OperationStream {
    /// Wrap operations without linking them
    pub fn new(ops: Vec<Operation>) -> Self {
        OperationStream {
            ops,
            sections: SectionTable::default(),
        }
    }

    /// Build an immutable body: link labels and stamp every index up front
    pub fn linked_body(ops: Vec<Operation>) -> Result<Self, ParseError> {
        let mut stream = OperationStream::new(ops);
        stream.link()?;
        for (i, op) in stream.ops.iter_mut().enumerate() {
            op.index = Some(i);
        }
        Ok(stream)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.ops.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Operation> {
        self.ops.get_mut(index)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// Link pass over the whole stream
    pub fn link(&mut self) -> Result<(), ParseError> {
        let end = self.ops.len();
        self.link_range(0, end)?;
        debug!(sections = self.sections.len(), "linked operation stream");
        Ok(())
    }

    /// Insert `operations` immediately after position `at`
    ///
    /// Every section entry greater than `at` moves up by the inserted count,
    /// then labels declared by the inserted operations are linked.
    /// Returns the number of inserted operations.
    pub fn splice(&mut self, at: usize, operations: Vec<Operation>) -> Result<usize, ParseError> {
        let count = operations.len();
        let start = (at + 1).min(self.ops.len());

        self.sections.shift_after(at, count);
        self.ops.splice(start..start, operations);
        self.link_range(start, start + count)?;

        debug!(at, count, "spliced operations into stream");
        Ok(count)
    }

    /// Resolve a label to the index of its first operation
    pub fn section(&self, label: &str) -> Result<usize, ExecError> {
        self.sections
            .get(label)
            .ok_or_else(|| ExecError::UndefinedSection(label.to_string()))
    }

    /// Record `section` declarations in `[start, end)` that are not inside a
    /// function definition region, replacing each with a no-op in place.
    ///
    /// Definition regions are tracked with a flat toggle: a nested `func`
    /// does not open a second level.
    fn link_range(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let mut in_definition = false;
        for i in start..end {
            match self.ops[i].command.as_str() {
                "func" => in_definition = true,
                "endfunc" => in_definition = false,
                "section" if !in_definition => {
                    let op = &self.ops[i];
                    if let Some(label) = op.first_arg().map(str::to_string) {
                        let neutral = neutralize(op)?;
                        self.sections.insert(&label, i + 1);
                        self.ops[i] = neutral;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A synthesized `pass` standing where `op` was, keeping its source position
fn neutralize(op: &Operation) -> Result<Operation, ParseError> {
    let mut neutral = parser::parse_operation("pass")?;
    neutral.source = op.source.clone();
    neutral.line = op.line;
    neutral.index = op.index;
    Ok(neutral)
}
