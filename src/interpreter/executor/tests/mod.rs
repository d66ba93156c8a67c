//! Tests for the executor
//!
//! Organized by feature area

mod call_tests;
mod command_tests;
mod expression_tests;
mod helpers;
mod namespace_tests;
mod try_tests;
