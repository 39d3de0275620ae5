pub mod agent;
pub mod axi;
pub mod base;
pub mod builtin;
pub mod error;
pub mod sim;
pub mod ui;

#[cfg(test)]
mod unit_tests;

pub use error::{BfmError, Result};
