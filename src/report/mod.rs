//! Presentation layer: turns a [`CoreOutput`](crate::core::CoreOutput) into
//! ordered display rows with Belgian number formatting.

mod format;
mod rows;

pub use format::*;
pub use rows::*;
