//! Inverse computation: which advance payments reach a given goal.
//!
//! The solver works from saldo 2 of a computation without prepayments and
//! returns one amount per quarterly slot. [`advise`] runs the whole loop
//! against a [`TaxCalculation`](crate::core::TaxCalculation).

mod plan;
mod solver;
mod strategy;

pub use plan::*;
pub use solver::*;
pub use strategy::*;
