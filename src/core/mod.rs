//! Declaration types, tax-year parameters, book year classification and
//! the tax computation cascade.
//!
//! Everything in this module is a pure function of its inputs: no clock,
//! no I/O, no shared state.

mod builder;
mod calculation;
mod due_dates;
mod error;
mod params;
mod period;
mod types;

pub use builder::*;
pub use calculation::{
    CoreOutput, MAX_AMOUNT, MAX_FIELDS, QuarterOffset, SurchargeBreakdown, basket_limit,
    de_minimis_limit, raw_surcharge,
};
pub use due_dates::DueDate;
pub use error::*;
pub use params::*;
pub use period::*;
pub use types::*;
