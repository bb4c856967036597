//! # voorafbetaling
//!
//! Belgian corporate income tax engine: tax cascade, surcharge for
//! insufficient advance payments ("vermeerdering") and a solver that
//! suggests the quarterly advance payments ("voorafbetalingen") needed to
//! avoid it.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use voorafbetaling::core::*;
//! use rust_decimal_macros::dec;
//!
//! let declaration = DeclarationBuilder::new()
//!     .value("1080", dec!(500_000))
//!     .build();
//!
//! let output = TaxCalculation::new(&declaration, "2025").compute().unwrap();
//!
//! assert_eq!(output.calculation_total, dec!(125_000));
//! assert_eq!(output.surcharge_amount(), dec!(11_250));
//! assert_eq!(output.final_tax_payable, dec!(136_250));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Declaration model, parameters, book years, tax cascade |
//! | `solver` (default) | Prepayment suggestions and payment plans |
//! | `report` | Presentation rows and Belgian number formatting |
//! | `json` | Parameter tables from JSON |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "solver")]
pub mod prepayment;

#[cfg(feature = "report")]
pub mod report;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
