//! Per-tax-year parameters (rates and thresholds).
//!
//! The built-in table covers tax years 2024 to 2026. A request for any
//! other year resolves to the nearest defined year and carries an
//! [`EngineWarning::MissingParameters`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineWarning, EngineResult, ValidationError};
use super::types::Slot;

/// Surcharge offset rate per quarterly advance payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyRates {
    pub q1: Decimal,
    pub q2: Decimal,
    pub q3: Decimal,
    pub q4: Decimal,
}

impl QuarterlyRates {
    pub fn get(&self, slot: Slot) -> Decimal {
        match slot {
            Slot::Va1 => self.q1,
            Slot::Va2 => self.q2,
            Slot::Va3 => self.q3,
            Slot::Va4 => self.q4,
        }
    }

    /// Sum of the rates of the given slots.
    pub fn sum_of(&self, slots: &[Slot]) -> Decimal {
        slots.iter().map(|s| self.get(*s)).sum()
    }
}

/// Immutable rate and threshold bundle for one tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearParameters {
    /// Rate on the first bracket for eligible small companies.
    pub reduced_rate: Decimal,
    pub standard_rate: Decimal,
    /// Upper bound of the reduced-rate bracket.
    pub reduced_rate_threshold: Decimal,
    /// Basket deductions are fully allowed up to this base.
    pub basket_limit_threshold: Decimal,
    /// Share of the base above the threshold that remains deductible.
    pub basket_limit_rate: Decimal,
    /// Absolute de-minimis floor for the surcharge.
    pub de_minimis_threshold: Decimal,
    /// Relative de-minimis floor, as a share of Saldo 2.
    pub de_minimis_percentage: Decimal,
    /// Base rate of the surcharge for insufficient advance payments.
    pub standard_increase_rate: Decimal,
    pub quarterly_rates: QuarterlyRates,
    pub liquidation_reserve_rate: Decimal,
    pub required_prepayments_percentage: Decimal,
}

impl TaxYearParameters {
    /// Tax year 2024 (surcharge base rate 6.75%).
    pub fn tax_year_2024() -> Self {
        Self {
            standard_increase_rate: dec!(0.0675),
            quarterly_rates: QuarterlyRates {
                q1: dec!(0.09),
                q2: dec!(0.075),
                q3: dec!(0.06),
                q4: dec!(0.045),
            },
            ..Self::tax_year_2025()
        }
    }

    /// Tax year 2025 (surcharge base rate 9%).
    pub fn tax_year_2025() -> Self {
        Self {
            reduced_rate: dec!(0.20),
            standard_rate: dec!(0.25),
            reduced_rate_threshold: dec!(100_000),
            basket_limit_threshold: dec!(1_000_000),
            basket_limit_rate: dec!(0.70),
            de_minimis_threshold: dec!(50),
            de_minimis_percentage: dec!(0.005),
            standard_increase_rate: dec!(0.09),
            quarterly_rates: QuarterlyRates {
                q1: dec!(0.12),
                q2: dec!(0.10),
                q3: dec!(0.08),
                q4: dec!(0.06),
            },
            liquidation_reserve_rate: dec!(0.10),
            required_prepayments_percentage: dec!(1),
        }
    }

    pub fn tax_year_2026() -> Self {
        Self::tax_year_2025()
    }
}

/// Parameters chosen for a requested tax year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// Tax year whose table was applied.
    pub year: u16,
    pub parameters: TaxYearParameters,
    /// Set when the requested year had no table of its own.
    pub warning: Option<EngineWarning>,
}

/// Lookup of parameter bundles keyed by tax year.
///
/// Serialized as an object keyed by tax year; deserializing validates every
/// bundle the same way [`insert`](Self::insert) does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<u16, TaxYearParameters>",
    into = "BTreeMap<u16, TaxYearParameters>"
)]
pub struct ParameterTable {
    years: BTreeMap<u16, TaxYearParameters>,
}

impl Default for ParameterTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<BTreeMap<u16, TaxYearParameters>> for ParameterTable {
    type Error = EngineError;

    fn try_from(years: BTreeMap<u16, TaxYearParameters>) -> EngineResult<Self> {
        let mut table = Self::empty();
        for (year, parameters) in years {
            table.insert(year, parameters)?;
        }
        Ok(table)
    }
}

impl From<ParameterTable> for BTreeMap<u16, TaxYearParameters> {
    fn from(table: ParameterTable) -> Self {
        table.years
    }
}

impl ParameterTable {
    /// The built-in table for tax years 2024, 2025 and 2026.
    pub fn builtin() -> Self {
        let years = BTreeMap::from([
            (2024, TaxYearParameters::tax_year_2024()),
            (2025, TaxYearParameters::tax_year_2025()),
            (2026, TaxYearParameters::tax_year_2026()),
        ]);
        Self { years }
    }

    /// A table with no years. Resolving against it fails until a year is inserted.
    pub fn empty() -> Self {
        Self {
            years: BTreeMap::new(),
        }
    }

    /// Register (or replace) the parameters of a tax year after validating them.
    pub fn insert(&mut self, year: u16, parameters: TaxYearParameters) -> EngineResult<()> {
        let errors = validate_parameters(&parameters);
        if !errors.is_empty() {
            return Err(EngineError::InvalidParameters(format!(
                "tax year {year}: {}",
                join_errors(&errors)
            )));
        }
        self.years.insert(year, parameters);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_year(mut self, year: u16, parameters: TaxYearParameters) -> EngineResult<Self> {
        self.insert(year, parameters)?;
        Ok(self)
    }

    /// Defined tax years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }

    /// Parameters of exactly this year, without fallback.
    pub fn get(&self, year: u16) -> Option<&TaxYearParameters> {
        self.years.get(&year)
    }

    /// Resolve a tax year given as a string (e.g. "2025").
    ///
    /// Unknown or unparseable years fall back to the nearest defined year
    /// (the latest one when the string is not a year at all); the fallback
    /// is reported through `warning` and logged.
    pub fn resolve(&self, tax_year: &str) -> EngineResult<ResolvedParameters> {
        let requested = tax_year.trim().parse::<u16>().ok();

        if let Some(year) = requested {
            if let Some(parameters) = self.years.get(&year) {
                return Ok(ResolvedParameters {
                    year,
                    parameters: *parameters,
                    warning: None,
                });
            }
        }

        let used = match requested {
            Some(year) => self.nearest_year(year),
            None => self.years.keys().next_back().copied(),
        }
        .ok_or_else(|| EngineError::InvalidParameters("parameter table is empty".into()))?;

        tracing::warn!(requested = %tax_year, used, "no parameters for tax year, using nearest year");

        Ok(ResolvedParameters {
            year: used,
            parameters: self.years[&used],
            warning: Some(EngineWarning::MissingParameters {
                requested: tax_year.to_string(),
                used,
            }),
        })
    }

    // Ties go to the earlier year.
    fn nearest_year(&self, year: u16) -> Option<u16> {
        self.years
            .keys()
            .copied()
            .min_by_key(|y| (y.abs_diff(year), *y))
    }

    /// Load a table from JSON: an object keyed by tax year.
    ///
    /// ```
    /// use voorafbetaling::core::ParameterTable;
    ///
    /// let json = ParameterTable::builtin().to_json().unwrap();
    /// let table = ParameterTable::from_json(&json).unwrap();
    /// assert_eq!(table.years().count(), 3);
    /// ```
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let years: BTreeMap<u16, TaxYearParameters> = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidParameters(format!("JSON: {e}")))?;
        if years.is_empty() {
            return Err(EngineError::InvalidParameters(
                "parameter table is empty".into(),
            ));
        }
        Self::try_from(years)
    }

    /// Serialize the table as a JSON object keyed by tax year.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::InvalidParameters(format!("JSON: {e}")))
    }
}

/// Resolve a tax year against the built-in table.
pub fn tax_year_parameters(tax_year: &str) -> ResolvedParameters {
    ParameterTable::builtin()
        .resolve(tax_year)
        .expect("built-in parameter table is never empty")
}

/// Validate a parameter bundle.
/// Returns all problems found (not just the first).
pub fn validate_parameters(p: &TaxYearParameters) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let rates = [
        ("reduced_rate", p.reduced_rate),
        ("standard_rate", p.standard_rate),
        ("basket_limit_rate", p.basket_limit_rate),
        ("de_minimis_percentage", p.de_minimis_percentage),
        ("standard_increase_rate", p.standard_increase_rate),
        ("liquidation_reserve_rate", p.liquidation_reserve_rate),
        (
            "required_prepayments_percentage",
            p.required_prepayments_percentage,
        ),
    ];
    for (field, rate) in rates {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            errors.push(ValidationError::new(
                field,
                format!("rate {rate} must lie between 0 and 1"),
            ));
        }
    }

    let thresholds = [
        ("reduced_rate_threshold", p.reduced_rate_threshold),
        ("basket_limit_threshold", p.basket_limit_threshold),
        ("de_minimis_threshold", p.de_minimis_threshold),
    ];
    for (field, amount) in thresholds {
        if amount < Decimal::ZERO {
            errors.push(ValidationError::new(
                field,
                format!("threshold {amount} must not be negative"),
            ));
        }
    }

    let q = &p.quarterly_rates;
    for (slot, rate) in Slot::ALL.iter().map(|s| (s, q.get(*s))) {
        if rate <= Decimal::ZERO || rate > Decimal::ONE {
            errors.push(ValidationError::new(
                format!("quarterly_rates.q{}", slot.index() + 1),
                format!("rate {rate} must be positive and at most 1"),
            ));
        }
    }
    if !(q.q1 > q.q2 && q.q2 > q.q3 && q.q3 > q.q4) {
        errors.push(ValidationError::new(
            "quarterly_rates",
            "quarterly rates must strictly decrease from Q1 to Q4",
        ));
    }

    errors
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
