use rust_decimal::Decimal;

use super::calculation::{self, CoreOutput};
use super::error::EngineResult;
use super::params::ParameterTable;
use super::period::BookYearInfo;
use super::types::*;

/// Builder for a [`Declaration`] on the standard layout.
///
/// ```
/// use voorafbetaling::core::*;
/// use rust_decimal_macros::dec;
///
/// let declaration = DeclarationBuilder::new()
///     .value("1080", dec!(450_000))
///     .value("1240", dec!(50_000))
///     .build();
/// assert_eq!(declaration.section_sum(SectionRole::ResultOfPeriod), dec!(500_000));
/// ```
pub struct DeclarationBuilder {
    declaration: Declaration,
}

impl Default for DeclarationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationBuilder {
    /// Start from the standard layout with every field at zero.
    pub fn new() -> Self {
        Self {
            declaration: Declaration::standard(),
        }
    }

    /// Set a field by code. Codes missing from the layout are ignored;
    /// add them with [`field`](Self::field).
    pub fn value(mut self, code: &str, value: Decimal) -> Self {
        self.declaration.set_value(code, value);
        self
    }

    /// Add (or overwrite) a field in a section.
    pub fn field(
        mut self,
        role: SectionRole,
        code: impl Into<String>,
        label: impl Into<String>,
        value: Decimal,
    ) -> Self {
        let code = code.into();
        if !self.declaration.set_value(&code, value) {
            let mut section = self
                .declaration
                .section(role)
                .cloned()
                .unwrap_or_else(|| DeclarationSection::new(role));
            section.fields.push(DeclarationField::new(code, label, value));
            self.declaration.insert_section(section);
        }
        self
    }

    pub fn build(self) -> Declaration {
        self.declaration
    }
}

/// Input of one tax computation.
///
/// ```
/// use voorafbetaling::core::*;
/// use rust_decimal_macros::dec;
///
/// let declaration = DeclarationBuilder::new().value("1080", dec!(500_000)).build();
/// let output = TaxCalculation::new(&declaration, "2025")
///     .prepayments(Prepayments::new(dec!(31_250), dec!(31_250), dec!(31_250), dec!(31_250)))
///     .compute()
///     .unwrap();
/// assert_eq!(output.surcharge_amount(), dec!(0));
/// ```
#[derive(Debug, Clone)]
pub struct TaxCalculation<'a> {
    pub(crate) declaration: &'a Declaration,
    pub(crate) tax_year: String,
    pub(crate) book_year: Option<&'a BookYearInfo>,
    pub(crate) eligibility: Eligibility,
    pub(crate) prepayments: Prepayments,
    pub(crate) table: Option<&'a ParameterTable>,
}

impl<'a> TaxCalculation<'a> {
    pub fn new(declaration: &'a Declaration, tax_year: impl Into<String>) -> Self {
        Self {
            declaration,
            tax_year: tax_year.into(),
            book_year: None,
            eligibility: Eligibility::default(),
            prepayments: Prepayments::zero(),
            table: None,
        }
    }

    pub fn book_year(mut self, info: &'a BookYearInfo) -> Self {
        self.book_year = Some(info);
        self
    }

    pub fn eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn prepayments(mut self, prepayments: Prepayments) -> Self {
        self.prepayments = prepayments;
        self
    }

    /// Use a custom parameter table instead of the built-in one.
    pub fn parameters(mut self, table: &'a ParameterTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Run the cascade. Either the complete output or an error is returned.
    pub fn compute(&self) -> EngineResult<CoreOutput> {
        let resolved = match self.table {
            Some(table) => table.resolve(&self.tax_year)?,
            None => ParameterTable::builtin().resolve(&self.tax_year)?,
        };
        calculation::run(
            self.declaration,
            resolved,
            self.book_year,
            self.eligibility,
            &self.prepayments,
        )
    }
}

/// Compute the tax for a declaration against the built-in parameter table.
pub fn compute_tax(
    declaration: &Declaration,
    tax_year: &str,
    book_year: Option<&BookYearInfo>,
    eligibility: Eligibility,
    prepayments: &Prepayments,
) -> EngineResult<CoreOutput> {
    let mut calculation = TaxCalculation::new(declaration, tax_year)
        .eligibility(eligibility)
        .prepayments(*prepayments);
    if let Some(info) = book_year {
        calculation = calculation.book_year(info);
    }
    calculation.compute()
}
