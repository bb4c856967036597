use rust_decimal::{Decimal, RoundingStrategy};

use super::strategy::{Concentration, Goal};
use crate::core::{
    BookYearInfo, CoreOutput, EngineError, EngineResult, ParameterTable, Prepayments, Slot,
    TaxCalculation, TaxYearParameters, de_minimis_limit, raw_surcharge,
};

/// Suggest prepayments for a goal and concentration against the built-in
/// parameter table.
///
/// `surcharge_base` is saldo 2 of a computation without prepayments.
///
/// ```
/// use voorafbetaling::prepayment::*;
/// use rust_decimal_macros::dec;
///
/// let p = suggest_prepayments(
///     Goal::NoSurcharge,
///     Concentration::Spread,
///     dec!(125_000),
///     dec!(0),
///     false,
///     "2025",
///     None,
/// )
/// .unwrap();
/// assert_eq!(p.va1, dec!(31_250));
/// assert_eq!(p.total(), dec!(125_000));
/// ```
pub fn suggest_prepayments(
    goal: Goal,
    concentration: Concentration,
    surcharge_base: Decimal,
    separate_assessment: Decimal,
    is_exempt: bool,
    tax_year: &str,
    book_year: Option<&BookYearInfo>,
) -> EngineResult<Prepayments> {
    let resolved = ParameterTable::builtin().resolve(tax_year)?;
    solve(
        goal,
        concentration,
        surcharge_base,
        separate_assessment,
        is_exempt,
        &resolved.parameters,
        book_year,
    )
}

/// Solve the inverse problem for an explicit parameter bundle.
///
/// Every slot the concentration selects receives the same amount. For
/// [`Goal::NoSurcharge`] that amount cancels the raw surcharge exactly; for
/// [`Goal::ZeroBalance`] it also covers the tax itself and whatever
/// surcharge remains after the offsets.
///
/// A [`Concentration::Spread`] under `NoSurcharge` gives each slot
/// `raw / Σ rates`, so that running the suggestion again leaves no surcharge.
///
/// When a residual surcharge inside the de-minimis limit would be waived,
/// `ZeroBalance` pays only the tax. If no amount gives an exact zero balance
/// (paying enough to cover the surcharge pushes it under the waiver limit),
/// the smallest cent amount that reaches the waiver is suggested and the
/// outcome is a refund.
pub fn solve(
    goal: Goal,
    concentration: Concentration,
    surcharge_base: Decimal,
    separate_assessment: Decimal,
    is_exempt: bool,
    params: &TaxYearParameters,
    book_year: Option<&BookYearInfo>,
) -> EngineResult<Prepayments> {
    let active: &[Slot] = match book_year {
        Some(info) => info.active_slots(),
        None => &Slot::ALL,
    };

    let slots: Vec<Slot> = match concentration {
        Concentration::None => return Ok(Prepayments::zero()),
        Concentration::Spread => active.to_vec(),
        Concentration::Quarter(slot) => {
            if !active.contains(&slot) {
                return Err(EngineError::InvalidStrategy(format!(
                    "{slot} is not available in a book year with {} active quarter(s)",
                    active.len()
                )));
            }
            vec![slot]
        }
    };

    if is_exempt && goal == Goal::NoSurcharge {
        return Ok(Prepayments::zero());
    }

    let raw = if is_exempt {
        Decimal::ZERO
    } else {
        raw_surcharge(surcharge_base, params)
    };
    let rate_sum = params.quarterly_rates.sum_of(&slots);
    if rate_sum <= Decimal::ZERO {
        return Err(EngineError::CalculationFailed {
            context: format!("{goal}/{concentration}"),
            reason: "quarterly rates of the selected slots sum to zero".into(),
        });
    }

    let n = Decimal::from(slots.len());
    let per_slot = match goal {
        Goal::NoSurcharge => raw / rate_sum,
        Goal::ZeroBalance => {
            let threshold = surcharge_base + separate_assessment;
            let limit = de_minimis_limit(surcharge_base, params);
            let even = threshold / n;
            // Paying the tax evenly leaves at most a waived surcharge.
            if raw - even * rate_sum <= limit {
                even
            } else {
                let exact = (threshold + raw) / (n + rate_sum);
                if raw - exact * rate_sum > limit {
                    exact
                } else {
                    ((raw - limit) / rate_sum)
                        .round_dp_with_strategy(2, RoundingStrategy::AwayFromZero)
                }
            }
        }
    }
    .max(Decimal::ZERO);

    tracing::debug!(
        goal = %goal,
        concentration = %concentration,
        slots = slots.len(),
        per_slot = %per_slot,
        "prepayments suggested"
    );

    Ok(slots
        .into_iter()
        .fold(Prepayments::zero(), |acc, slot| acc.with(slot, per_slot)))
}

/// Suggested prepayments together with the computations before and after
/// applying them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepaymentAdvice {
    pub goal: Goal,
    pub concentration: Concentration,
    pub prepayments: Prepayments,
    /// Output without any prepayments.
    pub baseline: CoreOutput,
    /// Output with the suggested prepayments.
    pub outcome: CoreOutput,
}

/// Run a calculation without prepayments, solve for the goal, then run it
/// again with the suggestion. Prepayments already set on `calculation` are
/// ignored.
pub fn advise(
    calculation: &TaxCalculation<'_>,
    goal: Goal,
    concentration: Concentration,
) -> EngineResult<PrepaymentAdvice> {
    let baseline = calculation
        .clone()
        .prepayments(Prepayments::zero())
        .compute()?;
    let prepayments = solve(
        goal,
        concentration,
        baseline.saldo2,
        baseline.separate_assessment,
        baseline.surcharge.exemption_code.is_some(),
        &baseline.parameters,
        calculation.book_year,
    )?;
    let outcome = calculation.clone().prepayments(prepayments).compute()?;
    Ok(PrepaymentAdvice {
        goal,
        concentration,
        prepayments,
        baseline,
        outcome,
    })
}
