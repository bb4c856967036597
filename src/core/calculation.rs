//! The tax computation cascade.
//!
//! Section totals → remaining result (1430) → basket base (1440) →
//! basket limitation → taxable profit (1460) → rate split (Saldo 1) →
//! withholdings (Saldo 2) → surcharge → separate assessment → final balance.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineWarning, EngineResult};
use super::params::{ResolvedParameters, TaxYearParameters};
use super::period::BookYearInfo;
use super::types::*;

/// Largest magnitude accepted for a single amount.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

/// Largest number of fields accepted in one declaration.
pub const MAX_FIELDS: usize = 10_000;

/// Surcharge offset earned by one quarterly advance payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterOffset {
    pub slot: Slot,
    /// Advance payment after clamping to zero.
    pub prepayment: Decimal,
    pub rate: Decimal,
    /// `-(prepayment × rate)`; zero for inactive slots.
    pub offset: Decimal,
    /// Whether the slot is active for the book year.
    pub active: bool,
}

/// Step-by-step surcharge (vermeerdering) figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBreakdown {
    /// `max(0, saldo2 × standard_increase_rate)`.
    pub raw_surcharge: Decimal,
    pub quarter_offsets: [QuarterOffset; 4],
    /// `max(0, raw_surcharge + Σ offsets)`.
    pub before_de_minimis: Decimal,
    /// `max(de_minimis_threshold, saldo2 × de_minimis_percentage)`.
    pub de_minimis_limit: Decimal,
    /// The amount was at or below the de-minimis limit and waived.
    pub de_minimis_applied: bool,
    /// Set to "1801" when a small company is exempt.
    pub exemption_code: Option<String>,
    /// Surcharge due.
    pub surcharge: Decimal,
}

impl SurchargeBreakdown {
    pub fn total_offset(&self) -> Decimal {
        self.quarter_offsets.iter().map(|q| q.offset).sum()
    }
}

/// Every scalar produced by one run of the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreOutput {
    /// Tax year whose parameters were applied.
    pub tax_year: u16,
    pub parameters: TaxYearParameters,
    /// Totals of the sections that declare one.
    pub section_totals: BTreeMap<SectionRole, Decimal>,

    /// Code 1420.
    pub deduction_limited: Decimal,
    /// Resterend resultaat (1430).
    pub remaining_result: Decimal,
    /// Grondslag voor de korf (1440).
    pub basket_base: Decimal,
    /// Basket deductions as declared.
    pub basket_deductions: Decimal,
    /// Maximum deductible through the basket.
    pub basket_limit: Decimal,
    /// Basket deductions after the cap.
    pub limited_basket_deductions: Decimal,
    /// Belastbare winst (1460).
    pub taxable_profit: Decimal,

    pub reduced_base: Decimal,
    pub standard_base: Decimal,
    pub reduced_tax: Decimal,
    pub standard_tax: Decimal,
    /// Saldo 1.
    pub calculation_total: Decimal,

    /// Code 1830, negative input read as zero.
    pub non_refundable_withholding: Decimal,
    /// Code 1830 capped at Saldo 1.
    pub capped_non_refundable_withholding: Decimal,
    /// Code 1840, negative input read as zero.
    pub refundable_withholding: Decimal,
    /// Saldo 2, may be negative.
    pub saldo2: Decimal,

    /// Prepayments as used, negative input clamped to zero.
    pub prepayments: Prepayments,
    pub total_prepayments: Decimal,
    pub surcharge: SurchargeBreakdown,

    /// Code 1508.
    pub liquidation_reserve: Decimal,
    pub separate_assessment: Decimal,

    pub final_tax_payable: Decimal,
    pub required_prepayments: Decimal,
    pub prepayment_shortfall: Decimal,

    /// Mean quarterly rate of the active slots, when a book year was given.
    pub effective_surcharge_rate: Option<Decimal>,
    pub warnings: Vec<EngineWarning>,
}

impl CoreOutput {
    /// Saldo 1.
    pub fn saldo1(&self) -> Decimal {
        self.calculation_total
    }

    pub fn surcharge_amount(&self) -> Decimal {
        self.surcharge.surcharge
    }

    /// Whether no surcharge is due for the given prepayments.
    pub fn is_surcharge_free(&self) -> bool {
        self.surcharge.surcharge.is_zero()
    }
}

/// Maximum deduction allowed through the basket for a given base:
/// the full base up to the threshold plus a share of the excess.
pub fn basket_limit(base: Decimal, params: &TaxYearParameters) -> Decimal {
    let threshold = params.basket_limit_threshold;
    base.min(threshold) + (base - threshold).max(Decimal::ZERO) * params.basket_limit_rate
}

/// De-minimis floor below which the surcharge is waived.
pub fn de_minimis_limit(saldo2: Decimal, params: &TaxYearParameters) -> Decimal {
    params
        .de_minimis_threshold
        .max(saldo2 * params.de_minimis_percentage)
}

/// Surcharge base before offsets: `max(0, saldo2 × standard_increase_rate)`.
pub fn raw_surcharge(saldo2: Decimal, params: &TaxYearParameters) -> Decimal {
    (saldo2 * params.standard_increase_rate).max(Decimal::ZERO)
}

pub(crate) fn run(
    declaration: &Declaration,
    resolved: ResolvedParameters,
    book_year: Option<&BookYearInfo>,
    eligibility: Eligibility,
    prepayments: &Prepayments,
) -> EngineResult<CoreOutput> {
    check_inputs(declaration, prepayments)?;

    let params = resolved.parameters;
    let zero = Decimal::ZERO;

    let section_totals: BTreeMap<SectionRole, Decimal> = declaration
        .sections()
        .filter_map(|s| s.total().map(|total| (s.role, total)))
        .collect();

    let deduction_limited = declaration.value(CODE_DEDUCTION_LIMITED);
    let remaining_result =
        (declaration.section_sum(SectionRole::ResultOfPeriod) - deduction_limited).max(zero);
    let basket_base = (remaining_result
        - declaration.section_sum(SectionRole::RemainingResultDeductions))
    .max(zero);

    let basket_deductions = declaration.section_sum(SectionRole::BasketDeductions);
    let limit = basket_limit(basket_base, &params);
    let limited_basket_deductions = basket_deductions.min(limit);
    // 1420 is kept out of the basket but belongs to the taxable base.
    let taxable_profit = (basket_base - limited_basket_deductions).max(zero) + deduction_limited;

    let (reduced_base, standard_base) = if eligibility.reduced_rate {
        (
            taxable_profit.min(params.reduced_rate_threshold),
            (taxable_profit - params.reduced_rate_threshold).max(zero),
        )
    } else {
        (zero, taxable_profit)
    };
    let reduced_tax = reduced_base * params.reduced_rate;
    let standard_tax = standard_base * params.standard_rate;
    let calculation_total = reduced_tax + standard_tax;

    // Withholdings are credits; a negative entry must not raise the tax.
    let non_refundable_withholding = declaration.value(CODE_NON_REFUNDABLE_WITHHOLDING).max(zero);
    let capped_non_refundable_withholding = non_refundable_withholding.min(calculation_total);
    let refundable_withholding = declaration.value(CODE_REFUNDABLE_WITHHOLDING).max(zero);
    let saldo2 =
        calculation_total - capped_non_refundable_withholding - refundable_withholding;

    let prepayments = prepayments.clamped();
    let total_prepayments = prepayments.total();
    let surcharge = surcharge_breakdown(saldo2, &prepayments, &params, book_year, eligibility);

    let liquidation_reserve = declaration.value(CODE_LIQUIDATION_RESERVE);
    let separate_assessment = liquidation_reserve * params.liquidation_reserve_rate;

    let final_tax_payable =
        saldo2 - total_prepayments + surcharge.surcharge + separate_assessment;
    let required_prepayments = final_tax_payable * params.required_prepayments_percentage;
    let prepayment_shortfall = (required_prepayments - total_prepayments).max(zero);

    tracing::debug!(
        tax_year = resolved.year,
        taxable_profit = %taxable_profit,
        saldo2 = %saldo2,
        surcharge = %surcharge.surcharge,
        final_tax_payable = %final_tax_payable,
        "tax computed"
    );

    Ok(CoreOutput {
        tax_year: resolved.year,
        parameters: params,
        section_totals,
        deduction_limited,
        remaining_result,
        basket_base,
        basket_deductions,
        basket_limit: limit,
        limited_basket_deductions,
        taxable_profit,
        reduced_base,
        standard_base,
        reduced_tax,
        standard_tax,
        calculation_total,
        non_refundable_withholding,
        capped_non_refundable_withholding,
        refundable_withholding,
        saldo2,
        prepayments,
        total_prepayments,
        surcharge,
        liquidation_reserve,
        separate_assessment,
        final_tax_payable,
        required_prepayments,
        prepayment_shortfall,
        effective_surcharge_rate: book_year.map(|b| b.effective_surcharge_rate(&params)),
        warnings: resolved.warning.into_iter().collect(),
    })
}

fn surcharge_breakdown(
    saldo2: Decimal,
    prepayments: &Prepayments,
    params: &TaxYearParameters,
    book_year: Option<&BookYearInfo>,
    eligibility: Eligibility,
) -> SurchargeBreakdown {
    let quarter_offsets = Slot::ALL.map(|slot| {
        let active = book_year.is_none_or(|b| b.is_active(slot));
        let prepayment = prepayments.get(slot);
        let rate = params.quarterly_rates.get(slot);
        QuarterOffset {
            slot,
            prepayment,
            rate,
            offset: if active { -(prepayment * rate) } else { Decimal::ZERO },
            active,
        }
    });
    let de_minimis_limit = de_minimis_limit(saldo2, params);

    if eligibility.small_company_first_years {
        return SurchargeBreakdown {
            raw_surcharge: Decimal::ZERO,
            quarter_offsets,
            before_de_minimis: Decimal::ZERO,
            de_minimis_limit,
            de_minimis_applied: false,
            exemption_code: Some(CODE_SMALL_COMPANY_EXEMPTION.to_string()),
            surcharge: Decimal::ZERO,
        };
    }

    let raw_surcharge = raw_surcharge(saldo2, params);
    let offsets: Decimal = quarter_offsets.iter().map(|q| q.offset).sum();
    let before_de_minimis = (raw_surcharge + offsets).max(Decimal::ZERO);
    let de_minimis_applied = before_de_minimis > Decimal::ZERO && before_de_minimis <= de_minimis_limit;

    SurchargeBreakdown {
        raw_surcharge,
        quarter_offsets,
        before_de_minimis,
        de_minimis_limit,
        de_minimis_applied,
        exemption_code: None,
        surcharge: if de_minimis_applied {
            Decimal::ZERO
        } else {
            before_de_minimis
        },
    }
}

fn check_inputs(declaration: &Declaration, prepayments: &Prepayments) -> EngineResult<()> {
    if declaration.fields().count() > MAX_FIELDS {
        return Err(EngineError::CalculationFailed {
            context: "declaration".into(),
            reason: format!("more than {MAX_FIELDS} fields"),
        });
    }
    let amounts = declaration
        .fields()
        .map(|f| (f.code.clone(), f.value))
        .chain(prepayments.iter().map(|(slot, a)| (slot.code().to_string(), a)));
    for (context, amount) in amounts {
        if amount.abs() > MAX_AMOUNT {
            return Err(EngineError::CalculationFailed {
                context,
                reason: format!("amount {amount} exceeds the supported magnitude {MAX_AMOUNT}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{classify_book_year, tax_year_parameters};
    use chrono::NaiveDate;

    fn profit(amount: Decimal) -> Declaration {
        let mut d = Declaration::standard();
        d.set_value("1080", amount);
        d
    }

    fn compute(d: &Declaration, eligibility: Eligibility, p: Prepayments) -> CoreOutput {
        run(d, tax_year_parameters("2025"), None, eligibility, &p).unwrap()
    }

    #[test]
    fn basket_cap_above_threshold() {
        let p = TaxYearParameters::tax_year_2025();
        assert_eq!(basket_limit(dec!(2_000_000), &p), dec!(1_700_000));
        assert_eq!(basket_limit(dec!(800_000), &p), dec!(800_000));
    }

    #[test]
    fn standard_company_scenario() {
        let out = compute(&profit(dec!(500_000)), Eligibility::default(), Prepayments::zero());
        assert_eq!(out.taxable_profit, dec!(500_000));
        assert_eq!(out.calculation_total, dec!(125_000));
        assert_eq!(out.saldo2, dec!(125_000));
        assert_eq!(out.surcharge.raw_surcharge, dec!(11_250));
        assert_eq!(out.surcharge_amount(), dec!(11_250));
        assert_eq!(out.final_tax_payable, dec!(136_250));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn reduced_rate_split() {
        let eligibility = Eligibility {
            reduced_rate: true,
            ..Default::default()
        };
        let out = compute(&profit(dec!(150_000)), eligibility, Prepayments::zero());
        assert_eq!(out.reduced_base, dec!(100_000));
        assert_eq!(out.standard_base, dec!(50_000));
        assert_eq!(out.calculation_total, dec!(32_500));
    }

    #[test]
    fn reduced_rate_below_threshold() {
        let eligibility = Eligibility {
            reduced_rate: true,
            ..Default::default()
        };
        let out = compute(&profit(dec!(60_000)), eligibility, Prepayments::zero());
        assert_eq!(out.reduced_base, dec!(60_000));
        assert_eq!(out.standard_base, Decimal::ZERO);
        assert_eq!(out.calculation_total, dec!(12_000));
    }

    #[test]
    fn deduction_limited_elements_bypass_basket() {
        let mut d = profit(dec!(1_000_000));
        d.set_value(CODE_DEDUCTION_LIMITED, dec!(200_000));
        d.set_value("1443", dec!(5_000_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.remaining_result, dec!(800_000));
        assert_eq!(out.basket_base, dec!(800_000));
        assert_eq!(out.limited_basket_deductions, dec!(800_000));
        assert_eq!(out.taxable_profit, dec!(200_000));
    }

    #[test]
    fn basket_limited_above_threshold() {
        let mut d = profit(dec!(2_000_000));
        d.set_value("1443", dec!(3_000_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.basket_limit, dec!(1_700_000));
        assert_eq!(out.taxable_profit, dec!(300_000));
    }

    #[test]
    fn remaining_result_deductions_reduce_basket_base() {
        let mut d = profit(dec!(400_000));
        d.set_value("1433", dec!(150_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.basket_base, dec!(250_000));
        assert_eq!(
            out.section_totals[&SectionRole::RemainingResultDeductions],
            dec!(150_000)
        );
        assert!(!out
            .section_totals
            .contains_key(&SectionRole::DeductionLimitedElements));
    }

    #[test]
    fn non_refundable_withholding_capped_at_saldo1() {
        let mut d = profit(dec!(10_000));
        d.set_value(CODE_NON_REFUNDABLE_WITHHOLDING, dec!(5_000));
        d.set_value(CODE_REFUNDABLE_WITHHOLDING, dec!(1_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.calculation_total, dec!(2_500));
        assert_eq!(out.capped_non_refundable_withholding, dec!(2_500));
        assert_eq!(out.saldo2, dec!(-1_000));
        assert_eq!(out.surcharge_amount(), Decimal::ZERO);
        assert_eq!(out.final_tax_payable, dec!(-1_000));
    }

    #[test]
    fn negative_withholdings_read_as_zero() {
        let mut d = profit(dec!(100_000));
        d.set_value(CODE_NON_REFUNDABLE_WITHHOLDING, dec!(-2_000));
        d.set_value(CODE_REFUNDABLE_WITHHOLDING, dec!(-3_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.non_refundable_withholding, Decimal::ZERO);
        assert_eq!(out.refundable_withholding, Decimal::ZERO);
        assert_eq!(out.saldo2, dec!(25_000));
    }

    #[test]
    fn small_company_exempt_from_surcharge() {
        let eligibility = Eligibility {
            small_company_first_years: true,
            ..Default::default()
        };
        let out = compute(&profit(dec!(500_000)), eligibility, Prepayments::zero());
        assert_eq!(out.surcharge_amount(), Decimal::ZERO);
        assert_eq!(out.surcharge.exemption_code.as_deref(), Some("1801"));
        assert_eq!(out.final_tax_payable, dec!(125_000));
    }

    #[test]
    fn prepayments_offset_surcharge() {
        let p = Prepayments::new(dec!(50_000), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let out = compute(&profit(dec!(500_000)), Eligibility::default(), p);
        // 11,250 - 50,000 × 12%
        assert_eq!(out.surcharge_amount(), dec!(5_250));
        assert_eq!(out.final_tax_payable, dec!(80_250));
    }

    #[test]
    fn negative_prepayments_are_clamped() {
        let p = Prepayments::new(dec!(-10_000), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let out = compute(&profit(dec!(500_000)), Eligibility::default(), p);
        assert_eq!(out.total_prepayments, Decimal::ZERO);
        assert_eq!(out.final_tax_payable, dec!(136_250));
    }

    #[test]
    fn de_minimis_boundary() {
        // saldo2 = 2,500 → limit max(50, 12.5) = 50; raw = 225
        let d = profit(dec!(10_000));
        let at_limit = Prepayments::new(dec!(1_458.33), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let out = compute(&d, Eligibility::default(), at_limit);
        assert_eq!(out.surcharge.before_de_minimis, dec!(50.0004));

        // offset exactly 175 leaves 50
        let exact = Prepayments::new(Decimal::ZERO, dec!(1_750), Decimal::ZERO, Decimal::ZERO);
        let out = compute(&d, Eligibility::default(), exact);
        assert_eq!(out.surcharge.before_de_minimis, dec!(50));
        assert!(out.surcharge.de_minimis_applied);
        assert_eq!(out.surcharge_amount(), Decimal::ZERO);

        // one cent above the limit is due in full
        let above = Prepayments::new(Decimal::ZERO, dec!(1_749.9), Decimal::ZERO, Decimal::ZERO);
        let out = compute(&d, Eligibility::default(), above);
        assert_eq!(out.surcharge.before_de_minimis, dec!(50.01));
        assert_eq!(out.surcharge_amount(), dec!(50.01));
    }

    #[test]
    fn liquidation_reserve_separately_assessed() {
        let mut d = profit(dec!(100_000));
        d.set_value(CODE_LIQUIDATION_RESERVE, dec!(40_000));
        let out = compute(&d, Eligibility::default(), Prepayments::zero());
        assert_eq!(out.separate_assessment, dec!(4_000));
        // 25,000 + 2,250 surcharge + 4,000
        assert_eq!(out.final_tax_payable, dec!(31_250));
    }

    #[test]
    fn shortfall_is_informational() {
        let out = compute(&profit(dec!(500_000)), Eligibility::default(), Prepayments::zero());
        assert_eq!(out.required_prepayments, dec!(136_250));
        assert_eq!(out.prepayment_shortfall, dec!(136_250));
    }

    #[test]
    fn inactive_slots_earn_no_offset_in_short_year() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let info = classify_book_year(start, end).unwrap();
        let p = Prepayments::new(dec!(10_000), Decimal::ZERO, dec!(10_000), Decimal::ZERO);
        let out = run(
            &profit(dec!(500_000)),
            tax_year_parameters("2025"),
            Some(&info),
            Eligibility::default(),
            &p,
        )
        .unwrap();
        assert!(!out.surcharge.quarter_offsets[0].active);
        assert_eq!(out.surcharge.quarter_offsets[0].offset, Decimal::ZERO);
        assert_eq!(out.surcharge.total_offset(), dec!(-800));
        assert_eq!(out.effective_surcharge_rate, Some(dec!(0.07)));
    }

    #[test]
    fn rejects_absurd_amounts() {
        let d = profit(MAX_AMOUNT + Decimal::ONE);
        let err = run(
            &d,
            tax_year_parameters("2025"),
            None,
            Eligibility::default(),
            &Prepayments::zero(),
        )
        .unwrap_err();
        match err {
            EngineError::CalculationFailed { context, .. } => assert_eq!(context, "1080"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
