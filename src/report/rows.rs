use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::{format_amount, format_rate};
use crate::core::{
    CODE_LIQUIDATION_RESERVE, CODE_NON_REFUNDABLE_WITHHOLDING, CODE_REFUNDABLE_WITHHOLDING,
    CODE_SMALL_COMPANY_EXEMPTION, CoreOutput,
};

/// One displayable line: `result` is the signed contribution of the line
/// to its group's total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRow {
    pub code: String,
    pub description: String,
    pub amount: Decimal,
    pub rate: Option<Decimal>,
    pub result: Decimal,
}

impl CalculationRow {
    fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        rate: Option<Decimal>,
        result: Decimal,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            amount,
            rate,
            result,
        }
    }
}

impl fmt::Display for CalculationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = self.rate.map(format_rate).unwrap_or_else(|| "-".into());
        write!(
            f,
            "{} | {} | {} | {} | {}",
            self.code,
            self.description,
            format_amount(self.amount),
            rate,
            format_amount(self.result)
        )
    }
}

/// Ordered rows closed by a total taken from the computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowGroup {
    pub title: String,
    pub rows: Vec<CalculationRow>,
    pub total_label: String,
    pub total: Decimal,
}

impl RowGroup {
    pub fn row(&self, code: &str) -> Option<&CalculationRow> {
        self.rows.iter().find(|r| r.code == code)
    }
}

impl fmt::Display for RowGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        write!(f, "{} | {}", self.total_label, format_amount(self.total))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub tariff: RowGroup,
    pub withholdings: RowGroup,
    pub surcharge: RowGroup,
    pub result: RowGroup,
}

impl Report {
    pub fn groups(&self) -> [&RowGroup; 4] {
        [&self.tariff, &self.withholdings, &self.surcharge, &self.result]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups().into_iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{group}")?;
        }
        Ok(())
    }
}

/// Lay out a computation as display rows. Only values already present in
/// `output` are used.
pub fn build_report(output: &CoreOutput) -> Report {
    let params = &output.parameters;

    let mut tariff = Vec::new();
    if !output.reduced_base.is_zero() {
        tariff.push(CalculationRow::new(
            "TV",
            "Verminderd tarief",
            output.reduced_base,
            Some(params.reduced_rate),
            output.reduced_tax,
        ));
    }
    tariff.push(CalculationRow::new(
        "TN",
        "Normaal tarief",
        output.standard_base,
        Some(params.standard_rate),
        output.standard_tax,
    ));

    let withholdings = vec![
        CalculationRow::new(
            "S1",
            "Saldo 1",
            output.calculation_total,
            None,
            output.calculation_total,
        ),
        CalculationRow::new(
            CODE_NON_REFUNDABLE_WITHHOLDING,
            "Niet-terugbetaalbare voorheffing",
            output.non_refundable_withholding,
            None,
            -output.capped_non_refundable_withholding,
        ),
        CalculationRow::new(
            CODE_REFUNDABLE_WITHHOLDING,
            "Terugbetaalbare voorheffing",
            output.refundable_withholding,
            None,
            -output.refundable_withholding,
        ),
    ];

    let breakdown = &output.surcharge;
    let mut surcharge = Vec::new();
    if breakdown.exemption_code.is_some() {
        surcharge.push(CalculationRow::new(
            CODE_SMALL_COMPANY_EXEMPTION,
            "Vrijstelling kleine vennootschap",
            output.saldo2,
            None,
            Decimal::ZERO,
        ));
    } else {
        surcharge.push(CalculationRow::new(
            "VM",
            "Vermeerdering",
            output.saldo2,
            Some(params.standard_increase_rate),
            breakdown.raw_surcharge,
        ));
        for q in breakdown.quarter_offsets.iter().filter(|q| q.active) {
            surcharge.push(CalculationRow::new(
                q.slot.code(),
                format!("Aftrek voorafbetaling {}", q.slot),
                q.prepayment,
                Some(q.rate),
                q.offset,
            ));
        }
        let offset_balance = breakdown.raw_surcharge + breakdown.total_offset();
        if offset_balance < Decimal::ZERO {
            surcharge.push(CalculationRow::new(
                "MIN",
                "Begrenzing tot nul",
                offset_balance,
                None,
                breakdown.before_de_minimis - offset_balance,
            ));
        }
        if breakdown.de_minimis_applied {
            surcharge.push(CalculationRow::new(
                "DM",
                "De-minimisvrijstelling",
                breakdown.de_minimis_limit,
                None,
                -breakdown.before_de_minimis,
            ));
        }
    }

    let mut result = vec![
        CalculationRow::new("S2", "Saldo 2", output.saldo2, None, output.saldo2),
        CalculationRow::new(
            "VA",
            "Voorafbetalingen",
            output.total_prepayments,
            None,
            -output.total_prepayments,
        ),
        CalculationRow::new(
            "VM",
            "Vermeerdering",
            breakdown.surcharge,
            None,
            breakdown.surcharge,
        ),
    ];
    if !output.liquidation_reserve.is_zero() {
        result.push(CalculationRow::new(
            CODE_LIQUIDATION_RESERVE,
            "Afzonderlijke aanslag liquidatiereserve",
            output.liquidation_reserve,
            Some(params.liquidation_reserve_rate),
            output.separate_assessment,
        ));
    }

    Report {
        tariff: RowGroup {
            title: "Berekening belasting".into(),
            rows: tariff,
            total_label: "Saldo 1".into(),
            total: output.saldo1(),
        },
        withholdings: RowGroup {
            title: "Voorheffingen".into(),
            rows: withholdings,
            total_label: "Saldo 2".into(),
            total: output.saldo2,
        },
        surcharge: RowGroup {
            title: "Vermeerdering wegens ontoereikende voorafbetalingen".into(),
            rows: surcharge,
            total_label: "Vermeerdering".into(),
            total: breakdown.surcharge,
        },
        result: RowGroup {
            title: "Resultaat".into(),
            rows: result,
            total_label: "Te betalen".into(),
            total: output.final_tax_payable,
        },
    }
}
