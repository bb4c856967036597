use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{BookYearInfo, Prepayments, Slot};

/// One scheduled advance payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPayment {
    pub slot: Slot,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    /// Due date already passed on the reference date.
    pub overdue: bool,
}

/// Prepayments laid out against the due dates of a book year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaymentPlan {
    pub reference_date: NaiveDate,
    pub payments: Vec<PlannedPayment>,
}

impl PrepaymentPlan {
    pub fn total(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Amount whose due date has already passed.
    pub fn overdue_amount(&self) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.overdue)
            .map(|p| p.amount)
            .sum()
    }

    /// First payment that is still ahead of the reference date.
    pub fn next_payment(&self) -> Option<&PlannedPayment> {
        self.payments.iter().find(|p| !p.overdue && !p.amount.is_zero())
    }
}

/// Schedule prepayments on the active slots of a book year.
///
/// Amounts on inactive slots are left out. `today` is the reference date
/// for the overdue flags.
pub fn plan_prepayments(
    prepayments: &Prepayments,
    book_year: &BookYearInfo,
    today: NaiveDate,
) -> PrepaymentPlan {
    let payments = book_year
        .due_dates()
        .into_iter()
        .map(|due| PlannedPayment {
            slot: due.slot,
            due_date: due.date,
            amount: prepayments.get(due.slot).max(Decimal::ZERO),
            overdue: due.is_overdue(today),
        })
        .collect();
    PrepaymentPlan {
        reference_date: today,
        payments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify_book_year;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn calendar_year_plan() {
        let info = BookYearInfo::calendar_year(2025).unwrap();
        let p = Prepayments::new(dec!(10), dec!(20), dec!(30), dec!(40));
        let plan = plan_prepayments(&p, &info, date(2025, 5, 1));

        assert_eq!(plan.payments.len(), 4);
        assert_eq!(plan.payments[0].due_date, date(2025, 4, 10));
        assert_eq!(plan.payments[3].due_date, date(2025, 12, 20));
        assert_eq!(plan.total(), dec!(100));
        assert_eq!(plan.overdue_amount(), dec!(10));
        assert_eq!(plan.next_payment().map(|p| p.slot), Some(Slot::Va2));
    }

    #[test]
    fn due_today_is_not_overdue() {
        let info = BookYearInfo::calendar_year(2025).unwrap();
        let plan = plan_prepayments(&Prepayments::zero(), &info, date(2025, 4, 10));
        assert!(!plan.payments[0].overdue);
    }

    #[test]
    fn short_year_skips_inactive_slots() {
        let info = classify_book_year(date(2025, 7, 1), date(2025, 12, 31)).unwrap();
        let p = Prepayments::new(dec!(99), dec!(99), dec!(50), dec!(50));
        let plan = plan_prepayments(&p, &info, date(2025, 1, 1));
        let slots: Vec<Slot> = plan.payments.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![Slot::Va3, Slot::Va4]);
        assert_eq!(plan.total(), dec!(100));
    }

    #[test]
    fn nothing_left_to_pay() {
        let info = BookYearInfo::calendar_year(2025).unwrap();
        let p = Prepayments::new(dec!(10), dec!(0), dec!(0), dec!(0));
        let plan = plan_prepayments(&p, &info, date(2026, 1, 1));
        assert!(plan.next_payment().is_none());
        assert_eq!(plan.overdue_amount(), dec!(10));
    }
}
